// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Decision engine configuration section.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use warden_authz::cache::{DEFAULT_CAPACITY, DEFAULT_TTL};
use warden_authz::engine::DEFAULT_OWNER_ATTRIBUTE;
use warden_authz::{DecisionCache, EngineOptions};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EngineConfigLayer {
	pub owner_attribute: Option<String>,
	pub cache_enabled: Option<bool>,
	pub cache_ttl_secs: Option<u64>,
	pub cache_capacity: Option<usize>,
}

impl EngineConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.owner_attribute.is_some() {
			self.owner_attribute = other.owner_attribute;
		}
		if other.cache_enabled.is_some() {
			self.cache_enabled = other.cache_enabled;
		}
		if other.cache_ttl_secs.is_some() {
			self.cache_ttl_secs = other.cache_ttl_secs;
		}
		if other.cache_capacity.is_some() {
			self.cache_capacity = other.cache_capacity;
		}
	}

	pub fn finalize(self) -> EngineConfig {
		EngineConfig {
			owner_attribute: self
				.owner_attribute
				.unwrap_or_else(|| DEFAULT_OWNER_ATTRIBUTE.to_string()),
			cache_enabled: self.cache_enabled.unwrap_or(false),
			cache_ttl_secs: self.cache_ttl_secs.unwrap_or(DEFAULT_TTL.as_secs()),
			cache_capacity: self.cache_capacity.unwrap_or(DEFAULT_CAPACITY),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
	pub owner_attribute: String,
	pub cache_enabled: bool,
	pub cache_ttl_secs: u64,
	pub cache_capacity: usize,
}

impl Default for EngineConfig {
	fn default() -> Self {
		EngineConfigLayer::default().finalize()
	}
}

impl EngineConfig {
	pub fn options(&self) -> EngineOptions {
		EngineOptions {
			owner_attribute: self.owner_attribute.clone(),
		}
	}

	/// The decision cache, or `None` when caching is disabled.
	pub fn cache(&self) -> Option<DecisionCache> {
		self.cache_enabled.then(|| {
			DecisionCache::new(Duration::from_secs(self.cache_ttl_secs), self.cache_capacity)
		})
	}
}
