// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Short-lived decision cache.
//!
//! Keys are SHA-256 digests over everything a decision depends on, including
//! the snapshot version, so publishing a new snapshot implicitly invalidates
//! every entry. Elevated, owner and internal-error decisions are never stored.

use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::actor::AttributeMap;
use crate::decision::{Decision, DecisionRequest};

pub const DEFAULT_TTL: Duration = Duration::from_secs(5);
pub const DEFAULT_CAPACITY: usize = 10_000;

/// Hex-encoded SHA-256 cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
	pub fn new(
		snapshot_version: u64,
		request: &DecisionRequest,
		actor_attributes: Option<&AttributeMap>,
	) -> Self {
		let mut hasher = Sha256::new();
		hasher.update(snapshot_version.to_be_bytes());
		hasher.update(request.actor_id.as_uuid().as_bytes());
		hasher.update(request.actor_kind.as_str());
		update_field(&mut hasher, &request.action);
		hasher.update(request.tenant_id.as_uuid().as_bytes());
		update_field(&mut hasher, &request.resource_type);
		match &request.resource_id {
			Some(id) => {
				hasher.update([1u8]);
				update_field(&mut hasher, id);
			}
			None => hasher.update([0u8]),
		}
		update_field(&mut hasher, &attributes_digest(actor_attributes));
		update_field(&mut hasher, &attributes_digest(Some(&request.resource_attributes)));
		update_field(&mut hasher, &attributes_digest(Some(&request.context)));
		Self(hex::encode(hasher.finalize()))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

/// Length-prefixed so adjacent fields cannot run together.
fn update_field(hasher: &mut Sha256, value: &str) {
	hasher.update((value.len() as u64).to_be_bytes());
	hasher.update(value.as_bytes());
}

fn attributes_digest(attributes: Option<&AttributeMap>) -> String {
	let mut hasher = Sha256::new();
	if let Some(map) = attributes {
		if let Ok(bytes) = serde_json::to_vec(map) {
			hasher.update(bytes);
		}
	}
	hex::encode(hasher.finalize())
}

#[derive(Debug, Clone)]
struct CacheEntry {
	decision: Decision,
	expires_at: Instant,
	last_used: Instant,
}

/// TTL and capacity bounded decision cache. Safe to share between threads.
#[derive(Debug)]
pub struct DecisionCache {
	entries: Mutex<HashMap<CacheKey, CacheEntry>>,
	ttl: Duration,
	max_entries: usize,
}

impl Default for DecisionCache {
	fn default() -> Self {
		Self::new(DEFAULT_TTL, DEFAULT_CAPACITY)
	}
}

impl DecisionCache {
	pub fn new(ttl: Duration, max_entries: usize) -> Self {
		Self {
			entries: Mutex::new(HashMap::new()),
			ttl,
			max_entries,
		}
	}

	pub fn get(&self, key: &CacheKey) -> Option<Decision> {
		let now = Instant::now();
		let mut entries = self.entries.lock();

		if let Some(entry) = entries.get_mut(key) {
			if entry.expires_at > now {
				entry.last_used = now;
				return Some(entry.decision.clone());
			}
			entries.remove(key);
		}

		None
	}

	/// Stores `decision` unless its reason is excluded from caching.
	pub fn insert(&self, key: CacheKey, decision: &Decision) {
		if !decision.reason.is_cacheable() || self.max_entries == 0 {
			return;
		}

		let now = Instant::now();
		let mut entries = self.entries.lock();

		if entries.len() >= self.max_entries && !entries.contains_key(&key) {
			entries.retain(|_, entry| entry.expires_at > now);
			if entries.len() >= self.max_entries {
				evict_lru(&mut entries);
			}
		}

		entries.insert(
			key,
			CacheEntry {
				decision: decision.clone(),
				expires_at: now + self.ttl,
				last_used: now,
			},
		);
	}

	pub fn len(&self) -> usize {
		self.entries.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.lock().is_empty()
	}

	pub fn clear(&self) {
		self.entries.lock().clear();
	}
}

fn evict_lru(entries: &mut HashMap<CacheKey, CacheEntry>) {
	if let Some(oldest) = entries
		.iter()
		.min_by_key(|(_, entry)| entry.last_used)
		.map(|(key, _)| key.clone())
	{
		entries.remove(&oldest);
	}
}
