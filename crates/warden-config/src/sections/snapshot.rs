// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Snapshot document location.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SnapshotConfigLayer {
	pub path: Option<PathBuf>,
}

impl SnapshotConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.path.is_some() {
			self.path = other.path;
		}
	}

	pub fn finalize(self) -> SnapshotConfig {
		SnapshotConfig { path: self.path }
	}
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SnapshotConfig {
	/// TOML or JSON, chosen by extension.
	pub path: Option<PathBuf>,
}
