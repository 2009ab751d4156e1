// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Decision audit configuration section.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_queue_capacity() -> usize {
	10_000
}

fn default_min_severity() -> String {
	"info".to_string()
}

/// What to do with a decision event when the audit queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QueueOverflowPolicy {
	/// Discard the incoming event.
	#[default]
	DropNewest,
	/// Wait for room in the queue.
	Block,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AuditConfigLayer {
	pub enabled: Option<bool>,
	pub queue_capacity: Option<usize>,
	pub queue_overflow_policy: Option<QueueOverflowPolicy>,
	pub min_severity: Option<String>,
	pub tracing_sink: Option<bool>,
	pub file_sinks: Option<Vec<FileSinkConfigLayer>>,
}

impl AuditConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.enabled.is_some() {
			self.enabled = other.enabled;
		}
		if other.queue_capacity.is_some() {
			self.queue_capacity = other.queue_capacity;
		}
		if other.queue_overflow_policy.is_some() {
			self.queue_overflow_policy = other.queue_overflow_policy;
		}
		if other.min_severity.is_some() {
			self.min_severity = other.min_severity;
		}
		if other.tracing_sink.is_some() {
			self.tracing_sink = other.tracing_sink;
		}
		if other.file_sinks.is_some() {
			self.file_sinks = other.file_sinks;
		}
	}

	pub fn finalize(self) -> AuditConfig {
		AuditConfig {
			enabled: self.enabled.unwrap_or(true),
			queue_capacity: self.queue_capacity.unwrap_or_else(default_queue_capacity),
			queue_overflow_policy: self.queue_overflow_policy.unwrap_or_default(),
			min_severity: self.min_severity.unwrap_or_else(default_min_severity),
			tracing_sink: self.tracing_sink.unwrap_or(true),
			file_sinks: self
				.file_sinks
				.unwrap_or_default()
				.into_iter()
				.filter_map(FileSinkConfigLayer::finalize)
				.collect(),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditConfig {
	pub enabled: bool,
	pub queue_capacity: usize,
	pub queue_overflow_policy: QueueOverflowPolicy,
	pub min_severity: String,
	pub tracing_sink: bool,
	pub file_sinks: Vec<FileSinkConfig>,
}

impl Default for AuditConfig {
	fn default() -> Self {
		AuditConfigLayer::default().finalize()
	}
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FileSinkConfigLayer {
	pub name: Option<String>,
	pub path: Option<PathBuf>,
}

impl FileSinkConfigLayer {
	pub fn finalize(self) -> Option<FileSinkConfig> {
		Some(FileSinkConfig {
			name: self.name?,
			path: self.path?,
		})
	}
}

/// JSON-lines file sink.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileSinkConfig {
	pub name: String,
	pub path: PathBuf,
}
