// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::{Deserialize, Serialize};

use crate::record::{AuditRecord, AuditSeverity};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditFilterConfig {
	pub min_severity: AuditSeverity,
	/// Only pass records whose action is listed.
	pub include_actions: Option<Vec<String>>,
	pub denials_only: bool,
}

impl AuditFilterConfig {
	pub fn with_min_severity(min_severity: AuditSeverity) -> Self {
		Self {
			min_severity,
			..Default::default()
		}
	}

	pub fn allows(&self, record: &AuditRecord) -> bool {
		if record.severity < self.min_severity {
			return false;
		}

		if self.denials_only && record.event.decision.allowed {
			return false;
		}

		if let Some(ref include) = self.include_actions {
			if !include.contains(&record.event.action) {
				return false;
			}
		}

		true
	}
}
