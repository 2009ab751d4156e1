// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Audit records: a decision event tagged with a severity.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use warden_authz::{DecisionEvent, DecisionReason};

use crate::error::AuditError;

/// Severity levels numbered like syslog: lower value is more severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuditSeverity {
	Debug = 7,
	#[default]
	Info = 6,
	Notice = 5,
	Warning = 4,
	Error = 3,
}

impl AuditSeverity {
	/// Severity of a recorded decision.
	pub fn of(event: &DecisionEvent) -> Self {
		match &event.decision.reason {
			DecisionReason::InternalError => AuditSeverity::Error,
			DecisionReason::PolicyDeny
			| DecisionReason::ActorInactive
			| DecisionReason::TenantInactive
			| DecisionReason::TenantMismatch => AuditSeverity::Warning,
			DecisionReason::Elevated => AuditSeverity::Notice,
			_ => AuditSeverity::Info,
		}
	}
}

impl PartialOrd for AuditSeverity {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for AuditSeverity {
	fn cmp(&self, other: &Self) -> Ordering {
		(*other as u8).cmp(&(*self as u8))
	}
}

impl fmt::Display for AuditSeverity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			AuditSeverity::Debug => "debug",
			AuditSeverity::Info => "info",
			AuditSeverity::Notice => "notice",
			AuditSeverity::Warning => "warning",
			AuditSeverity::Error => "error",
		};
		f.write_str(s)
	}
}

impl FromStr for AuditSeverity {
	type Err = AuditError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_lowercase().as_str() {
			"debug" => Ok(AuditSeverity::Debug),
			"info" => Ok(AuditSeverity::Info),
			"notice" => Ok(AuditSeverity::Notice),
			"warning" | "warn" => Ok(AuditSeverity::Warning),
			"error" => Ok(AuditSeverity::Error),
			other => Err(AuditError::ConfigError(format!(
				"unknown audit severity '{other}'"
			))),
		}
	}
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
	pub severity: AuditSeverity,
	#[serde(flatten)]
	pub event: DecisionEvent,
}

impl From<DecisionEvent> for AuditRecord {
	fn from(event: DecisionEvent) -> Self {
		Self {
			severity: AuditSeverity::of(&event),
			event,
		}
	}
}
