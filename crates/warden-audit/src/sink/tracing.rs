// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use async_trait::async_trait;
use tracing::Level;

use super::{AuditSink, AuditSinkError};
use crate::filter::AuditFilterConfig;
use crate::record::{AuditRecord, AuditSeverity};

/// Emits each record as a structured `tracing` event under `warden_audit`.
pub struct TracingAuditSink {
	filter: AuditFilterConfig,
}

impl TracingAuditSink {
	pub fn new(filter: AuditFilterConfig) -> Self {
		Self { filter }
	}
}

pub fn severity_to_level(severity: AuditSeverity) -> Level {
	match severity {
		AuditSeverity::Debug => Level::DEBUG,
		AuditSeverity::Info | AuditSeverity::Notice => Level::INFO,
		AuditSeverity::Warning => Level::WARN,
		AuditSeverity::Error => Level::ERROR,
	}
}

macro_rules! audit_event {
	($level:ident, $record:expr) => {{
		let event = &$record.event;
		tracing::$level!(
			target: "warden_audit",
			id = %event.id,
			timestamp = %event.timestamp.to_rfc3339(),
			severity = %$record.severity,
			snapshot_version = event.snapshot_version,
			actor_id = %event.actor_id,
			actor_kind = %event.actor_kind,
			tenant_id = %event.tenant_id,
			action = %event.action,
			resource_type = %event.resource_type,
			resource_id = event.resource_id.as_deref(),
			allowed = event.decision.allowed,
			reason = %event.decision.reason,
			rules = ?event.decision.rule_ids(),
			"authorization decision"
		)
	}};
}

#[async_trait]
impl AuditSink for TracingAuditSink {
	fn name(&self) -> &str {
		"tracing"
	}

	fn filter(&self) -> &AuditFilterConfig {
		&self.filter
	}

	async fn publish(&self, record: Arc<AuditRecord>) -> Result<(), AuditSinkError> {
		match severity_to_level(record.severity) {
			Level::DEBUG => audit_event!(debug, record),
			Level::INFO => audit_event!(info, record),
			Level::WARN => audit_event!(warn, record),
			_ => audit_event!(error, record),
		}
		Ok(())
	}
}
