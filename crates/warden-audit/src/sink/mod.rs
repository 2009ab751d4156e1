// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use async_trait::async_trait;

pub use crate::error::AuditSinkError;
use crate::filter::AuditFilterConfig;
use crate::record::AuditRecord;

pub mod file;
pub mod tracing;

#[async_trait]
pub trait AuditSink: Send + Sync {
	/// Unique name for this sink (used in logs).
	fn name(&self) -> &str;

	/// Per-sink filter configuration.
	fn filter(&self) -> &AuditFilterConfig;

	/// Publish a record to the sink.
	async fn publish(&self, record: Arc<AuditRecord>) -> Result<(), AuditSinkError>;

	/// Health check (optional, default: Ok).
	async fn health_check(&self) -> Result<(), AuditSinkError> {
		Ok(())
	}
}
