// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Decision audit pipeline for Warden.
//!
//! [`AuditService`] implements [`warden_authz::DecisionRecorder`]: the engine
//! hands it every decision, it queues them without blocking and a background
//! task fans them out to the configured sinks.

pub mod error;
pub mod filter;
pub mod pipeline;
pub mod record;
pub mod sink;

pub use error::{AuditError, AuditResult, AuditSinkError};
pub use filter::AuditFilterConfig;
pub use pipeline::AuditService;
pub use record::{AuditRecord, AuditSeverity};
pub use sink::file::FileAuditSink;
pub use sink::tracing::TracingAuditSink;
pub use sink::AuditSink;

pub use warden_config::{AuditConfig, FileSinkConfig, QueueOverflowPolicy};
