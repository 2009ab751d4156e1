// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections for warden.

pub mod audit;
pub mod engine;
pub mod logging;
pub mod snapshot;

pub use audit::{AuditConfig, AuditConfigLayer, FileSinkConfig, FileSinkConfigLayer, QueueOverflowPolicy};
pub use engine::{EngineConfig, EngineConfigLayer};
pub use logging::{LogFormat, LoggingConfig, LoggingConfigLayer, LOG_LEVELS};
pub use snapshot::{SnapshotConfig, SnapshotConfigLayer};
