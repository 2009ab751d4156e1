// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use warden_config::FileSinkConfig;

use crate::error::AuditSinkError;
use crate::filter::AuditFilterConfig;
use crate::record::AuditRecord;
use crate::sink::AuditSink;

/// Appends one JSON object per line to a file, opened on first publish.
pub struct FileAuditSink {
	config: FileSinkConfig,
	filter: AuditFilterConfig,
	file: Mutex<Option<tokio::fs::File>>,
}

impl FileAuditSink {
	pub fn new(config: FileSinkConfig, filter: AuditFilterConfig) -> Self {
		Self {
			config,
			filter,
			file: Mutex::new(None),
		}
	}
}

#[async_trait]
impl AuditSink for FileAuditSink {
	fn name(&self) -> &str {
		&self.config.name
	}

	fn filter(&self) -> &AuditFilterConfig {
		&self.filter
	}

	async fn publish(&self, record: Arc<AuditRecord>) -> Result<(), AuditSinkError> {
		let line = format_json_line(&record)?;

		let mut guard = self.file.lock().await;
		if guard.is_none() {
			let file = OpenOptions::new()
				.create(true)
				.append(true)
				.open(&self.config.path)
				.await
				.map_err(|e| AuditSinkError::Transient(format!("failed to open file: {e}")))?;
			*guard = Some(file);
		}
		let file = guard
			.as_mut()
			.ok_or_else(|| AuditSinkError::Permanent("file handle not initialized".to_string()))?;

		file.write_all(line.as_bytes())
			.await
			.map_err(|e| AuditSinkError::Transient(format!("failed to write to file: {e}")))?;
		file.flush()
			.await
			.map_err(|e| AuditSinkError::Transient(format!("failed to flush file: {e}")))?;

		Ok(())
	}
}

pub fn format_json_line(record: &AuditRecord) -> Result<String, AuditSinkError> {
	let json = serde_json::to_string(record)
		.map_err(|e| AuditSinkError::Permanent(format!("JSON serialization failed: {e}")))?;
	Ok(format!("{json}\n"))
}
