// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, instrument, warn};
use warden_authz::{DecisionEvent, DecisionRecorder};
use warden_config::{AuditConfig, QueueOverflowPolicy};

use crate::error::{AuditError, AuditResult};
use crate::filter::AuditFilterConfig;
use crate::record::{AuditRecord, AuditSeverity};
use crate::sink::file::FileAuditSink;
use crate::sink::tracing::TracingAuditSink;
use crate::sink::AuditSink;

enum Message {
	Record(AuditRecord),
	Flush(oneshot::Sender<()>),
}

/// Bounded audit queue drained by a background task.
///
/// Under [`QueueOverflowPolicy::DropNewest`] records reach sinks in the order
/// they were queued. [`QueueOverflowPolicy::Block`] called from inside a
/// runtime hands each record to its own task, so arrival order is not kept.
pub struct AuditService {
	tx: mpsc::Sender<Message>,
	overflow_policy: QueueOverflowPolicy,
}

impl AuditService {
	/// Must be called from within a Tokio runtime.
	pub fn new(
		global_filter: AuditFilterConfig,
		queue_capacity: usize,
		overflow_policy: QueueOverflowPolicy,
		sinks: Vec<Arc<dyn AuditSink>>,
	) -> Self {
		let (tx, rx) = mpsc::channel(queue_capacity);

		tokio::spawn(Self::background_task(rx, global_filter, sinks));

		Self {
			tx,
			overflow_policy,
		}
	}

	/// Builds the service and its sinks from configuration. Returns `None`
	/// when auditing is disabled.
	pub fn from_config(config: &AuditConfig) -> AuditResult<Option<Self>> {
		if !config.enabled {
			debug!("audit disabled");
			return Ok(None);
		}
		if config.queue_capacity == 0 {
			return Err(AuditError::ConfigError(
				"queue_capacity must be greater than 0".to_string(),
			));
		}

		let min_severity: AuditSeverity = config.min_severity.parse()?;
		let filter = AuditFilterConfig::with_min_severity(min_severity);

		let mut sinks: Vec<Arc<dyn AuditSink>> = Vec::new();
		if config.tracing_sink {
			sinks.push(Arc::new(TracingAuditSink::new(AuditFilterConfig::default())));
		}
		for file in &config.file_sinks {
			sinks.push(Arc::new(FileAuditSink::new(
				file.clone(),
				AuditFilterConfig::default(),
			)));
		}

		debug!(
			sinks = sinks.len(),
			queue_capacity = config.queue_capacity,
			%min_severity,
			"audit service configured"
		);
		Ok(Some(Self::new(
			filter,
			config.queue_capacity,
			config.queue_overflow_policy,
			sinks,
		)))
	}

	async fn background_task(
		mut rx: mpsc::Receiver<Message>,
		global_filter: AuditFilterConfig,
		sinks: Vec<Arc<dyn AuditSink>>,
	) {
		while let Some(message) = rx.recv().await {
			let record = match message {
				Message::Record(record) => record,
				Message::Flush(done) => {
					let _ = done.send(());
					continue;
				}
			};

			if !global_filter.allows(&record) {
				continue;
			}

			let record = Arc::new(record);
			for sink in &sinks {
				if !sink.filter().allows(&record) {
					continue;
				}
				if let Err(e) = sink.publish(Arc::clone(&record)).await {
					warn!(sink = sink.name(), error = %e, "audit sink publish failed");
				}
			}
		}
	}

	/// Queue a record for processing.
	///
	/// Returns `true` if the record was queued, `false` if dropped.
	///
	/// # Overflow Policy Behavior
	///
	/// - `DropNewest`: uses `try_send`, drops the record when the queue is full
	/// - `Block`: waits for room. Inside a runtime the wait happens on a spawned
	///   task so the caller is never blocked; outside one the calling thread
	///   waits.
	#[instrument(level = "trace", skip(self, record), fields(action = %record.event.action))]
	pub fn log(&self, record: AuditRecord) -> bool {
		match self.overflow_policy {
			QueueOverflowPolicy::DropNewest => match self.tx.try_send(Message::Record(record)) {
				Ok(()) => true,
				Err(mpsc::error::TrySendError::Full(_)) => {
					debug!("audit queue full, dropping record");
					false
				}
				Err(mpsc::error::TrySendError::Closed(_)) => false,
			},
			QueueOverflowPolicy::Block => match tokio::runtime::Handle::try_current() {
				Ok(handle) => {
					let tx = self.tx.clone();
					handle.spawn(async move {
						let _ = tx.send(Message::Record(record)).await;
					});
					true
				}
				Err(_) => self.tx.blocking_send(Message::Record(record)).is_ok(),
			},
		}
	}

	pub async fn log_blocking(&self, record: AuditRecord) -> AuditResult<()> {
		self.tx
			.send(Message::Record(record))
			.await
			.map_err(|_| AuditError::Shutdown)
	}

	/// Waits until every record queued before this call has been published.
	pub async fn flush(&self) -> AuditResult<()> {
		let (done, wait) = oneshot::channel();
		self.tx
			.send(Message::Flush(done))
			.await
			.map_err(|_| AuditError::Shutdown)?;
		wait.await.map_err(|_| AuditError::Shutdown)
	}
}

impl DecisionRecorder for AuditService {
	fn record(&self, event: DecisionEvent) {
		self.log(AuditRecord::from(event));
	}
}
