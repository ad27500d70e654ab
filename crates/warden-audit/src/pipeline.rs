// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Semaphore;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, instrument, warn};
use warden_config::{AuditConfig, QueueOverflowPolicy};

use crate::error::{AuditError, AuditResult};
use crate::event::AuditRecord;
use crate::filter::AuditFilter;
use crate::logger::AuditLogger;
use crate::sink::file::FileAuditSink;
use crate::sink::tracing::TracingAuditSink;
use crate::sink::AuditSink;

/// Bounded audit queue drained by a background task that fans records out to
/// sinks.
///
/// Must be created inside a tokio runtime.
pub struct AuditService {
	tx: mpsc::Sender<AuditRecord>,
	overflow_policy: QueueOverflowPolicy,
	/// Caps the sends waiting for queue space under `Block`.
	pending_sends: Arc<Semaphore>,
	worker: JoinHandle<()>,
}

impl AuditService {
	pub fn new(
		global_filter: AuditFilter,
		queue_capacity: usize,
		overflow_policy: QueueOverflowPolicy,
		sinks: Vec<Arc<dyn AuditSink>>,
	) -> Self {
		let capacity = queue_capacity.max(1);
		let (tx, rx) = mpsc::channel(capacity);

		let worker = tokio::spawn(Self::background_task(rx, global_filter, sinks));

		Self {
			tx,
			overflow_policy,
			pending_sends: Arc::new(Semaphore::new(capacity)),
			worker,
		}
	}

	/// Builds the service and its sinks from configuration.
	pub fn from_config(config: &AuditConfig) -> Self {
		let filter = AuditFilter::new(config.min_severity);

		let mut sinks: Vec<Arc<dyn AuditSink>> = Vec::new();
		if config.tracing_sink {
			sinks.push(Arc::new(TracingAuditSink::new(filter.clone())));
		}
		if let Some(path) = &config.file_path {
			sinks.push(Arc::new(FileAuditSink::new(path, filter.clone())));
		}
		debug!(sinks = sinks.len(), "audit service configured");

		Self::new(
			filter,
			config.queue_capacity,
			config.queue_overflow_policy,
			sinks,
		)
	}

	async fn background_task(
		mut rx: mpsc::Receiver<AuditRecord>,
		global_filter: AuditFilter,
		sinks: Vec<Arc<dyn AuditSink>>,
	) {
		while let Some(record) = rx.recv().await {
			if !global_filter.allows(&record) {
				continue;
			}

			let record = Arc::new(record);
			let mut publishes = JoinSet::new();

			for sink in &sinks {
				if !sink.filter().allows(&record) {
					continue;
				}

				let sink = Arc::clone(sink);
				let record = Arc::clone(&record);

				publishes.spawn(async move {
					if let Err(e) = publish_to(sink.as_ref(), record).await {
						warn!(error = %e, "audit sink publish failed");
					}
				});
			}

			while publishes.join_next().await.is_some() {}
		}
	}

	/// Queue a record for processing. Never waits.
	///
	/// When the queue is full:
	/// - `DropNewest`: the record is dropped and `QueueFull` returned.
	/// - `Block`: a task waits for queue space on the caller's behalf. At most
	///   `queue_capacity` such tasks exist at once; past that the record is
	///   dropped and `QueueFull` returned.
	#[instrument(level = "trace", skip(self, record), fields(record_id = %record.id))]
	pub fn log(&self, record: AuditRecord) -> AuditResult<()> {
		match self.tx.try_send(record) {
			Ok(()) => Ok(()),
			Err(TrySendError::Closed(_)) => Err(AuditError::Shutdown),
			Err(TrySendError::Full(record)) => match self.overflow_policy {
				QueueOverflowPolicy::DropNewest => Err(AuditError::QueueFull),
				QueueOverflowPolicy::Block => self.send_when_ready(record),
			},
		}
	}

	fn send_when_ready(&self, record: AuditRecord) -> AuditResult<()> {
		let permit = Arc::clone(&self.pending_sends)
			.try_acquire_owned()
			.map_err(|_| AuditError::QueueFull)?;
		let tx = self.tx.clone();

		tokio::spawn(async move {
			let id = record.id;
			if tx.send(record).await.is_err() {
				warn!(record_id = %id, "audit queue closed, record dropped");
			}
			drop(permit);
		});
		Ok(())
	}

	/// Closes the queue and waits until every queued record has been published.
	///
	/// Records still waiting for queue space under `Block` are published too.
	pub async fn shutdown(self) -> Result<(), AuditError> {
		let Self { tx, worker, .. } = self;
		drop(tx);
		worker.await.map_err(|_| AuditError::Shutdown)
	}
}

async fn publish_to(sink: &dyn AuditSink, record: Arc<AuditRecord>) -> AuditResult<()> {
	sink
		.publish(record)
		.await
		.map_err(|source| AuditError::SinkError {
			sink: sink.name().to_string(),
			source,
		})
}

impl AuditLogger for AuditService {
	fn record(&self, record: AuditRecord) {
		let id = record.id;
		if let Err(e) = self.log(record) {
			warn!(record_id = %id, error = %e, "audit record dropped");
		}
	}
}
