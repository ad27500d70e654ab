// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::error::AuditSinkError;
use crate::event::AuditRecord;
use crate::filter::AuditFilter;
use crate::logger::AuditLogger;
use crate::sink::AuditSink;

/// Keeps records in memory, in arrival order.
///
/// Usable directly as an [`AuditLogger`] for synchronous, deterministic tests,
/// or as an [`AuditSink`] behind an [`AuditService`](crate::AuditService).
#[derive(Debug, Default)]
pub struct MemoryAuditLog {
	filter: AuditFilter,
	records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditLog {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_filter(filter: AuditFilter) -> Self {
		Self {
			filter,
			records: Mutex::new(Vec::new()),
		}
	}

	pub fn records(&self) -> Vec<AuditRecord> {
		self.lock().clone()
	}

	pub fn len(&self) -> usize {
		self.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.lock().is_empty()
	}

	pub fn clear(&self) {
		self.lock().clear();
	}

	fn lock(&self) -> MutexGuard<'_, Vec<AuditRecord>> {
		self.records.lock().unwrap_or_else(|e| e.into_inner())
	}
}

impl AuditLogger for MemoryAuditLog {
	fn record(&self, record: AuditRecord) {
		if self.filter.allows(&record) {
			self.lock().push(record);
		}
	}
}

#[async_trait]
impl AuditSink for MemoryAuditLog {
	fn name(&self) -> &str {
		"memory"
	}

	fn filter(&self) -> &AuditFilter {
		&self.filter
	}

	async fn publish(&self, record: Arc<AuditRecord>) -> Result<(), AuditSinkError> {
		self.lock().push(AuditRecord::clone(&record));
		Ok(())
	}
}
