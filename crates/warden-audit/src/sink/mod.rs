// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use async_trait::async_trait;

pub use crate::error::AuditSinkError;
use crate::event::AuditRecord;
use crate::filter::AuditFilter;

pub mod file;
pub mod memory;
pub mod tracing;

#[async_trait]
pub trait AuditSink: Send + Sync {
	/// Unique name for this sink (used in logs).
	fn name(&self) -> &str;

	/// Per-sink filter, applied after the service-wide one.
	fn filter(&self) -> &AuditFilter;

	async fn publish(&self, record: Arc<AuditRecord>) -> Result<(), AuditSinkError>;
}
