// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::event::AuditRecord;

/// Receives one record per decision.
///
/// `record` must not block the caller or fail the decision; implementations
/// that do I/O hand the record off to a background task.
pub trait AuditLogger: Send + Sync {
	fn record(&self, record: AuditRecord);
}

/// Discards every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAuditLogger;

impl AuditLogger for NoopAuditLogger {
	fn record(&self, _record: AuditRecord) {}
}
