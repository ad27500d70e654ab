// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::{Deserialize, Serialize};

use crate::event::{AuditRecord, AuditSeverity};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuditFilter {
	pub min_severity: AuditSeverity,
}

impl AuditFilter {
	pub fn new(min_severity: AuditSeverity) -> Self {
		Self { min_severity }
	}

	pub fn allows(&self, record: &AuditRecord) -> bool {
		record.severity >= self.min_severity
	}
}
