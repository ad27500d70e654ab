// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Audit records for authorization decisions.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use warden_policy::{AccessRequest, Decision, Reason};

pub use warden_config::AuditSeverity;

/// Severity assigned to a decision: allows are informational, default denies
/// are notable, explicit denies and scope mismatches are warnings.
pub fn severity_for_decision(decision: &Decision) -> AuditSeverity {
	match decision.reason {
		Reason::AllowedByPolicy => AuditSeverity::Info,
		Reason::NoMatchingPolicy => AuditSeverity::Notice,
		Reason::DeniedByPolicy | Reason::ScopeMismatch => AuditSeverity::Warning,
	}
}

/// One audited decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
	pub id: Uuid,
	pub timestamp: DateTime<Utc>,
	/// Authenticator key the credential was resolved with.
	pub credential_kind: String,
	/// Subject the credential resolved to.
	pub subject: String,
	pub request: AccessRequest,
	pub roles: BTreeSet<String>,
	pub allowed: bool,
	pub reason: Reason,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub matched_policy_id: Option<String>,
	pub severity: AuditSeverity,
}

impl AuditRecord {
	pub fn new(
		credential_kind: impl Into<String>,
		request: &AccessRequest,
		roles: &BTreeSet<String>,
		decision: &Decision,
	) -> Self {
		Self {
			id: Uuid::new_v4(),
			timestamp: Utc::now(),
			credential_kind: credential_kind.into(),
			subject: request.subject.clone(),
			request: request.clone(),
			roles: roles.clone(),
			allowed: decision.allowed,
			reason: decision.reason,
			matched_policy_id: decision.matched_policy_id().map(str::to_string),
			severity: severity_for_decision(decision),
		}
	}
}
