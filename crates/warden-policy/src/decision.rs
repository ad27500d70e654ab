// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::{Deserialize, Serialize};

use crate::policy::Policy;

/// Why a decision came out the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
	/// A matching allow policy, and no matching deny policy.
	AllowedByPolicy,
	/// A matching deny policy; overrides any allow.
	DeniedByPolicy,
	/// Nothing matched. Default deny.
	NoMatchingPolicy,
	/// The request required a scope the credential was not granted.
	ScopeMismatch,
}

impl std::fmt::Display for Reason {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let s = match self {
			Reason::AllowedByPolicy => "allowed_by_policy",
			Reason::DeniedByPolicy => "denied_by_policy",
			Reason::NoMatchingPolicy => "no_matching_policy",
			Reason::ScopeMismatch => "scope_mismatch",
		};
		write!(f, "{s}")
	}
}

/// The outcome of evaluating one [`AccessRequest`](crate::AccessRequest).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
	pub allowed: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub matched_policy: Option<Policy>,
	pub reason: Reason,
}

impl Decision {
	pub fn allowed_by(policy: &Policy) -> Self {
		Self {
			allowed: true,
			matched_policy: Some(policy.clone()),
			reason: Reason::AllowedByPolicy,
		}
	}

	pub fn denied_by(policy: &Policy) -> Self {
		Self {
			allowed: false,
			matched_policy: Some(policy.clone()),
			reason: Reason::DeniedByPolicy,
		}
	}

	pub fn no_match() -> Self {
		Self::denied(Reason::NoMatchingPolicy)
	}

	pub fn scope_mismatch() -> Self {
		Self::denied(Reason::ScopeMismatch)
	}

	fn denied(reason: Reason) -> Self {
		Self {
			allowed: false,
			matched_policy: None,
			reason,
		}
	}

	pub fn matched_policy_id(&self) -> Option<&str> {
		self.matched_policy.as_ref().map(|p| p.id.as_str())
	}
}
