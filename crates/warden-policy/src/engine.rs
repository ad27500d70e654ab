// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Policy evaluation.
//!
//! [`DecisionEngine::decide`] turns a request, the subject's roles, the
//! credential's granted scopes and a set of candidate policies into a
//! [`Decision`]. Evaluation runs in three phases:
//!
//! 1. **Scope check**: a required scope the credential does not satisfy denies
//!    the request before any policy is looked at.
//! 2. **Matching**: candidates are visited in policy-id order. A policy counts
//!    when its subject, resource and action patterns match and all of its
//!    conditions hold.
//! 3. **Combination**: any counted deny wins, then any counted allow, otherwise
//!    the request is denied with [`Reason::NoMatchingPolicy`].
//!
//! The engine performs no I/O and holds no locks.

use std::collections::BTreeSet;

use tracing::{debug, instrument};

use crate::decision::Decision;
use crate::policy::Policy;
use crate::request::AccessRequest;
use crate::scope::ScopeStrategy;

#[derive(Debug, Clone, Copy, Default)]
pub struct DecisionEngine {
	scope_strategy: ScopeStrategy,
}

impl DecisionEngine {
	pub fn new(scope_strategy: ScopeStrategy) -> Self {
		Self { scope_strategy }
	}

	pub fn scope_strategy(&self) -> ScopeStrategy {
		self.scope_strategy
	}

	/// Evaluates `request` against `candidates`.
	///
	/// `roles` are the role ids of `request.subject`; together with the subject
	/// they form the set matched against policy subject patterns.
	#[instrument(
		level = "debug",
		skip_all,
		fields(
			subject = %request.subject,
			resource = %request.resource,
			action = %request.action,
			candidates = candidates.len(),
		)
	)]
	pub fn decide(
		&self,
		request: &AccessRequest,
		roles: &BTreeSet<String>,
		granted_scopes: &BTreeSet<String>,
		candidates: &[Policy],
	) -> Decision {
		if let Some(required) = request.required_scope.as_deref() {
			if !self.scope_strategy.satisfies(required, granted_scopes) {
				debug!(
					required,
					strategy = %self.scope_strategy,
					"required scope not granted"
				);
				return Decision::scope_mismatch();
			}
		}

		let subjects: Vec<&str> = std::iter::once(request.subject.as_str())
			.chain(roles.iter().map(String::as_str))
			.collect();

		let mut ordered: Vec<&Policy> = candidates.iter().collect();
		ordered.sort_by(|a, b| a.id.cmp(&b.id));

		let mut first_allow: Option<&Policy> = None;
		for policy in ordered {
			if !policy.matches_target(subjects.iter().copied(), request) {
				continue;
			}
			if !policy.conditions_hold(request) {
				debug!(policy_id = %policy.id, "policy matched but conditions failed");
				continue;
			}

			if policy.allows() {
				if first_allow.is_none() {
					first_allow = Some(policy);
				}
			} else {
				debug!(policy_id = %policy.id, "denied by policy");
				return Decision::denied_by(policy);
			}
		}

		let decision = match first_allow {
			Some(policy) => Decision::allowed_by(policy),
			None => Decision::no_match(),
		};
		debug!(
			allowed = decision.allowed,
			reason = %decision.reason,
			policy_id = decision.matched_policy_id(),
			"decision"
		);
		decision
	}
}
