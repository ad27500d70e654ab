// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Policy documents.
//!
//! A [`Policy`] grants or denies a set of actions on a set of resources to a set
//! of subjects, optionally guarded by [`Conditions`]. The JSON representation
//! matches Ladon's so existing policy documents load unchanged.

use std::borrow::Cow;
use std::fmt;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::condition::{Condition, Conditions};
use crate::error::PolicyError;
use crate::pattern::PatternSet;
use crate::request::AccessRequest;

/// Outcome attached to a policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
	Allow,
	Deny,
}

impl std::fmt::Display for Effect {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Effect::Allow => write!(f, "allow"),
			Effect::Deny => write!(f, "deny"),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
	pub id: String,
	#[serde(default)]
	pub description: String,
	pub subjects: Vec<String>,
	pub resources: Vec<String>,
	pub actions: Vec<String>,
	pub effect: Effect,
	#[serde(default)]
	pub conditions: Conditions,
	#[serde(skip)]
	target: TargetCache,
}

/// Compiled subject, resource and action patterns.
#[derive(Debug, Clone)]
struct Target {
	subjects: PatternSet,
	resources: PatternSet,
	actions: PatternSet,
}

impl Target {
	fn parse(policy: &Policy) -> Result<Self, PolicyError> {
		let compile = |sources: &[String]| {
			PatternSet::parse(sources).map_err(|source| PolicyError::InvalidPattern {
				id: policy.id.clone(),
				source,
			})
		};
		Ok(Self {
			subjects: compile(policy.subjects.as_slice())?,
			resources: compile(policy.resources.as_slice())?,
			actions: compile(policy.actions.as_slice())?,
		})
	}

	fn parse_lossy(policy: &Policy) -> Self {
		Self {
			subjects: PatternSet::parse_lossy(&policy.subjects),
			resources: PatternSet::parse_lossy(&policy.resources),
			actions: PatternSet::parse_lossy(&policy.actions),
		}
	}

	fn is_compiled_from(&self, policy: &Policy) -> bool {
		self.subjects.is_compiled_from(&policy.subjects)
			&& self.resources.is_compiled_from(&policy.resources)
			&& self.actions.is_compiled_from(&policy.actions)
	}
}

/// Compiled patterns carried with a policy. Not part of its identity.
#[derive(Clone, Default)]
struct TargetCache(OnceLock<Target>);

impl PartialEq for TargetCache {
	fn eq(&self, _other: &Self) -> bool {
		true
	}
}

impl Eq for TargetCache {}

impl fmt::Debug for TargetCache {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(if self.0.get().is_some() { "compiled" } else { "uncompiled" })
	}
}

impl Policy {
	/// Creates an allow policy with no patterns; fill it in with the builders.
	pub fn allow(id: impl Into<String>) -> Self {
		Self::new(id, Effect::Allow)
	}

	/// Creates a deny policy with no patterns; fill it in with the builders.
	pub fn deny(id: impl Into<String>) -> Self {
		Self::new(id, Effect::Deny)
	}

	fn new(id: impl Into<String>, effect: Effect) -> Self {
		Self {
			id: id.into(),
			description: String::new(),
			subjects: Vec::new(),
			resources: Vec::new(),
			actions: Vec::new(),
			effect,
			conditions: Conditions::new(),
			target: TargetCache::default(),
		}
	}

	pub fn with_description(mut self, description: impl Into<String>) -> Self {
		self.description = description.into();
		self
	}

	pub fn with_subjects<I, S>(mut self, subjects: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.subjects = subjects.into_iter().map(Into::into).collect();
		self.target = TargetCache::default();
		self
	}

	pub fn with_resources<I, S>(mut self, resources: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.resources = resources.into_iter().map(Into::into).collect();
		self.target = TargetCache::default();
		self
	}

	pub fn with_actions<I, S>(mut self, actions: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.actions = actions.into_iter().map(Into::into).collect();
		self.target = TargetCache::default();
		self
	}

	pub fn with_condition(mut self, name: impl Into<String>, condition: Condition) -> Self {
		self.conditions.insert(name.into(), condition);
		self
	}

	pub fn allows(&self) -> bool {
		self.effect == Effect::Allow
	}

	/// Checks the invariants every stored policy must satisfy: a non-empty id,
	/// non-empty pattern lists, and patterns that compile.
	///
	/// The compiled patterns are kept and reused by [`Policy::matches_target`].
	pub fn validate(&self) -> Result<(), PolicyError> {
		if self.id.trim().is_empty() {
			return Err(PolicyError::EmptyId);
		}

		for (field, patterns) in [
			("subjects", &self.subjects),
			("resources", &self.resources),
			("actions", &self.actions),
		] {
			if patterns.is_empty() {
				return Err(PolicyError::EmptyPatterns {
					id: self.id.clone(),
					field,
				});
			}
		}

		let target = Target::parse(self)?;
		// Already compiled from the same lists if this fails.
		let _ = self.target.0.set(target);
		Ok(())
	}

	#[cfg(test)]
	pub(crate) fn is_compiled(&self) -> bool {
		self
			.target
			.0
			.get()
			.is_some_and(|target| target.is_compiled_from(self))
	}

	fn target(&self) -> Cow<'_, Target> {
		let cached = self.target.0.get_or_init(|| Target::parse_lossy(self));
		if cached.is_compiled_from(self) {
			Cow::Borrowed(cached)
		} else {
			// Pattern lists were edited in place after compiling.
			Cow::Owned(Target::parse_lossy(self))
		}
	}

	/// Returns true if the subject, resource and action groups all match.
	///
	/// `subjects` is the effective subject set: the requesting subject plus its
	/// roles. Conditions are not checked here. Patterns that fail to compile
	/// match nothing.
	pub fn matches_target<'a, I>(&self, subjects: I, request: &AccessRequest) -> bool
	where
		I: IntoIterator<Item = &'a str> + Clone,
	{
		let target = self.target();
		target.actions.matches_any([request.action.as_str()])
			&& target.resources.matches_any([request.resource.as_str()])
			&& target.subjects.matches_any(subjects)
	}

	/// Returns true if every condition holds for `request`.
	pub fn conditions_hold(&self, request: &AccessRequest) -> bool {
		self
			.conditions
			.iter()
			.all(|(name, condition)| condition.fulfills(request.context.get(name), request))
	}
}
