// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Arbitrary request attributes (client IP, time, owner, ...), keyed by name.
pub type Context = BTreeMap<String, Value>;

/// A single access question: may `subject` perform `action` on `resource`?
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessRequest {
	pub subject: String,
	pub resource: String,
	pub action: String,
	#[serde(default)]
	pub context: Context,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub required_scope: Option<String>,
}

impl AccessRequest {
	pub fn new(
		subject: impl Into<String>,
		resource: impl Into<String>,
		action: impl Into<String>,
	) -> Self {
		Self {
			subject: subject.into(),
			resource: resource.into(),
			action: action.into(),
			context: Context::new(),
			required_scope: None,
		}
	}

	/// Builder: add a context attribute.
	pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.context.insert(key.into(), value.into());
		self
	}

	/// Builder: require a scope from the caller's credential.
	pub fn with_required_scope(mut self, scope: impl Into<String>) -> Self {
		self.required_scope = Some(scope.into());
		self
	}
}
