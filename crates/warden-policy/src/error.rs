// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;

/// Errors raised while compiling a subject/resource/action pattern.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
	#[error("unbalanced delimiters in pattern '{0}'")]
	Unbalanced(String),

	#[error("invalid regex in pattern '{pattern}': {message}")]
	InvalidRegex { pattern: String, message: String },
}

/// Errors raised when a policy document violates its invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
	#[error("policy id must not be empty")]
	EmptyId,

	#[error("policy '{id}' has no {field}")]
	EmptyPatterns { id: String, field: &'static str },

	#[error("policy '{id}': {source}")]
	InvalidPattern {
		id: String,
		#[source]
		source: PatternError,
	},

	#[error("policy '{0}' already exists")]
	Duplicate(String),

	#[error("policy '{0}' not found")]
	NotFound(String),
}

/// Errors surfaced by policy and role stores.
///
/// Any store error is fatal to the decision that triggered it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
	#[error("store unavailable: {0}")]
	Unavailable(String),

	#[error("{0}")]
	Policy(#[from] PolicyError),

	#[error("role '{0}' not found")]
	RoleNotFound(String),

	#[error("role '{0}' already exists")]
	RoleExists(String),
}
