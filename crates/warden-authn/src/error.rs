// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthnError {
	/// The credential is malformed for the selected authenticator.
	#[error("invalid credential: {0}")]
	InvalidCredential(String),

	/// The credential is well formed but not accepted (inactive token, bad client secret).
	#[error("unauthorized: {0}")]
	Unauthorized(String),

	/// The credential is valid but lacks a scope the authenticator requires.
	#[error("scope mismatch: {0}")]
	ScopeMismatch(String),

	/// The identity provider could not be reached or answered unexpectedly.
	#[error("upstream error: {0}")]
	Upstream(String),
}

impl From<reqwest::Error> for AuthnError {
	fn from(e: reqwest::Error) -> Self {
		AuthnError::Upstream(e.to_string())
	}
}
