// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use http::StatusCode;
use thiserror::Error;
use warden_audit::AuditError;
use warden_authn::AuthnError;
use warden_config::ConfigError;
use warden_policy::{Decision, PolicyError, StoreError};

/// Everything that can stop the firewall from producing a [`Decision`].
///
/// A denied request is not an error; it is a `Decision` with `allowed == false`.
#[derive(Debug, Error)]
pub enum WardenError {
	#[error("invalid credential: {0}")]
	InvalidCredential(String),

	#[error("unknown authenticator '{0}'")]
	UnknownAuthenticator(String),

	#[error("unauthorized: {0}")]
	Unauthorized(String),

	#[error("scope mismatch: {0}")]
	ScopeMismatch(String),

	#[error("upstream error: {0}")]
	Upstream(String),

	#[error("store error: {0}")]
	Store(#[from] StoreError),

	#[error("invalid policy: {0}")]
	Policy(#[from] PolicyError),

	#[error("audit error: {0}")]
	Audit(#[from] AuditError),

	#[error("configuration error: {0}")]
	Config(#[from] ConfigError),
}

impl From<AuthnError> for WardenError {
	fn from(e: AuthnError) -> Self {
		match e {
			AuthnError::InvalidCredential(m) => WardenError::InvalidCredential(m),
			AuthnError::Unauthorized(m) => WardenError::Unauthorized(m),
			AuthnError::ScopeMismatch(m) => WardenError::ScopeMismatch(m),
			AuthnError::Upstream(m) => WardenError::Upstream(m),
		}
	}
}

impl WardenError {
	/// HTTP status an API layer should answer with.
	pub fn status_code(&self) -> StatusCode {
		match self {
			WardenError::InvalidCredential(_) | WardenError::UnknownAuthenticator(_) => {
				StatusCode::BAD_REQUEST
			}
			WardenError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
			WardenError::ScopeMismatch(_) => StatusCode::FORBIDDEN,
			WardenError::Upstream(_) => StatusCode::BAD_GATEWAY,
			WardenError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
			WardenError::Policy(PolicyError::NotFound(_)) => StatusCode::NOT_FOUND,
			WardenError::Policy(PolicyError::Duplicate(_)) => StatusCode::CONFLICT,
			WardenError::Policy(_) => StatusCode::BAD_REQUEST,
			WardenError::Audit(_) | WardenError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}

/// HTTP status for a completed decision: 200 when allowed, 403 otherwise.
pub fn decision_status(decision: &Decision) -> StatusCode {
	if decision.allowed {
		StatusCode::OK
	} else {
		StatusCode::FORBIDDEN
	}
}
