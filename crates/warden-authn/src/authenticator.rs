// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use warden_config::SecretString;

use crate::error::AuthnError;

/// Kind of the [`PlaintextAuthenticator`](crate::PlaintextAuthenticator).
pub const KIND_SUBJECTS: &str = "subjects";
/// Kind of the [`IntrospectionAuthenticator`](crate::IntrospectionAuthenticator).
pub const KIND_ACCESS_TOKENS: &str = "oauth2/access-tokens";
/// Kind of the [`ClientCredentialsAuthenticator`](crate::ClientCredentialsAuthenticator).
pub const KIND_CLIENTS: &str = "oauth2/clients";

/// The outcome of a successful authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authentication {
	pub subject: String,
	#[serde(default)]
	pub granted_scopes: BTreeSet<String>,
}

impl Authentication {
	pub fn new(subject: impl Into<String>) -> Self {
		Self {
			subject: subject.into(),
			granted_scopes: BTreeSet::new(),
		}
	}

	pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.granted_scopes.extend(scopes.into_iter().map(Into::into));
		self
	}
}

/// Resolves a raw credential into a subject and its granted scopes.
///
/// Implementations keep no per-call state; one instance serves concurrent calls.
#[async_trait]
pub trait Authenticator: Send + Sync {
	/// Registry key, e.g. `oauth2/access-tokens`.
	fn kind(&self) -> &str;

	async fn authenticate(&self, credential: &SecretString) -> Result<Authentication, AuthnError>;
}

/// Splits a space-delimited OAuth2 `scope` value.
pub(crate) fn split_scopes(scope: &str) -> BTreeSet<String> {
	scope.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn split_scopes_ignores_extra_whitespace() {
		let scopes = split_scopes("  photos.read  offline ");
		assert_eq!(
			scopes,
			BTreeSet::from(["offline".to_string(), "photos.read".to_string()])
		);
		assert!(split_scopes("").is_empty());
	}

	#[test]
	fn authentication_builder_collects_scopes() {
		let auth = Authentication::new("peter").with_scopes(["a", "b", "a"]);
		assert_eq!(auth.subject, "peter");
		assert_eq!(auth.granted_scopes.len(), 2);
	}
}
