// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use warden_config::SecretString;

use crate::authenticator::{Authentication, Authenticator, KIND_SUBJECTS};
use crate::error::AuthnError;

/// Treats the credential itself as the subject. Grants no scopes.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaintextAuthenticator;

impl PlaintextAuthenticator {
	pub fn new() -> Self {
		Self
	}
}

#[async_trait]
impl Authenticator for PlaintextAuthenticator {
	fn kind(&self) -> &str {
		KIND_SUBJECTS
	}

	async fn authenticate(&self, credential: &SecretString) -> Result<Authentication, AuthnError> {
		let subject = credential.expose();
		if subject.trim().is_empty() {
			return Err(AuthnError::InvalidCredential("subject must not be empty".to_string()));
		}
		Ok(Authentication::new(subject))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[tokio::test]
	async fn credential_is_subject() {
		let auth = PlaintextAuthenticator::new()
			.authenticate(&SecretString::new("peter"))
			.await
			.unwrap();
		assert_eq!(auth.subject, "peter");
		assert!(auth.granted_scopes.is_empty());
	}

	#[tokio::test]
	async fn blank_credential_is_invalid() {
		for blank in ["", "   ", "\t\n"] {
			let result = PlaintextAuthenticator::new()
				.authenticate(&SecretString::new(blank))
				.await;
			assert!(matches!(result, Err(AuthnError::InvalidCredential(_))));
		}
	}

	proptest! {
		#[test]
		fn any_non_blank_credential_round_trips(subject in "[a-z0-9:_-]{1,32}") {
			let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
			let auth = rt
				.block_on(PlaintextAuthenticator::new().authenticate(&SecretString::new(subject.clone())))
				.unwrap();
			prop_assert_eq!(auth.subject, subject);
		}
	}
}
