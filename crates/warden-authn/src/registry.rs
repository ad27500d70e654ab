// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::info;
use warden_config::AuthenticatorsConfig;

use crate::authenticator::Authenticator;
use crate::client_credentials::ClientCredentialsAuthenticator;
use crate::error::AuthnError;
use crate::http::new_client_with_timeout;
use crate::introspection::IntrospectionAuthenticator;
use crate::plaintext::PlaintextAuthenticator;

/// Authenticators keyed by their [`kind`](Authenticator::kind).
#[derive(Clone, Default)]
pub struct AuthenticatorRegistry {
	authenticators: BTreeMap<String, Arc<dyn Authenticator>>,
}

impl AuthenticatorRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds the registry from configuration.
	///
	/// The plaintext `subjects` authenticator is always present. The OAuth2
	/// authenticators are added only when their endpoints are configured.
	pub fn from_config(config: &AuthenticatorsConfig) -> Result<Self, AuthnError> {
		let mut registry = Self::new();
		registry.register(Arc::new(PlaintextAuthenticator::new()));

		if config.introspection.is_some() || config.client_credentials.is_some() {
			let http_client = new_client_with_timeout(config.timeout)?;

			if let Some(introspection) = &config.introspection {
				registry.register(Arc::new(IntrospectionAuthenticator::new(
					introspection.clone(),
					http_client.clone(),
				)));
			}
			if let Some(client_credentials) = &config.client_credentials {
				registry.register(Arc::new(ClientCredentialsAuthenticator::new(
					client_credentials.clone(),
					http_client,
				)));
			}
		}

		info!(kinds = ?registry.kinds().collect::<Vec<_>>(), "authenticators registered");
		Ok(registry)
	}

	/// Adds an authenticator, replacing any previous one of the same kind.
	pub fn register(&mut self, authenticator: Arc<dyn Authenticator>) -> &mut Self {
		self
			.authenticators
			.insert(authenticator.kind().to_string(), authenticator);
		self
	}

	pub fn get(&self, kind: &str) -> Option<Arc<dyn Authenticator>> {
		self.authenticators.get(kind).cloned()
	}

	pub fn kinds(&self) -> impl Iterator<Item = &str> {
		self.authenticators.keys().map(String::as_str)
	}

	pub fn len(&self) -> usize {
		self.authenticators.len()
	}

	pub fn is_empty(&self) -> bool {
		self.authenticators.is_empty()
	}
}

impl fmt::Debug for AuthenticatorRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("AuthenticatorRegistry")
			.field("kinds", &self.kinds().collect::<Vec<_>>())
			.finish()
	}
}
