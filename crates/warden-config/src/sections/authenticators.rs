// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Authenticator configuration section.
//!
//! The plaintext `subjects` authenticator needs no configuration and is always
//! available. The OAuth2 authenticators are enabled only when their endpoint
//! URLs are set.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;
use warden_policy::ScopeStrategy;

use crate::error::ConfigError;
use crate::secret::SecretString;

const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AuthenticatorsConfigLayer {
	/// Upper bound on one authentication call, in seconds.
	pub timeout_secs: Option<u64>,
	pub introspection: Option<IntrospectionConfigLayer>,
	pub client_credentials: Option<ClientCredentialsConfigLayer>,
}

impl AuthenticatorsConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.timeout_secs.is_some() {
			self.timeout_secs = other.timeout_secs;
		}
		match (self.introspection.as_mut(), other.introspection) {
			(Some(base), Some(o)) => base.merge(o),
			(None, Some(o)) => self.introspection = Some(o),
			_ => {}
		}
		match (self.client_credentials.as_mut(), other.client_credentials) {
			(Some(base), Some(o)) => base.merge(o),
			(None, Some(o)) => self.client_credentials = Some(o),
			_ => {}
		}
	}

	pub fn finalize(self) -> Result<AuthenticatorsConfig, ConfigError> {
		let timeout_secs = self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
		if timeout_secs == 0 {
			return Err(ConfigError::Validation(
				"authenticators.timeout_secs must be greater than zero".to_string(),
			));
		}

		let introspection = self.introspection.unwrap_or_default();
		let scope_strategy = introspection
			.scope_strategy
			.as_deref()
			.map(ScopeStrategy::from_name_or_default)
			.unwrap_or_default();

		Ok(AuthenticatorsConfig {
			timeout: Duration::from_secs(timeout_secs),
			scope_strategy,
			introspection: introspection.build(scope_strategy)?,
			client_credentials: self.client_credentials.unwrap_or_default().build()?,
		})
	}
}

#[derive(Debug, Clone)]
pub struct AuthenticatorsConfig {
	pub timeout: Duration,
	/// Strategy used for token scopes and for the `required_scope` check.
	pub scope_strategy: ScopeStrategy,
	pub introspection: Option<IntrospectionConfig>,
	pub client_credentials: Option<ClientCredentialsConfig>,
}

impl Default for AuthenticatorsConfig {
	fn default() -> Self {
		Self {
			timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
			scope_strategy: ScopeStrategy::default(),
			introspection: None,
			client_credentials: None,
		}
	}
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IntrospectionConfigLayer {
	/// RFC 7662 introspection endpoint.
	pub url: Option<String>,
	/// When set, a client-credentials token is fetched here and used as the
	/// bearer for introspection calls instead of HTTP Basic.
	pub token_url: Option<String>,
	pub client_id: Option<String>,
	#[serde(skip_serializing)]
	pub client_secret: Option<SecretString>,
	/// Scopes every introspected token must carry.
	pub scopes: Option<Vec<String>>,
	pub scope_strategy: Option<String>,
}

impl IntrospectionConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.url.is_some() {
			self.url = other.url;
		}
		if other.token_url.is_some() {
			self.token_url = other.token_url;
		}
		if other.client_id.is_some() {
			self.client_id = other.client_id;
		}
		if other.client_secret.is_some() {
			self.client_secret = other.client_secret;
		}
		if other.scopes.is_some() {
			self.scopes = other.scopes;
		}
		if other.scope_strategy.is_some() {
			self.scope_strategy = other.scope_strategy;
		}
	}

	pub fn is_configured(&self) -> bool {
		self.url.as_ref().is_some_and(|s| !s.is_empty())
	}

	/// Builds the final config, returning `None` if no introspection URL is set.
	pub fn build(self, scope_strategy: ScopeStrategy) -> Result<Option<IntrospectionConfig>, ConfigError> {
		let Some(url) = self.url.filter(|s| !s.is_empty()) else {
			return Ok(None);
		};
		let url = parse_url("authenticators.introspection.url", &url)?;
		let token_url = self
			.token_url
			.filter(|s| !s.is_empty())
			.map(|s| parse_url("authenticators.introspection.token_url", &s))
			.transpose()?;

		let client_id = self.client_id.filter(|s| !s.is_empty()).ok_or_else(|| {
			ConfigError::Validation(
				"introspection client_id is required when introspection url is set".to_string(),
			)
		})?;

		let client_secret = self.client_secret.ok_or_else(|| {
			ConfigError::Validation(
				"introspection client_secret is required when introspection url is set".to_string(),
			)
		})?;
		if client_secret.is_empty() {
			return Err(ConfigError::Validation(
				"introspection client_secret cannot be empty".to_string(),
			));
		}

		Ok(Some(IntrospectionConfig {
			url,
			token_url,
			client_id,
			client_secret,
			scopes: self.scopes.unwrap_or_default(),
			scope_strategy,
		}))
	}
}

#[derive(Debug, Clone)]
pub struct IntrospectionConfig {
	pub url: Url,
	pub token_url: Option<Url>,
	pub client_id: String,
	pub client_secret: SecretString,
	pub scopes: Vec<String>,
	pub scope_strategy: ScopeStrategy,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ClientCredentialsConfigLayer {
	pub token_url: Option<String>,
	/// Scopes requested with every grant.
	pub scopes: Option<Vec<String>>,
}

impl ClientCredentialsConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.token_url.is_some() {
			self.token_url = other.token_url;
		}
		if other.scopes.is_some() {
			self.scopes = other.scopes;
		}
	}

	pub fn build(self) -> Result<Option<ClientCredentialsConfig>, ConfigError> {
		let Some(token_url) = self.token_url.filter(|s| !s.is_empty()) else {
			return Ok(None);
		};
		Ok(Some(ClientCredentialsConfig {
			token_url: parse_url("authenticators.client_credentials.token_url", &token_url)?,
			scopes: self.scopes.unwrap_or_default(),
		}))
	}
}

#[derive(Debug, Clone)]
pub struct ClientCredentialsConfig {
	pub token_url: Url,
	pub scopes: Vec<String>,
}

fn parse_url(key: &str, value: &str) -> Result<Url, ConfigError> {
	Url::parse(value).map_err(|e| ConfigError::invalid(key, format!("invalid URL '{value}': {e}")))
}
