// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! OAuth2 token introspection (RFC 7662).
//!
//! The bearer token is POSTed as a form to the introspection endpoint. The
//! call itself is authenticated with the warden's own client id and secret:
//! when a token URL is configured a `client_credentials` access token is
//! fetched first and sent as `Bearer`, otherwise HTTP Basic is used.
//!
//! A token is accepted when the endpoint reports it `active` and every
//! configured scope is satisfied by the granted scopes under the configured
//! [`ScopeStrategy`](warden_policy::ScopeStrategy).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use warden_config::{IntrospectionConfig, SecretString};

use crate::authenticator::{split_scopes, Authentication, Authenticator, KIND_ACCESS_TOKENS};
use crate::client_credentials::request_token;
use crate::error::AuthnError;
use crate::http::basic_auth_header;

/// Introspection endpoint response. Only `active` is required.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntrospectionResponse {
	pub active: bool,
	#[serde(default)]
	pub scope: Option<String>,
	#[serde(default)]
	pub sub: Option<String>,
	#[serde(default)]
	pub client_id: Option<String>,
	#[serde(default)]
	pub exp: Option<i64>,
	#[serde(default)]
	pub iat: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct IntrospectionAuthenticator {
	config: IntrospectionConfig,
	http_client: Client,
}

impl IntrospectionAuthenticator {
	pub fn new(config: IntrospectionConfig, http_client: Client) -> Self {
		Self {
			config,
			http_client,
		}
	}

	async fn authorization_header(&self) -> Result<String, AuthnError> {
		let Some(token_url) = &self.config.token_url else {
			return Ok(basic_auth_header(
				&self.config.client_id,
				&self.config.client_secret,
			));
		};

		// Failing to obtain our own token is never the caller's fault.
		let token = request_token(
			&self.http_client,
			token_url,
			&self.config.client_id,
			&self.config.client_secret,
			&self.config.scopes,
		)
		.await
		.map_err(|e| match e {
			AuthnError::Upstream(_) => e,
			other => AuthnError::Upstream(format!("introspection client token: {other}")),
		})?;

		Ok(format!("Bearer {}", token.access_token))
	}

	#[instrument(skip_all, name = "IntrospectionAuthenticator::introspect")]
	pub async fn introspect(&self, token: &SecretString) -> Result<IntrospectionResponse, AuthnError> {
		let authorization = self.authorization_header().await?;

		let response = self
			.http_client
			.post(self.config.url.clone())
			.header("Accept", "application/json")
			.header("Authorization", authorization)
			.form(&[("token", token.expose())])
			.send()
			.await?;

		let status = response.status();
		if !status.is_success() {
			let body = response.text().await.unwrap_or_default();
			return Err(AuthnError::Upstream(format!(
				"introspection endpoint returned {status}: {body}"
			)));
		}

		response
			.json()
			.await
			.map_err(|e| AuthnError::Upstream(format!("failed to parse introspection response: {e}")))
	}
}

#[async_trait]
impl Authenticator for IntrospectionAuthenticator {
	fn kind(&self) -> &str {
		KIND_ACCESS_TOKENS
	}

	#[instrument(skip_all, name = "IntrospectionAuthenticator::authenticate")]
	async fn authenticate(&self, credential: &SecretString) -> Result<Authentication, AuthnError> {
		if credential.expose().trim().is_empty() {
			return Err(AuthnError::InvalidCredential("access token must not be empty".to_string()));
		}

		let introspection = self.introspect(credential).await?;

		if !introspection.active {
			warn!("introspected token is not active");
			return Err(AuthnError::Unauthorized("token is not active".to_string()));
		}

		let granted_scopes = introspection
			.scope
			.as_deref()
			.map(split_scopes)
			.unwrap_or_default();

		let strategy = self.config.scope_strategy;
		if let Some(missing) = self
			.config
			.scopes
			.iter()
			.find(|required| !strategy.satisfies(required, &granted_scopes))
		{
			warn!(scope = %missing, strategy = %strategy, "token lacks required scope");
			return Err(AuthnError::ScopeMismatch(format!(
				"token was not granted scope '{missing}'"
			)));
		}

		let subject = introspection
			.sub
			.filter(|s| !s.is_empty())
			.or(introspection.client_id.filter(|c| !c.is_empty()))
			.ok_or_else(|| AuthnError::Unauthorized("token has no subject".to_string()))?;

		debug!(subject = %subject, scopes = granted_scopes.len(), "token authenticated");
		Ok(Authentication {
			subject,
			granted_scopes,
		})
	}
}
