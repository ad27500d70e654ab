// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use url::Url;
use warden_config::{ClientCredentialsConfig, SecretString};

use crate::authenticator::{split_scopes, Authentication, Authenticator, KIND_CLIENTS};
use crate::error::AuthnError;
use crate::http::basic_auth_header;

/// Successful `client_credentials` grant response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
	pub access_token: String,
	#[serde(default)]
	pub token_type: Option<String>,
	#[serde(default)]
	pub expires_in: Option<u64>,
	#[serde(default)]
	pub scope: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
	error: String,
	error_description: Option<String>,
}

/// Performs the `client_credentials` grant at `token_url` with HTTP Basic client auth.
#[instrument(skip_all, fields(token_url = %token_url, client_id = %client_id))]
pub async fn request_token(
	http_client: &Client,
	token_url: &Url,
	client_id: &str,
	client_secret: &SecretString,
	scopes: &[String],
) -> Result<TokenResponse, AuthnError> {
	let scope = scopes.join(" ");
	let mut form = vec![("grant_type", "client_credentials")];
	if !scope.is_empty() {
		form.push(("scope", scope.as_str()));
	}

	let response = http_client
		.post(token_url.clone())
		.header("Accept", "application/json")
		.header("Authorization", basic_auth_header(client_id, client_secret))
		.form(&form)
		.send()
		.await?;

	let status = response.status();
	let body = response.text().await?;

	if !status.is_success() {
		return Err(token_error(status, &body));
	}

	serde_json::from_str(&body)
		.map_err(|e| AuthnError::Upstream(format!("failed to parse token response: {e}")))
}

fn token_error(status: StatusCode, body: &str) -> AuthnError {
	let parsed = serde_json::from_str::<TokenErrorResponse>(body).ok();

	if matches!(status, StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED) {
		if let Some(error) = &parsed {
			let message = error
				.error_description
				.clone()
				.unwrap_or_else(|| error.error.clone());
			match error.error.as_str() {
				"invalid_client" | "unauthorized_client" | "invalid_grant" => {
					return AuthnError::Unauthorized(message)
				}
				"invalid_scope" => return AuthnError::ScopeMismatch(message),
				_ => {}
			}
		}
	}

	let detail = parsed.map(|e| e.error).unwrap_or_else(|| body.to_string());
	AuthnError::Upstream(format!("token endpoint returned {status}: {detail}"))
}

/// Authenticates OAuth2 clients by their `client_id:client_secret` pair.
#[derive(Debug, Clone)]
pub struct ClientCredentialsAuthenticator {
	config: ClientCredentialsConfig,
	http_client: Client,
}

impl ClientCredentialsAuthenticator {
	pub fn new(config: ClientCredentialsConfig, http_client: Client) -> Self {
		Self {
			config,
			http_client,
		}
	}
}

fn split_credential(credential: &str) -> Result<(&str, &str), AuthnError> {
	match credential.split_once(':') {
		Some((id, secret)) if !id.is_empty() && !secret.is_empty() => Ok((id, secret)),
		_ => Err(AuthnError::InvalidCredential(
			"expected client_id:client_secret".to_string(),
		)),
	}
}

#[async_trait]
impl Authenticator for ClientCredentialsAuthenticator {
	fn kind(&self) -> &str {
		KIND_CLIENTS
	}

	#[instrument(skip(self, credential), name = "ClientCredentialsAuthenticator::authenticate")]
	async fn authenticate(&self, credential: &SecretString) -> Result<Authentication, AuthnError> {
		let (client_id, client_secret) = split_credential(credential.expose())?;
		let client_secret = SecretString::new(client_secret);

		let token = request_token(
			&self.http_client,
			&self.config.token_url,
			client_id,
			&client_secret,
			&self.config.scopes,
		)
		.await
		.inspect_err(|e| warn!(client_id, error = %e, "client credentials rejected"))?;

		let granted_scopes = match token.scope.as_deref() {
			Some(scope) => split_scopes(scope),
			None => self.config.scopes.iter().cloned().collect(),
		};
		debug!(client_id, scopes = granted_scopes.len(), "client authenticated");

		Ok(Authentication {
			subject: client_id.to_string(),
			granted_scopes,
		})
	}
}
