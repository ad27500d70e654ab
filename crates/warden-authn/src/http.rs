// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shared HTTP client setup for the OAuth2 authenticators.

use std::time::Duration;

use base64::Engine;
use reqwest::{Client, ClientBuilder};
use warden_config::SecretString;

use crate::error::AuthnError;

/// Returns the User-Agent sent to identity providers: `warden/{version}`.
pub fn user_agent() -> String {
	format!("warden/{}", env!("CARGO_PKG_VERSION"))
}

pub fn builder() -> ClientBuilder {
	Client::builder().user_agent(user_agent())
}

/// Builds a client whose requests give up after `timeout`.
pub fn new_client_with_timeout(timeout: Duration) -> Result<Client, AuthnError> {
	builder()
		.timeout(timeout)
		.build()
		.map_err(|e| AuthnError::Upstream(format!("failed to build HTTP client: {e}")))
}

pub(crate) fn basic_auth_header(client_id: &str, client_secret: &SecretString) -> String {
	let credentials = format!("{client_id}:{}", client_secret.expose());
	let encoded = base64::engine::general_purpose::STANDARD.encode(credentials.as_bytes());
	format!("Basic {encoded}")
}
