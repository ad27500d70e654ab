// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Credential authenticators for Warden.
//!
//! Each [`Authenticator`] turns a raw credential into an [`Authentication`]
//! (subject plus granted OAuth2 scopes). They are selected by kind from an
//! [`AuthenticatorRegistry`]:
//!
//! | kind                   | authenticator                      |
//! |------------------------|------------------------------------|
//! | `subjects`             | [`PlaintextAuthenticator`]         |
//! | `oauth2/access-tokens` | [`IntrospectionAuthenticator`]     |
//! | `oauth2/clients`       | [`ClientCredentialsAuthenticator`] |

pub mod authenticator;
pub mod client_credentials;
pub mod error;
pub mod http;
pub mod introspection;
pub mod plaintext;
pub mod registry;

pub use authenticator::{
	Authentication, Authenticator, KIND_ACCESS_TOKENS, KIND_CLIENTS, KIND_SUBJECTS,
};
pub use client_credentials::{ClientCredentialsAuthenticator, TokenResponse};
pub use error::AuthnError;
pub use introspection::{IntrospectionAuthenticator, IntrospectionResponse};
pub use plaintext::PlaintextAuthenticator;
pub use registry::AuthenticatorRegistry;
