// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Warden: an authorization decision point.
//!
//! [`Firewall::is_allowed`] answers "may the holder of this credential perform
//! this action on this resource?" by combining the authenticators from
//! `warden-authn`, the role and policy stores and decision engine from
//! `warden-policy`, and the audit trail from `warden-audit`.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use warden_config::SecretString;
//! use warden_firewall::{AccessQuery, Firewall};
//! use warden_policy::{MemoryPolicyStore, MemoryRoleStore};
//!
//! # async fn example() -> Result<(), warden_firewall::WardenError> {
//! let firewall = Firewall::builder(
//! 	Arc::new(MemoryPolicyStore::new()),
//! 	Arc::new(MemoryRoleStore::new()),
//! )
//! .build();
//!
//! let decision = firewall
//! 	.is_allowed(
//! 		&SecretString::new("peter"),
//! 		"subjects",
//! 		AccessQuery::new("article:1", "view"),
//! 	)
//! 	.await?;
//! assert!(!decision.allowed);
//! # Ok(())
//! # }
//! ```

pub mod bootstrap;
pub mod error;
pub mod firewall;

pub use bootstrap::{bootstrap, load_policies, load_roles, parse_policies, Warden};
pub use error::{decision_status, WardenError};
pub use firewall::{AccessQuery, Firewall, FirewallBuilder, DEFAULT_TIMEOUT};
