// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Policy model and decision engine for Warden.
//!
//! This crate contains everything needed to turn an authenticated subject and an
//! [`AccessRequest`] into a [`Decision`]:
//!
//! - [`Policy`] and [`Condition`]: the Ladon-compatible policy document model
//! - [`pattern`]: anchored matching for `<regex>` groups and `*` globs
//! - [`ScopeStrategy`]: OAuth2 scope comparison (exact, hierarchic, wildcard)
//! - [`DecisionEngine`]: policy matching with explicit-deny-overrides-allow
//! - [`PolicyStore`] / [`RoleStore`]: the storage seams, with in-memory implementations
//!
//! The engine is pure; storage access and authentication live in the callers.

pub mod condition;
pub mod decision;
pub mod engine;
pub mod error;
pub mod memory;
pub mod pattern;
pub mod policy;
pub mod request;
pub mod role;
pub mod scope;
pub mod store;

pub use condition::{Condition, Conditions};
pub use decision::{Decision, Reason};
pub use engine::DecisionEngine;
pub use error::{PatternError, PolicyError, StoreError};
pub use memory::{MemoryPolicyStore, MemoryRoleStore};
pub use policy::{Effect, Policy};
pub use request::{AccessRequest, Context};
pub use role::{Role, RoleResolver, RoleStore};
pub use scope::ScopeStrategy;
pub use store::PolicyStore;
