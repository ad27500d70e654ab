// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{error, instrument};

use crate::error::StoreError;

/// A named group of subjects. Membership is direct; roles do not nest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
	pub id: String,
	#[serde(default)]
	pub members: BTreeSet<String>,
}

impl Role {
	pub fn new(id: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			members: BTreeSet::new(),
		}
	}

	pub fn with_members<I, S>(mut self, members: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.members.extend(members.into_iter().map(Into::into));
		self
	}

	pub fn has_member(&self, subject: &str) -> bool {
		self.members.contains(subject)
	}
}

/// Read access to role membership.
#[async_trait]
pub trait RoleStore: Send + Sync {
	/// Returns every role that lists `subject` as a direct member.
	async fn roles_of(&self, subject: &str) -> Result<Vec<Role>, StoreError>;
}

/// Expands a subject into the ids of the roles it belongs to.
#[derive(Clone)]
pub struct RoleResolver {
	store: Arc<dyn RoleStore>,
}

impl RoleResolver {
	pub fn new(store: Arc<dyn RoleStore>) -> Self {
		Self { store }
	}

	/// Store failures propagate; they are never treated as "no roles".
	#[instrument(level = "debug", skip(self))]
	pub async fn roles_of(&self, subject: &str) -> Result<BTreeSet<String>, StoreError> {
		let roles = self.store.roles_of(subject).await.map_err(|e| {
			error!(error = %e, "role lookup failed");
			e
		})?;
		Ok(roles.into_iter().map(|r| r.id).collect())
	}
}

impl std::fmt::Debug for RoleResolver {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RoleResolver").finish_non_exhaustive()
	}
}
