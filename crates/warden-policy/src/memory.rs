// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-memory policy and role stores.
//!
//! These back tests, the CLI and embedders that load policies from files. They
//! keep everything in a `BTreeMap` behind a `tokio::sync::RwLock`; there is no
//! persistence.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::error::{PolicyError, StoreError};
use crate::policy::Policy;
use crate::request::AccessRequest;
use crate::role::{Role, RoleStore};
use crate::store::PolicyStore;

#[derive(Debug, Default)]
pub struct MemoryPolicyStore {
	policies: RwLock<BTreeMap<String, Policy>>,
}

impl MemoryPolicyStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds a store from a batch of policies, validating each one.
	pub fn from_policies<I>(policies: I) -> Result<Self, PolicyError>
	where
		I: IntoIterator<Item = Policy>,
	{
		let mut map = BTreeMap::new();
		for policy in policies {
			policy.validate()?;
			if map.contains_key(&policy.id) {
				return Err(PolicyError::Duplicate(policy.id));
			}
			map.insert(policy.id.clone(), policy);
		}
		Ok(Self {
			policies: RwLock::new(map),
		})
	}

	#[instrument(level = "debug", skip(self, policy), fields(policy_id = %policy.id))]
	pub async fn create(&self, policy: Policy) -> Result<(), PolicyError> {
		policy.validate()?;
		let mut policies = self.policies.write().await;
		if policies.contains_key(&policy.id) {
			return Err(PolicyError::Duplicate(policy.id));
		}
		debug!("policy created");
		policies.insert(policy.id.clone(), policy);
		Ok(())
	}

	pub async fn get(&self, id: &str) -> Result<Policy, PolicyError> {
		self
			.policies
			.read()
			.await
			.get(id)
			.cloned()
			.ok_or_else(|| PolicyError::NotFound(id.to_string()))
	}

	/// Replaces an existing policy with the same id.
	#[instrument(level = "debug", skip(self, policy), fields(policy_id = %policy.id))]
	pub async fn update(&self, policy: Policy) -> Result<(), PolicyError> {
		policy.validate()?;
		let mut policies = self.policies.write().await;
		match policies.get_mut(&policy.id) {
			Some(existing) => {
				*existing = policy;
				Ok(())
			}
			None => Err(PolicyError::NotFound(policy.id)),
		}
	}

	#[instrument(level = "debug", skip(self))]
	pub async fn delete(&self, id: &str) -> Result<(), PolicyError> {
		self
			.policies
			.write()
			.await
			.remove(id)
			.map(|_| ())
			.ok_or_else(|| PolicyError::NotFound(id.to_string()))
	}

	/// Lists policies in id order.
	pub async fn list(&self, offset: usize, limit: usize) -> Vec<Policy> {
		self
			.policies
			.read()
			.await
			.values()
			.skip(offset)
			.take(limit)
			.cloned()
			.collect()
	}

	pub async fn len(&self) -> usize {
		self.policies.read().await.len()
	}

	pub async fn is_empty(&self) -> bool {
		self.policies.read().await.is_empty()
	}
}

#[async_trait]
impl PolicyStore for MemoryPolicyStore {
	async fn find_candidates(
		&self,
		_request: &AccessRequest,
		_subjects: &[String],
	) -> Result<Vec<Policy>, StoreError> {
		Ok(self.policies.read().await.values().cloned().collect())
	}
}

#[derive(Debug, Default)]
pub struct MemoryRoleStore {
	roles: RwLock<BTreeMap<String, Role>>,
}

impl MemoryRoleStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn from_roles<I>(roles: I) -> Result<Self, StoreError>
	where
		I: IntoIterator<Item = Role>,
	{
		let mut map = BTreeMap::new();
		for role in roles {
			if map.contains_key(&role.id) {
				return Err(StoreError::RoleExists(role.id));
			}
			map.insert(role.id.clone(), role);
		}
		Ok(Self {
			roles: RwLock::new(map),
		})
	}

	#[instrument(level = "debug", skip(self, role), fields(role_id = %role.id))]
	pub async fn create(&self, role: Role) -> Result<(), StoreError> {
		let mut roles = self.roles.write().await;
		if roles.contains_key(&role.id) {
			return Err(StoreError::RoleExists(role.id));
		}
		roles.insert(role.id.clone(), role);
		Ok(())
	}

	pub async fn get(&self, id: &str) -> Result<Role, StoreError> {
		self
			.roles
			.read()
			.await
			.get(id)
			.cloned()
			.ok_or_else(|| StoreError::RoleNotFound(id.to_string()))
	}

	#[instrument(level = "debug", skip(self))]
	pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
		self
			.roles
			.write()
			.await
			.remove(id)
			.map(|_| ())
			.ok_or_else(|| StoreError::RoleNotFound(id.to_string()))
	}

	#[instrument(level = "debug", skip(self))]
	pub async fn add_member(&self, id: &str, subject: &str) -> Result<(), StoreError> {
		let mut roles = self.roles.write().await;
		let role = roles
			.get_mut(id)
			.ok_or_else(|| StoreError::RoleNotFound(id.to_string()))?;
		role.members.insert(subject.to_string());
		Ok(())
	}

	#[instrument(level = "debug", skip(self))]
	pub async fn remove_member(&self, id: &str, subject: &str) -> Result<(), StoreError> {
		let mut roles = self.roles.write().await;
		let role = roles
			.get_mut(id)
			.ok_or_else(|| StoreError::RoleNotFound(id.to_string()))?;
		role.members.remove(subject);
		Ok(())
	}

	/// Lists roles in id order.
	pub async fn list(&self, offset: usize, limit: usize) -> Vec<Role> {
		self
			.roles
			.read()
			.await
			.values()
			.skip(offset)
			.take(limit)
			.cloned()
			.collect()
	}
}

#[async_trait]
impl RoleStore for MemoryRoleStore {
	async fn roles_of(&self, subject: &str) -> Result<Vec<Role>, StoreError> {
		Ok(self
			.roles
			.read()
			.await
			.values()
			.filter(|r| r.has_member(subject))
			.cloned()
			.collect())
	}
}
