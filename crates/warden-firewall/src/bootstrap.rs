// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Building a ready-to-use [`Firewall`] from [`WardenConfig`].

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use tracing::{info, instrument, warn};
use warden_audit::{AuditLogger, AuditService, NoopAuditLogger};
use warden_authn::AuthenticatorRegistry;
use warden_config::{ConfigError, WardenConfig};
use warden_policy::{MemoryPolicyStore, MemoryRoleStore, Policy, PolicyError, Role};

use crate::error::WardenError;
use crate::firewall::Firewall;

/// A configured firewall together with the pieces it was built from.
pub struct Warden {
	pub firewall: Arc<Firewall>,
	pub policies: Arc<MemoryPolicyStore>,
	pub roles: Arc<MemoryRoleStore>,
	audit: Option<Arc<AuditService>>,
}

impl Warden {
	/// Drops the firewall and drains the audit queue.
	///
	/// If the firewall is still shared elsewhere the queue cannot be closed; queued
	/// records are then flushed when the last handle goes away.
	pub async fn shutdown(self) -> Result<(), WardenError> {
		let Warden {
			firewall, audit, ..
		} = self;
		drop(firewall);

		let Some(audit) = audit else {
			return Ok(());
		};
		match Arc::try_unwrap(audit) {
			Ok(service) => service.shutdown().await.map_err(WardenError::from),
			Err(_) => {
				warn!("firewall still in use, audit queue not drained");
				Ok(())
			}
		}
	}
}

/// Loads the seed stores, starts the audit pipeline and builds the firewall.
///
/// Must be called inside a tokio runtime when audit is enabled.
#[instrument(skip_all)]
pub async fn bootstrap(config: &WardenConfig) -> Result<Warden, WardenError> {
	let policies = Arc::new(match &config.store.policies_path {
		Some(path) => load_policies(path).await?,
		None => MemoryPolicyStore::new(),
	});
	let roles = Arc::new(match &config.store.roles_path {
		Some(path) => load_roles(path).await?,
		None => MemoryRoleStore::new(),
	});

	let audit = if config.audit.enabled {
		Some(Arc::new(AuditService::from_config(&config.audit)))
	} else {
		None
	};
	let audit_logger: Arc<dyn AuditLogger> = match &audit {
		Some(service) => Arc::clone(service) as Arc<dyn AuditLogger>,
		None => Arc::new(NoopAuditLogger) as Arc<dyn AuditLogger>,
	};

	let authenticators = AuthenticatorRegistry::from_config(&config.authenticators)?;

	let firewall = Firewall::builder(policies.clone(), roles.clone())
		.authenticators(authenticators)
		.scope_strategy(config.authenticators.scope_strategy)
		.timeout(config.authenticators.timeout)
		.audit_logger(audit_logger)
		.build();

	info!(
		policies = policies.len().await,
		audit_enabled = audit.is_some(),
		"firewall ready"
	);

	Ok(Warden {
		firewall: Arc::new(firewall),
		policies,
		roles,
		audit,
	})
}

/// Parses a JSON array of policies and validates every one of them.
///
/// Ids must be unique within the document.
pub fn parse_policies(json: &str) -> Result<Vec<Policy>, WardenError> {
	let policies: Vec<Policy> = serde_json::from_str(json)
		.map_err(|e| ConfigError::Validation(format!("malformed policy document: {e}")))?;

	let mut seen = BTreeSet::new();
	for policy in &policies {
		policy.validate()?;
		if !seen.insert(policy.id.as_str()) {
			return Err(PolicyError::Duplicate(policy.id.clone()).into());
		}
	}
	Ok(policies)
}

pub async fn load_policies(path: &Path) -> Result<MemoryPolicyStore, WardenError> {
	let json = read_seed(path).await?;
	let policies = parse_policies(&json)?;
	info!(path = %path.display(), count = policies.len(), "loaded policies");
	Ok(MemoryPolicyStore::from_policies(policies)?)
}

pub async fn load_roles(path: &Path) -> Result<MemoryRoleStore, WardenError> {
	let json = read_seed(path).await?;
	let roles: Vec<Role> = serde_json::from_str(&json)
		.map_err(|e| ConfigError::Validation(format!("malformed role document: {e}")))?;
	info!(path = %path.display(), count = roles.len(), "loaded roles");
	Ok(MemoryRoleStore::from_roles(roles)?)
}

async fn read_seed(path: &Path) -> Result<String, ConfigError> {
	tokio::fs::read_to_string(path)
		.await
		.map_err(|source| ConfigError::FileRead {
			path: path.to_path_buf(),
			source,
		})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::firewall::AccessQuery;
	use tempfile::TempDir;
	use warden_config::{AuditConfig, StoreConfig};

	const POLICIES: &str = r#"[
		{
			"id": "admins",
			"subjects": ["admin"],
			"resources": ["<.*>"],
			"actions": ["<.*>"],
			"effect": "allow"
		}
	]"#;

	const ROLES: &str = r#"[{"id": "admin", "members": ["peter"]}]"#;

	mod parsing {
		use super::*;

		#[test]
		fn parses_valid_document() {
			let policies = parse_policies(POLICIES).unwrap();
			assert_eq!(policies.len(), 1);
			assert_eq!(policies[0].id, "admins");
		}

		#[test]
		fn rejects_duplicate_ids() {
			let json = r#"[
				{"id": "p", "subjects": ["a"], "resources": ["r"], "actions": ["x"], "effect": "allow"},
				{"id": "p", "subjects": ["b"], "resources": ["r"], "actions": ["x"], "effect": "deny"}
			]"#;
			assert!(matches!(
				parse_policies(json),
				Err(WardenError::Policy(PolicyError::Duplicate(id))) if id == "p"
			));
		}

		#[test]
		fn rejects_policy_without_actions() {
			let json = r#"[{"id": "p", "subjects": ["a"], "resources": ["r"], "actions": [], "effect": "allow"}]"#;
			assert!(matches!(
				parse_policies(json),
				Err(WardenError::Policy(PolicyError::EmptyPatterns { .. }))
			));
		}

		#[test]
		fn rejects_malformed_json() {
			assert!(matches!(
				parse_policies("{not json"),
				Err(WardenError::Config(ConfigError::Validation(_)))
			));
		}
	}

	mod seeding {
		use super::*;

		#[tokio::test]
		async fn missing_seed_file_is_config_error() {
			let dir = TempDir::new().unwrap();
			let result = load_policies(&dir.path().join("absent.json")).await;
			assert!(matches!(
				result,
				Err(WardenError::Config(ConfigError::FileRead { .. }))
			));
		}

		#[tokio::test]
		async fn bootstrap_seeds_stores_and_decides() {
			let dir = TempDir::new().unwrap();
			let policies_path = dir.path().join("policies.json");
			let roles_path = dir.path().join("roles.json");
			let audit_path = dir.path().join("audit.jsonl");
			tokio::fs::write(&policies_path, POLICIES).await.unwrap();
			tokio::fs::write(&roles_path, ROLES).await.unwrap();

			let config = WardenConfig {
				store: StoreConfig {
					policies_path: Some(policies_path),
					roles_path: Some(roles_path),
				},
				audit: AuditConfig {
					tracing_sink: false,
					file_path: Some(audit_path.clone()),
					..Default::default()
				},
				..Default::default()
			};

			let warden = bootstrap(&config).await.unwrap();
			let decision = warden
				.firewall
				.is_subject_allowed("peter", AccessQuery::new("anything", "delete"))
				.await
				.unwrap();
			assert!(decision.allowed);

			warden.shutdown().await.unwrap();
			let audit = tokio::fs::read_to_string(&audit_path).await.unwrap();
			assert_eq!(audit.lines().count(), 1);
		}

		#[tokio::test]
		async fn disabled_audit_uses_noop_logger() {
			let config = WardenConfig {
				audit: AuditConfig {
					enabled: false,
					..Default::default()
				},
				..Default::default()
			};
			let warden = bootstrap(&config).await.unwrap();
			assert!(warden.audit.is_none());
			warden.shutdown().await.unwrap();
		}
	}
}
