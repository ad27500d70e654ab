// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The decision point.
//!
//! A [`Firewall`] runs one authorization call end to end:
//!
//! 1. pick the authenticator registered for the credential kind
//! 2. authenticate, bounded by the configured timeout
//! 3. expand the subject into its roles
//! 4. fetch candidate policies for the subject and its roles
//! 5. run the [`DecisionEngine`]
//! 6. hand an [`AuditRecord`] to the audit logger
//!
//! Authentication errors and store errors abort the call; nothing is retried.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, instrument, warn};
use warden_audit::{AuditLogger, AuditRecord, NoopAuditLogger};
use warden_authn::{
	AuthenticatorRegistry, Authenticator, PlaintextAuthenticator, KIND_SUBJECTS,
};
use warden_config::SecretString;
use warden_policy::{
	AccessRequest, Context, Decision, DecisionEngine, PolicyStore, RoleResolver, RoleStore,
	ScopeStrategy,
};

use crate::error::WardenError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// What to check, independent of who is asking.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccessQuery {
	pub resource: String,
	pub action: String,
	pub context: Context,
	pub required_scope: Option<String>,
}

impl AccessQuery {
	pub fn new(resource: impl Into<String>, action: impl Into<String>) -> Self {
		Self {
			resource: resource.into(),
			action: action.into(),
			..Default::default()
		}
	}

	pub fn with_context(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
		self.context.insert(key.into(), value.into());
		self
	}

	pub fn with_required_scope(mut self, scope: impl Into<String>) -> Self {
		self.required_scope = Some(scope.into());
		self
	}

	fn into_request(self, subject: String) -> AccessRequest {
		AccessRequest {
			subject,
			resource: self.resource,
			action: self.action,
			context: self.context,
			required_scope: self.required_scope,
		}
	}
}

pub struct Firewall {
	authenticators: AuthenticatorRegistry,
	policies: Arc<dyn PolicyStore>,
	roles: RoleResolver,
	engine: DecisionEngine,
	audit: Arc<dyn AuditLogger>,
	timeout: Duration,
}

impl Firewall {
	pub fn builder(policies: Arc<dyn PolicyStore>, roles: Arc<dyn RoleStore>) -> FirewallBuilder {
		FirewallBuilder::new(policies, roles)
	}

	pub fn scope_strategy(&self) -> ScopeStrategy {
		self.engine.scope_strategy()
	}

	pub fn authenticators(&self) -> &AuthenticatorRegistry {
		&self.authenticators
	}

	/// Authenticates `credential` with the authenticator registered for `kind`
	/// and decides whether the resulting subject may perform the query.
	#[instrument(
		skip(self, credential, query),
		fields(resource = %query.resource, action = %query.action)
	)]
	pub async fn is_allowed(
		&self,
		credential: &SecretString,
		kind: &str,
		query: AccessQuery,
	) -> Result<Decision, WardenError> {
		let authenticator = self
			.authenticators
			.get(kind)
			.ok_or_else(|| WardenError::UnknownAuthenticator(kind.to_string()))?;

		let authentication = match tokio::time::timeout(
			self.timeout,
			authenticator.authenticate(credential),
		)
		.await
		{
			Ok(Ok(authentication)) => authentication,
			Ok(Err(e)) => {
				warn!(kind, error = %e, "authentication failed");
				return Err(e.into());
			}
			Err(_) => {
				warn!(kind, timeout_ms = self.timeout.as_millis() as u64, "authentication timed out");
				return Err(WardenError::Upstream(format!(
					"authentication timed out after {:?}",
					self.timeout
				)));
			}
		};

		let request = query.into_request(authentication.subject);
		self
			.decide(kind, request, &authentication.granted_scopes)
			.await
	}

	/// Decides for an already known subject. No authentication, no scopes.
	#[instrument(skip(self, query), fields(resource = %query.resource, action = %query.action))]
	pub async fn is_subject_allowed(
		&self,
		subject: &str,
		query: AccessQuery,
	) -> Result<Decision, WardenError> {
		if subject.trim().is_empty() {
			return Err(WardenError::InvalidCredential(
				"subject must not be empty".to_string(),
			));
		}
		let request = query.into_request(subject.to_string());
		self.decide(KIND_SUBJECTS, request, &BTreeSet::new()).await
	}

	async fn decide(
		&self,
		kind: &str,
		request: AccessRequest,
		granted_scopes: &BTreeSet<String>,
	) -> Result<Decision, WardenError> {
		let roles = self.roles.roles_of(&request.subject).await?;

		let subjects: Vec<String> = std::iter::once(request.subject.clone())
			.chain(roles.iter().cloned())
			.collect();
		let candidates = self
			.policies
			.find_candidates(&request, &subjects)
			.await
			.map_err(|e| {
				error!(error = %e, "policy lookup failed");
				e
			})?;

		let decision = self
			.engine
			.decide(&request, &roles, granted_scopes, &candidates);
		debug!(
			subject = %request.subject,
			allowed = decision.allowed,
			reason = %decision.reason,
			"authorization decided"
		);

		self
			.audit
			.record(AuditRecord::new(kind, &request, &roles, &decision));

		Ok(decision)
	}
}

impl fmt::Debug for Firewall {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Firewall")
			.field("authenticators", &self.authenticators)
			.field("engine", &self.engine)
			.field("timeout", &self.timeout)
			.finish_non_exhaustive()
	}
}

/// Wires stores, authenticators, scope strategy and audit logger into a [`Firewall`].
pub struct FirewallBuilder {
	policies: Arc<dyn PolicyStore>,
	roles: Arc<dyn RoleStore>,
	authenticators: Option<AuthenticatorRegistry>,
	scope_strategy: ScopeStrategy,
	audit: Arc<dyn AuditLogger>,
	timeout: Duration,
}

impl FirewallBuilder {
	pub fn new(policies: Arc<dyn PolicyStore>, roles: Arc<dyn RoleStore>) -> Self {
		Self {
			policies,
			roles,
			authenticators: None,
			scope_strategy: ScopeStrategy::default(),
			audit: Arc::new(NoopAuditLogger),
			timeout: DEFAULT_TIMEOUT,
		}
	}

	/// Replaces the authenticator registry. Without one, only `subjects` is available.
	pub fn authenticators(mut self, registry: AuthenticatorRegistry) -> Self {
		self.authenticators = Some(registry);
		self
	}

	pub fn authenticator(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
		self
			.authenticators
			.get_or_insert_with(default_registry)
			.register(authenticator);
		self
	}

	pub fn scope_strategy(mut self, strategy: ScopeStrategy) -> Self {
		self.scope_strategy = strategy;
		self
	}

	pub fn audit_logger(mut self, audit: Arc<dyn AuditLogger>) -> Self {
		self.audit = audit;
		self
	}

	pub fn timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;
		self
	}

	pub fn build(self) -> Firewall {
		Firewall {
			authenticators: self.authenticators.unwrap_or_else(default_registry),
			policies: self.policies,
			roles: RoleResolver::new(self.roles),
			engine: DecisionEngine::new(self.scope_strategy),
			audit: self.audit,
			timeout: self.timeout,
		}
	}
}

fn default_registry() -> AuthenticatorRegistry {
	let mut registry = AuthenticatorRegistry::new();
	registry.register(Arc::new(PlaintextAuthenticator::new()));
	registry
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use warden_audit::MemoryAuditLog;
	use warden_authn::{Authentication, AuthnError};
	use warden_policy::{MemoryPolicyStore, MemoryRoleStore, Policy, Reason, Role, StoreError};

	fn allow_all_articles() -> Policy {
		Policy::allow("articles")
			.with_subjects(["peter"])
			.with_resources(["article:<.*>"])
			.with_actions(["view"])
	}

	async fn firewall_with(policies: Vec<Policy>, audit: Arc<MemoryAuditLog>) -> Firewall {
		let policies = Arc::new(MemoryPolicyStore::from_policies(policies).unwrap());
		let roles = Arc::new(MemoryRoleStore::new());
		Firewall::builder(policies, roles).audit_logger(audit).build()
	}

	struct SlowAuthenticator;

	#[async_trait]
	impl Authenticator for SlowAuthenticator {
		fn kind(&self) -> &str {
			"slow"
		}

		async fn authenticate(&self, _credential: &SecretString) -> Result<Authentication, AuthnError> {
			tokio::time::sleep(Duration::from_secs(5)).await;
			Ok(Authentication::new("late"))
		}
	}

	struct ScopedAuthenticator;

	#[async_trait]
	impl Authenticator for ScopedAuthenticator {
		fn kind(&self) -> &str {
			"scoped"
		}

		async fn authenticate(&self, credential: &SecretString) -> Result<Authentication, AuthnError> {
			Ok(Authentication::new(credential.expose()).with_scopes(["photos"]))
		}
	}

	struct BrokenRoleStore;

	#[async_trait]
	impl RoleStore for BrokenRoleStore {
		async fn roles_of(&self, _subject: &str) -> Result<Vec<Role>, StoreError> {
			Err(StoreError::Unavailable("connection refused".to_string()))
		}
	}

	mod authentication {
		use super::*;

		#[tokio::test]
		async fn unknown_kind_is_rejected() {
			let firewall = firewall_with(vec![], Arc::new(MemoryAuditLog::new())).await;
			let err = firewall
				.is_allowed(&SecretString::new("peter"), "kerberos", AccessQuery::new("a", "b"))
				.await
				.unwrap_err();
			assert!(matches!(err, WardenError::UnknownAuthenticator(k) if k == "kerberos"));
		}

		#[tokio::test]
		async fn empty_subject_is_invalid_and_not_audited() {
			let audit = Arc::new(MemoryAuditLog::new());
			let firewall = firewall_with(vec![allow_all_articles()], audit.clone()).await;
			let err = firewall
				.is_allowed(&SecretString::new(""), KIND_SUBJECTS, AccessQuery::new("a", "b"))
				.await
				.unwrap_err();
			assert!(matches!(err, WardenError::InvalidCredential(_)));
			assert!(audit.is_empty());
		}

		#[tokio::test]
		async fn slow_authenticator_times_out_as_upstream() {
			let firewall = Firewall::builder(
				Arc::new(MemoryPolicyStore::new()),
				Arc::new(MemoryRoleStore::new()),
			)
			.authenticator(Arc::new(SlowAuthenticator))
			.timeout(Duration::from_millis(100))
			.build();

			let err = firewall
				.is_allowed(&SecretString::new("x"), "slow", AccessQuery::new("a", "b"))
				.await
				.unwrap_err();
			assert!(matches!(err, WardenError::Upstream(_)));
		}
	}

	mod decisions {
		use super::*;

		#[tokio::test]
		async fn allowed_decision_is_audited() {
			let audit = Arc::new(MemoryAuditLog::new());
			let firewall = firewall_with(vec![allow_all_articles()], audit.clone()).await;

			let decision = firewall
				.is_allowed(
					&SecretString::new("peter"),
					KIND_SUBJECTS,
					AccessQuery::new("article:1", "view"),
				)
				.await
				.unwrap();

			assert!(decision.allowed);
			let records = audit.records();
			assert_eq!(records.len(), 1);
			assert_eq!(records[0].credential_kind, KIND_SUBJECTS);
			assert_eq!(records[0].subject, "peter");
			assert_eq!(records[0].matched_policy_id.as_deref(), Some("articles"));
		}

		#[tokio::test]
		async fn default_deny_is_stable() {
			let audit = Arc::new(MemoryAuditLog::new());
			let firewall = firewall_with(vec![allow_all_articles()], audit.clone()).await;

			for _ in 0..3 {
				let decision = firewall
					.is_subject_allowed("stan", AccessQuery::new("article:1", "view"))
					.await
					.unwrap();
				assert!(!decision.allowed);
				assert_eq!(decision.reason, Reason::NoMatchingPolicy);
			}
			assert_eq!(audit.len(), 3);
		}

		#[tokio::test]
		async fn granted_scopes_feed_required_scope_check() {
			let policies = Arc::new(MemoryPolicyStore::from_policies([allow_all_articles()
				.with_subjects(["<.*>"])])
			.unwrap());
			let firewall = Firewall::builder(policies, Arc::new(MemoryRoleStore::new()))
				.authenticator(Arc::new(ScopedAuthenticator))
				.scope_strategy(ScopeStrategy::Hierarchic)
				.build();

			let ok = firewall
				.is_allowed(
					&SecretString::new("app"),
					"scoped",
					AccessQuery::new("article:1", "view").with_required_scope("photos.read"),
				)
				.await
				.unwrap();
			assert!(ok.allowed);

			let mismatch = firewall
				.is_allowed(
					&SecretString::new("app"),
					"scoped",
					AccessQuery::new("article:1", "view").with_required_scope("videos"),
				)
				.await
				.unwrap();
			assert_eq!(mismatch.reason, Reason::ScopeMismatch);
		}

		#[tokio::test]
		async fn subject_entry_point_has_no_scopes() {
			let firewall = firewall_with(vec![allow_all_articles()], Arc::new(MemoryAuditLog::new())).await;
			let decision = firewall
				.is_subject_allowed(
					"peter",
					AccessQuery::new("article:1", "view").with_required_scope("photos"),
				)
				.await
				.unwrap();
			assert_eq!(decision.reason, Reason::ScopeMismatch);
		}
	}

	mod stores {
		use super::*;

		#[tokio::test]
		async fn role_store_failure_aborts() {
			let audit = Arc::new(MemoryAuditLog::new());
			let firewall = Firewall::builder(
				Arc::new(MemoryPolicyStore::new()),
				Arc::new(BrokenRoleStore),
			)
			.audit_logger(audit.clone())
			.build();

			let err = firewall
				.is_subject_allowed("peter", AccessQuery::new("a", "b"))
				.await
				.unwrap_err();
			assert!(matches!(err, WardenError::Store(StoreError::Unavailable(_))));
			assert!(audit.is_empty());
		}
	}

	#[test]
	fn builder_defaults() {
		let firewall = Firewall::builder(
			Arc::new(MemoryPolicyStore::new()),
			Arc::new(MemoryRoleStore::new()),
		)
		.build();
		assert_eq!(firewall.scope_strategy(), ScopeStrategy::Wildcard);
		assert!(firewall.authenticators().get(KIND_SUBJECTS).is_some());
		assert!(format!("{firewall:?}").contains("Firewall"));
	}
}
