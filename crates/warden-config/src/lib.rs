// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Centralized configuration management for Warden.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Type-safe configuration with validation
//! - Consistent environment variable naming (`WARDEN_*`)
//! - [`SecretString`] for client secrets and credentials
//!
//! # Usage
//!
//! ```ignore
//! use warden_config::load_config;
//!
//! let config = load_config()?;
//! println!("authenticator timeout: {:?}", config.authenticators.timeout);
//! ```

pub mod error;
pub mod layer;
pub mod secret;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::WardenConfigLayer;
pub use secret::SecretString;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info};

/// Fully resolved Warden configuration.
#[derive(Debug, Clone, Default)]
pub struct WardenConfig {
	pub authenticators: AuthenticatorsConfig,
	pub audit: AuditConfig,
	pub logging: LoggingConfig,
	pub store: StoreConfig,
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`WARDEN_*`)
/// 2. Config file (`/etc/warden/warden.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<WardenConfig, ConfigError> {
	let sources: Vec<Box<dyn ConfigSource>> = vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource::new()),
	];
	load_from_sources(sources)
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<WardenConfig, ConfigError> {
	let sources: Vec<Box<dyn ConfigSource>> = vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource::new()),
	];
	load_from_sources(sources)
}

/// Merge the given sources in precedence order and finalize the result.
pub fn load_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<WardenConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = WardenConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
pub fn finalize(layer: WardenConfigLayer) -> Result<WardenConfig, ConfigError> {
	let authenticators = layer.authenticators.unwrap_or_default().finalize()?;
	let audit = layer.audit.unwrap_or_default().finalize()?;
	let logging = layer.logging.unwrap_or_default().finalize();
	let store = layer.store.unwrap_or_default().finalize();
	debug!("configuration finalized");

	Ok(WardenConfig {
		authenticators,
		audit,
		logging,
		store,
	})
}

impl WardenConfig {
	/// Logs a one-line summary of the resolved configuration.
	///
	/// Call this once the subscriber built from [`WardenConfig::logging`] is
	/// installed; loading happens before tracing is initialized.
	pub fn log_summary(&self) {
		info!(
			timeout_secs = self.authenticators.timeout.as_secs(),
			scope_strategy = %self.authenticators.scope_strategy,
			introspection_configured = self.authenticators.introspection.is_some(),
			client_credentials_configured = self.authenticators.client_credentials.is_some(),
			audit_enabled = self.audit.enabled,
			audit_min_severity = %self.audit.min_severity,
			"Warden configuration loaded"
		);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;
	use tempfile::NamedTempFile;
	use warden_policy::ScopeStrategy;

	fn toml_file(content: &str) -> NamedTempFile {
		let mut file = NamedTempFile::new().unwrap();
		write!(file, "{content}").unwrap();
		file
	}

	#[test]
	fn defaults_only() {
		let config = load_from_sources(vec![Box::new(DefaultsSource) as Box<dyn ConfigSource>]).unwrap();
		assert_eq!(config.audit.queue_capacity, 10000);
		assert!(config.audit.enabled);
		assert!(config.authenticators.introspection.is_none());
		assert_eq!(config.logging.format, LogFormat::Compact);
	}

	#[test]
	fn toml_overrides_defaults() {
		let file = toml_file(
			r#"
[audit]
queue_capacity = 64

[authenticators]
timeout_secs = 2
"#,
		);
		let sources: Vec<Box<dyn ConfigSource>> = vec![
			Box::new(DefaultsSource),
			Box::new(TomlSource::new(file.path())),
		];
		let config = load_from_sources(sources).unwrap();
		assert_eq!(config.audit.queue_capacity, 64);
		assert_eq!(config.authenticators.timeout.as_secs(), 2);
	}

	#[test]
	fn env_overrides_toml_regardless_of_source_order() {
		let file = toml_file(
			r#"
[audit]
queue_capacity = 64
min_severity = "notice"

[authenticators.introspection]
url = "https://toml.example.com/introspect"
client_id = "from-toml"
client_secret = "toml-secret"
scope_strategy = "exact"
"#,
		);
		let sources: Vec<Box<dyn ConfigSource>> = vec![
			Box::new(EnvSource::from_vars([
				("WARDEN_AUDIT_QUEUE_CAPACITY", "128"),
				("WARDEN_AUTHENTICATOR_OAUTH2_INTROSPECTION_CLIENT_ID", "from-env"),
			])),
			Box::new(TomlSource::new(file.path())),
			Box::new(DefaultsSource),
		];
		let config = load_from_sources(sources).unwrap();

		assert_eq!(config.audit.queue_capacity, 128);
		assert_eq!(config.audit.min_severity, AuditSeverity::Notice);

		let intro = config.authenticators.introspection.unwrap();
		assert_eq!(intro.client_id, "from-env");
		assert_eq!(intro.client_secret.expose(), "toml-secret");
		assert_eq!(intro.url.host_str(), Some("toml.example.com"));
		assert_eq!(config.authenticators.scope_strategy, ScopeStrategy::Exact);
	}

	#[test]
	fn validation_runs_on_merged_result() {
		let sources: Vec<Box<dyn ConfigSource>> = vec![
			Box::new(DefaultsSource),
			Box::new(EnvSource::from_vars([(
				"WARDEN_AUTHENTICATOR_OAUTH2_INTROSPECTION_URL",
				"https://auth.example.com/introspect",
			)])),
		];
		let config = load_from_sources(sources);
		assert!(matches!(config, Err(ConfigError::Validation(_))));
	}

	#[test]
	fn unknown_audit_severity_fails_at_load() {
		let sources: Vec<Box<dyn ConfigSource>> = vec![
			Box::new(DefaultsSource),
			Box::new(EnvSource::from_vars([("WARDEN_AUDIT_MIN_SEVERITY", "loud")])),
		];
		match load_from_sources(sources) {
			Err(ConfigError::InvalidValue { key, .. }) => assert_eq!(key, "audit.min_severity"),
			other => panic!("expected InvalidValue, got {other:?}"),
		}
	}

	#[test]
	fn invalid_url_is_rejected() {
		let sources: Vec<Box<dyn ConfigSource>> = vec![Box::new(EnvSource::from_vars([(
			"WARDEN_AUTHENTICATOR_OAUTH2_CLIENT_CREDENTIALS_TOKEN_URL",
			"::not-a-url::",
		)]))];
		let config = load_from_sources(sources);
		assert!(matches!(config, Err(ConfigError::InvalidValue { .. })));
	}
}
