// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: defaults, TOML files and environment variables.

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::WardenConfigLayer;
use crate::secret::SecretString;
use crate::sections::{
	AuditConfigLayer, AuthenticatorsConfigLayer, ClientCredentialsConfigLayer,
	IntrospectionConfigLayer, LogFormat, LoggingConfigLayer, QueueOverflowPolicy, StoreConfigLayer,
};

/// Default location of the configuration file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/warden/warden.toml";

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<WardenConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<WardenConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(WardenConfigLayer::default())
	}
}

/// TOML file configuration source. A missing file yields an empty layer.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new(SYSTEM_CONFIG_PATH)
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<WardenConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(WardenConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: WardenConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: `WARDEN_<SECTION>_<FIELD>`. Authenticator variables keep the
/// historical `WARDEN_AUTHENTICATOR_OAUTH2_*` names. Secrets also accept a
/// `<NAME>_FILE` variant pointing at a file holding the value.
#[derive(Default)]
pub struct EnvSource {
	vars: Option<HashMap<String, String>>,
}

impl EnvSource {
	/// Reads from the process environment.
	pub fn new() -> Self {
		Self::default()
	}

	/// Reads from a fixed set of variables instead of the process environment.
	pub fn from_vars<I, K, V>(vars: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		Self {
			vars: Some(
				vars.into_iter()
					.map(|(k, v)| (k.into(), v.into()))
					.collect(),
			),
		}
	}

	fn var(&self, name: &str) -> Option<String> {
		let value = match &self.vars {
			Some(vars) => vars.get(name).cloned(),
			None => std::env::var(name).ok(),
		};
		value.filter(|s| !s.is_empty())
	}

	fn bool(&self, name: &str) -> Option<bool> {
		self.var(name)
			.map(|v| v.eq_ignore_ascii_case("true") || v == "1")
	}

	fn parsed<T: std::str::FromStr>(&self, name: &str, kind: &str) -> Result<Option<T>, ConfigError> {
		match self.var(name) {
			Some(v) => v
				.parse()
				.map(Some)
				.map_err(|_| ConfigError::invalid(name, format!("invalid {kind} value '{v}'"))),
			None => Ok(None),
		}
	}

	fn list(&self, name: &str) -> Option<Vec<String>> {
		self.var(name).map(|s| {
			s.split(',')
				.map(|s| s.trim().to_string())
				.filter(|s| !s.is_empty())
				.collect()
		})
	}

	/// `NAME_FILE` takes precedence over `NAME`. A single trailing newline in the
	/// file is stripped.
	fn secret(&self, name: &str) -> Result<Option<SecretString>, ConfigError> {
		let file_var = format!("{name}_FILE");
		if let Some(path) = self.var(&file_var) {
			let content = std::fs::read_to_string(&path)
				.map_err(|e| ConfigError::Secret(format!("failed to read {file_var} at {path}: {e}")))?;
			let value = content.strip_suffix('\n').unwrap_or(&content);
			return Ok(Some(SecretString::new(value)));
		}
		Ok(self.var(name).map(SecretString::new))
	}

	fn load_authenticators(&self) -> Result<AuthenticatorsConfigLayer, ConfigError> {
		const INTROSPECTION: &str = "WARDEN_AUTHENTICATOR_OAUTH2_INTROSPECTION";
		const CLIENT_CREDENTIALS: &str = "WARDEN_AUTHENTICATOR_OAUTH2_CLIENT_CREDENTIALS";

		Ok(AuthenticatorsConfigLayer {
			timeout_secs: self.parsed("WARDEN_AUTHENTICATOR_TIMEOUT_SECS", "u64")?,
			introspection: Some(IntrospectionConfigLayer {
				url: self.var(&format!("{INTROSPECTION}_URL")),
				token_url: self.var(&format!("{INTROSPECTION}_TOKEN_URL")),
				client_id: self.var(&format!("{INTROSPECTION}_CLIENT_ID")),
				client_secret: self.secret(&format!("{INTROSPECTION}_CLIENT_SECRET"))?,
				scopes: self.list(&format!("{INTROSPECTION}_SCOPE")),
				scope_strategy: self.var(&format!("{INTROSPECTION}_SCOPE_STRATEGY")),
			}),
			client_credentials: Some(ClientCredentialsConfigLayer {
				token_url: self.var(&format!("{CLIENT_CREDENTIALS}_TOKEN_URL")),
				scopes: self.list(&format!("{CLIENT_CREDENTIALS}_SCOPE")),
			}),
		})
	}

	fn load_audit(&self) -> Result<AuditConfigLayer, ConfigError> {
		let queue_overflow_policy = match self.var("WARDEN_AUDIT_QUEUE_OVERFLOW_POLICY") {
			Some(v) => Some(QueueOverflowPolicy::from_name(&v).ok_or_else(|| {
				ConfigError::invalid(
					"WARDEN_AUDIT_QUEUE_OVERFLOW_POLICY",
					format!("expected drop_newest or block, got '{v}'"),
				)
			})?),
			None => None,
		};

		Ok(AuditConfigLayer {
			enabled: self.bool("WARDEN_AUDIT_ENABLED"),
			queue_capacity: self.parsed("WARDEN_AUDIT_QUEUE_CAPACITY", "usize")?,
			queue_overflow_policy,
			min_severity: self.var("WARDEN_AUDIT_MIN_SEVERITY"),
			tracing_sink: self.bool("WARDEN_AUDIT_TRACING_SINK"),
			file_path: self.var("WARDEN_AUDIT_FILE_PATH").map(PathBuf::from),
		})
	}

	fn load_logging(&self) -> Result<LoggingConfigLayer, ConfigError> {
		let format = match self.var("WARDEN_LOGGING_FORMAT") {
			Some(v) => Some(LogFormat::from_name(&v).ok_or_else(|| {
				ConfigError::invalid(
					"WARDEN_LOGGING_FORMAT",
					format!("expected json, compact or pretty, got '{v}'"),
				)
			})?),
			None => None,
		};

		Ok(LoggingConfigLayer {
			level: self.var("WARDEN_LOGGING_LEVEL"),
			format,
		})
	}

	fn load_store(&self) -> StoreConfigLayer {
		StoreConfigLayer {
			policies_path: self.var("WARDEN_STORE_POLICIES_PATH").map(PathBuf::from),
			roles_path: self.var("WARDEN_STORE_ROLES_PATH").map(PathBuf::from),
		}
	}
}

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<WardenConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(WardenConfigLayer {
			authenticators: Some(self.load_authenticators()?),
			audit: Some(self.load_audit()?),
			logging: Some(self.load_logging()?),
			store: Some(self.load_store()),
		})
	}
}
