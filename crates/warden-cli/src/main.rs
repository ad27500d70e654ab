// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! `warden`: ask the decision point from the command line.
//!
//! Exit codes: `0` allowed (or valid), `1` denied (or invalid), `2` error.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Context as _, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::Subscriber;
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use warden_config::{LogFormat, LoggingConfig, SecretString, WardenConfig};
use warden_firewall::{bootstrap, parse_policies, AccessQuery, WardenError};

const EXIT_ALLOWED: u8 = 0;
const EXIT_DENIED: u8 = 1;
const EXIT_ERROR: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "warden", version, about, long_about = None)]
struct Cli {
	/// Config file (defaults to /etc/warden/warden.toml)
	#[arg(long, global = true, env = "WARDEN_CONFIG")]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Decide a single access request and print the decision as JSON
	Check {
		/// Authenticator kind: subjects, oauth2/access-tokens or oauth2/clients
		#[arg(long, default_value = "subjects")]
		kind: String,
		/// Subject, access token or client_id:client_secret, depending on --kind
		#[arg(long, env = "WARDEN_CREDENTIAL", hide_env_values = true)]
		credential: String,
		#[arg(long)]
		resource: String,
		#[arg(long)]
		action: String,
		/// Context attribute (repeatable: --context KEY=VALUE). Values that parse
		/// as JSON are used as such, anything else is a string.
		#[arg(long, short = 'c', value_name = "KEY=VALUE")]
		context: Vec<String>,
		/// Scope the credential must have been granted
		#[arg(long)]
		scope: Option<String>,
	},
	/// Parse and validate a JSON policy document
	Validate {
		/// Path to a JSON array of policies
		policies: PathBuf,
	},
}

fn parse_context_pair(pair: &str) -> Result<(String, Value)> {
	let (key, raw) = pair
		.split_once('=')
		.ok_or_else(|| anyhow!("context must be KEY=VALUE, got '{pair}'"))?;
	if key.is_empty() {
		return Err(anyhow!("context key must not be empty in '{pair}'"));
	}
	let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
	Ok((key.to_string(), value))
}

fn init_tracing(logging: &LoggingConfig) {
	build_subscriber(logging, std::io::stderr).init();
}

fn build_subscriber<W>(logging: &LoggingConfig, writer: W) -> Box<dyn Subscriber + Send + Sync>
where
	W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
	let registry = tracing_subscriber::registry().with(filter);

	match logging.format {
		LogFormat::Json => Box::new(registry.with(fmt::layer().json().with_writer(writer))),
		LogFormat::Compact => Box::new(registry.with(fmt::layer().compact().with_writer(writer))),
		LogFormat::Pretty => Box::new(registry.with(fmt::layer().pretty().with_writer(writer))),
	}
}

/// Logs startup details. Runs once tracing is initialized.
fn announce(config: &WardenConfig) {
	tracing::debug!(version = env!("CARGO_PKG_VERSION"), "warden starting");
	config.log_summary();
}

fn load_config(path: Option<&PathBuf>) -> Result<WardenConfig> {
	let config = match path {
		Some(path) => warden_config::load_config_with_file(path),
		None => warden_config::load_config(),
	};
	config.context("failed to load configuration")
}

fn with_status(e: WardenError) -> anyhow::Error {
	anyhow!("{e} (HTTP {})", e.status_code().as_u16())
}

async fn check(
	config: &WardenConfig,
	kind: String,
	credential: String,
	query: AccessQuery,
) -> Result<u8> {
	let warden = bootstrap(config).await.map_err(with_status)?;

	let result = warden
		.firewall
		.is_allowed(&SecretString::new(credential), &kind, query)
		.await;

	// Drain the audit queue whatever the outcome.
	warden.shutdown().await.map_err(with_status)?;

	let decision = result.map_err(with_status)?;
	println!("{}", serde_json::to_string_pretty(&decision)?);

	Ok(if decision.allowed {
		EXIT_ALLOWED
	} else {
		EXIT_DENIED
	})
}

async fn validate(path: PathBuf) -> Result<u8> {
	let json = tokio::fs::read_to_string(&path)
		.await
		.with_context(|| format!("failed to read {}", path.display()))?;

	match parse_policies(&json) {
		Ok(policies) => {
			println!("{}: {} policies OK", path.display(), policies.len());
			Ok(EXIT_ALLOWED)
		}
		Err(e) => {
			println!("{}: {e}", path.display());
			Ok(EXIT_DENIED)
		}
	}
}

async fn run(cli: Cli) -> Result<u8> {
	let config = load_config(cli.config.as_ref())?;
	init_tracing(&config.logging);
	announce(&config);

	match cli.command {
		Command::Check {
			kind,
			credential,
			resource,
			action,
			context,
			scope,
		} => {
			let mut query = AccessQuery::new(resource, action);
			for pair in &context {
				let (key, value) = parse_context_pair(pair)?;
				query = query.with_context(key, value);
			}
			if let Some(scope) = scope {
				query = query.with_required_scope(scope);
			}
			check(&config, kind, credential, query).await
		}
		Command::Validate { policies } => validate(policies).await,
	}
}

#[tokio::main]
async fn main() -> ExitCode {
	let cli = Cli::parse();
	match run(cli).await {
		Ok(code) => ExitCode::from(code),
		Err(e) => {
			eprintln!("error: {e:#}");
			ExitCode::from(EXIT_ERROR)
		}
	}
}
