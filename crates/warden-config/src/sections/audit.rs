// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Audit logging configuration section.

use std::cmp::Ordering;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const DEFAULT_QUEUE_CAPACITY: usize = 10000;

/// RFC 5424 severities. Ordering follows severity, so `Warning > Info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSeverity {
	Debug = 7,
	#[default]
	Info = 6,
	Notice = 5,
	#[serde(alias = "warn")]
	Warning = 4,
	Error = 3,
	Critical = 2,
}

impl AuditSeverity {
	/// Returns the RFC 5424 numeric severity code.
	pub fn as_syslog_code(&self) -> u8 {
		*self as u8
	}

	pub fn from_name(name: &str) -> Option<Self> {
		match name.trim().to_ascii_lowercase().as_str() {
			"debug" => Some(Self::Debug),
			"info" => Some(Self::Info),
			"notice" => Some(Self::Notice),
			"warning" | "warn" => Some(Self::Warning),
			"error" => Some(Self::Error),
			"critical" => Some(Self::Critical),
			_ => None,
		}
	}
}

impl PartialOrd for AuditSeverity {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for AuditSeverity {
	fn cmp(&self, other: &Self) -> Ordering {
		// Lower numeric value = higher severity (Critical=2 > Debug=7)
		(*other as u8).cmp(&(*self as u8))
	}
}

impl fmt::Display for AuditSeverity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			AuditSeverity::Debug => "debug",
			AuditSeverity::Info => "info",
			AuditSeverity::Notice => "notice",
			AuditSeverity::Warning => "warning",
			AuditSeverity::Error => "error",
			AuditSeverity::Critical => "critical",
		};
		f.write_str(s)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QueueOverflowPolicy {
	/// Drop the record being enqueued when the queue is full.
	#[default]
	DropNewest,
	/// Wait for space in the queue.
	Block,
}

impl QueueOverflowPolicy {
	pub fn from_name(name: &str) -> Option<Self> {
		match name.to_ascii_lowercase().as_str() {
			"drop_newest" => Some(Self::DropNewest),
			"block" => Some(Self::Block),
			_ => None,
		}
	}
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AuditConfigLayer {
	pub enabled: Option<bool>,
	pub queue_capacity: Option<usize>,
	pub queue_overflow_policy: Option<QueueOverflowPolicy>,
	pub min_severity: Option<String>,
	/// Emit each record as a `tracing` event.
	pub tracing_sink: Option<bool>,
	/// Append each record as a JSON line to this file.
	pub file_path: Option<PathBuf>,
}

impl AuditConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.enabled.is_some() {
			self.enabled = other.enabled;
		}
		if other.queue_capacity.is_some() {
			self.queue_capacity = other.queue_capacity;
		}
		if other.queue_overflow_policy.is_some() {
			self.queue_overflow_policy = other.queue_overflow_policy;
		}
		if other.min_severity.is_some() {
			self.min_severity = other.min_severity;
		}
		if other.tracing_sink.is_some() {
			self.tracing_sink = other.tracing_sink;
		}
		if other.file_path.is_some() {
			self.file_path = other.file_path;
		}
	}

	pub fn finalize(self) -> Result<AuditConfig, ConfigError> {
		let queue_capacity = self.queue_capacity.unwrap_or(DEFAULT_QUEUE_CAPACITY);
		if queue_capacity == 0 {
			return Err(ConfigError::Validation(
				"audit.queue_capacity must be greater than zero".to_string(),
			));
		}

		let min_severity = match self.min_severity {
			Some(name) => AuditSeverity::from_name(&name).ok_or_else(|| {
				ConfigError::invalid(
					"audit.min_severity",
					format!("expected debug, info, notice, warning, error or critical, got '{name}'"),
				)
			})?,
			None => AuditSeverity::default(),
		};

		Ok(AuditConfig {
			enabled: self.enabled.unwrap_or(true),
			queue_capacity,
			queue_overflow_policy: self.queue_overflow_policy.unwrap_or_default(),
			min_severity,
			tracing_sink: self.tracing_sink.unwrap_or(true),
			file_path: self.file_path,
		})
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditConfig {
	pub enabled: bool,
	pub queue_capacity: usize,
	pub queue_overflow_policy: QueueOverflowPolicy,
	pub min_severity: AuditSeverity,
	pub tracing_sink: bool,
	pub file_path: Option<PathBuf>,
}

impl Default for AuditConfig {
	fn default() -> Self {
		Self {
			enabled: true,
			queue_capacity: DEFAULT_QUEUE_CAPACITY,
			queue_overflow_policy: QueueOverflowPolicy::default(),
			min_severity: AuditSeverity::default(),
			tracing_sink: true,
			file_path: None,
		}
	}
}
