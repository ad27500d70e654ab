// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use async_trait::async_trait;
use tracing::Level;

use super::{AuditSink, AuditSinkError};
use crate::event::{AuditRecord, AuditSeverity};
use crate::filter::AuditFilter;

/// Target of every event emitted by [`TracingAuditSink`].
pub const AUDIT_TARGET: &str = "warden_audit";

pub struct TracingAuditSink {
	filter: AuditFilter,
}

impl TracingAuditSink {
	pub fn new(filter: AuditFilter) -> Self {
		Self { filter }
	}
}

pub fn severity_to_level(severity: AuditSeverity) -> Level {
	match severity {
		AuditSeverity::Debug => Level::DEBUG,
		AuditSeverity::Info | AuditSeverity::Notice => Level::INFO,
		AuditSeverity::Warning => Level::WARN,
		AuditSeverity::Error | AuditSeverity::Critical => Level::ERROR,
	}
}

// `tracing` needs the level as a constant, so each branch expands the same field list.
macro_rules! audit_event {
	($level:expr, $record:expr) => {{
		let r = $record;
		let roles = r.roles.iter().cloned().collect::<Vec<_>>().join(",");
		tracing::event!(
			target: AUDIT_TARGET,
			$level,
			id = %r.id,
			timestamp = %r.timestamp.to_rfc3339(),
			severity = %r.severity,
			credential_kind = %r.credential_kind,
			subject = %r.subject,
			resource = %r.request.resource,
			action = %r.request.action,
			roles = %roles,
			allowed = r.allowed,
			reason = %r.reason,
			matched_policy_id = r.matched_policy_id.as_deref(),
			"authorization decision"
		);
	}};
}

#[async_trait]
impl AuditSink for TracingAuditSink {
	fn name(&self) -> &str {
		"tracing"
	}

	fn filter(&self) -> &AuditFilter {
		&self.filter
	}

	async fn publish(&self, record: Arc<AuditRecord>) -> Result<(), AuditSinkError> {
		let level = severity_to_level(record.severity);
		if level == Level::ERROR {
			audit_event!(Level::ERROR, &*record);
		} else if level == Level::WARN {
			audit_event!(Level::WARN, &*record);
		} else if level == Level::INFO {
			audit_event!(Level::INFO, &*record);
		} else {
			audit_event!(Level::DEBUG, &*record);
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::BTreeSet;
	use std::io;
	use std::sync::Mutex;
	use warden_policy::{AccessRequest, Decision, Policy};

	#[derive(Clone, Default)]
	struct Captured(Arc<Mutex<Vec<u8>>>);

	impl io::Write for Captured {
		fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
			self.0.lock().unwrap().extend_from_slice(buf);
			Ok(buf.len())
		}

		fn flush(&mut self) -> io::Result<()> {
			Ok(())
		}
	}

	impl Captured {
		fn text(&self) -> String {
			String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
		}
	}

	async fn emitted_for(decision: Decision) -> String {
		let captured = Captured::default();
		let writer = captured.clone();
		let subscriber = tracing_subscriber::fmt()
			.with_writer(move || writer.clone())
			.with_max_level(Level::TRACE)
			.with_ansi(false)
			.finish();
		let _guard = tracing::subscriber::set_default(subscriber);

		let record = AuditRecord::new(
			"subjects",
			&AccessRequest::new("peter", "article", "view"),
			&BTreeSet::new(),
			&decision,
		);
		TracingAuditSink::new(AuditFilter::default())
			.publish(Arc::new(record))
			.await
			.unwrap();
		captured.text()
	}

	#[test]
	fn severity_to_level_mappings() {
		assert_eq!(severity_to_level(AuditSeverity::Debug), Level::DEBUG);
		assert_eq!(severity_to_level(AuditSeverity::Info), Level::INFO);
		assert_eq!(severity_to_level(AuditSeverity::Notice), Level::INFO);
		assert_eq!(severity_to_level(AuditSeverity::Warning), Level::WARN);
		assert_eq!(severity_to_level(AuditSeverity::Error), Level::ERROR);
		assert_eq!(severity_to_level(AuditSeverity::Critical), Level::ERROR);
	}

	#[test]
	fn tracing_sink_name_and_filter() {
		let sink = TracingAuditSink::new(AuditFilter::new(AuditSeverity::Warning));
		assert_eq!(sink.name(), "tracing");
		assert_eq!(sink.filter().min_severity, AuditSeverity::Warning);
	}

	#[tokio::test]
	async fn publish_emits_at_mapped_level() {
		let deny = Policy::deny("block").with_subjects(["*"]).with_resources(["*"]).with_actions(["*"]);
		let warned = emitted_for(Decision::denied_by(&deny)).await;
		assert!(warned.contains("WARN"), "{warned}");
		assert!(warned.contains("authorization decision"));
		assert!(warned.contains("warden_audit"));

		let notice = emitted_for(Decision::no_match()).await;
		assert!(notice.contains("INFO"), "{notice}");
		assert!(notice.contains("severity=notice"));
	}

	#[tokio::test]
	async fn publish_never_fails() {
		let sink = TracingAuditSink::new(AuditFilter::default());
		let record = AuditRecord::new(
			"subjects",
			&AccessRequest::new("s", "r", "a"),
			&BTreeSet::new(),
			&Decision::no_match(),
		);
		assert!(sink.publish(Arc::new(record)).await.is_ok());
	}
}
