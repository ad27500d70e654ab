// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Audit trail for Warden authorization decisions.
//!
//! Every decision the firewall makes becomes an [`AuditRecord`]. Records are
//! handed to an [`AuditLogger`]; the production logger is [`AuditService`],
//! which queues records and publishes them to one or more [`AuditSink`]s
//! off the request path.

pub mod error;
pub mod event;
pub mod filter;
pub mod logger;
pub mod pipeline;
pub mod sink;

pub use error::{AuditError, AuditResult, AuditSinkError};
pub use event::{AuditRecord, AuditSeverity};
pub use filter::AuditFilter;
pub use logger::{AuditLogger, NoopAuditLogger};
pub use pipeline::AuditService;
pub use sink::file::FileAuditSink;
pub use sink::memory::MemoryAuditLog;
pub use sink::tracing::TracingAuditSink;
pub use sink::AuditSink;

pub use warden_config::{AuditConfig, QueueOverflowPolicy};
