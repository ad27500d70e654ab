// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::AuditSinkError;
use crate::event::AuditRecord;
use crate::filter::AuditFilter;
use crate::sink::AuditSink;

/// Appends one JSON object per line. The file is opened on first publish.
pub struct FileAuditSink {
	path: PathBuf,
	filter: AuditFilter,
	file: Mutex<Option<File>>,
}

impl FileAuditSink {
	pub fn new(path: impl Into<PathBuf>, filter: AuditFilter) -> Self {
		Self {
			path: path.into(),
			filter,
			file: Mutex::new(None),
		}
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	async fn write_line(&self, line: &str) -> Result<(), AuditSinkError> {
		let mut guard = self.file.lock().await;
		if guard.is_none() {
			let file = OpenOptions::new()
				.create(true)
				.append(true)
				.open(&self.path)
				.await
				.map_err(|e| AuditSinkError::Transient(format!("failed to open file: {e}")))?;
			*guard = Some(file);
		}

		let file = guard
			.as_mut()
			.ok_or_else(|| AuditSinkError::Permanent("file handle not initialized".to_string()))?;

		file
			.write_all(line.as_bytes())
			.await
			.map_err(|e| AuditSinkError::Transient(format!("failed to write to file: {e}")))?;

		file
			.flush()
			.await
			.map_err(|e| AuditSinkError::Transient(format!("failed to flush file: {e}")))?;

		Ok(())
	}
}

#[async_trait]
impl AuditSink for FileAuditSink {
	fn name(&self) -> &str {
		"file"
	}

	fn filter(&self) -> &AuditFilter {
		&self.filter
	}

	async fn publish(&self, record: Arc<AuditRecord>) -> Result<(), AuditSinkError> {
		let line = format_json_line(&record)?;
		self.write_line(&line).await
	}
}

pub fn format_json_line(record: &AuditRecord) -> Result<String, AuditSinkError> {
	let json = serde_json::to_string(record)
		.map_err(|e| AuditSinkError::Permanent(format!("JSON serialization failed: {e}")))?;
	Ok(format!("{json}\n"))
}
