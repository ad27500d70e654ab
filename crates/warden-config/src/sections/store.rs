// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Seed files for the in-memory policy and role stores.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StoreConfigLayer {
	/// JSON array of policies.
	pub policies_path: Option<PathBuf>,
	/// JSON array of roles.
	pub roles_path: Option<PathBuf>,
}

impl StoreConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.policies_path.is_some() {
			self.policies_path = other.policies_path;
		}
		if other.roles_path.is_some() {
			self.roles_path = other.roles_path;
		}
	}

	pub fn finalize(self) -> StoreConfig {
		StoreConfig {
			policies_path: self.policies_path,
			roles_path: self.roles_path,
		}
	}
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StoreConfig {
	pub policies_path: Option<PathBuf>,
	pub roles_path: Option<PathBuf>,
}
