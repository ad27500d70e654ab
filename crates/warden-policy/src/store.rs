// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;

use crate::error::StoreError;
use crate::policy::Policy;
use crate::request::AccessRequest;

/// Read access to policies for decision making.
///
/// Implementations may narrow the result (for example by indexing on the
/// subject set) but must never omit a policy that could match: the engine
/// re-checks every candidate, so returning too many is safe and returning too
/// few is not.
#[async_trait]
pub trait PolicyStore: Send + Sync {
	/// `subjects` is the requesting subject followed by its role ids.
	async fn find_candidates(
		&self,
		request: &AccessRequest,
		subjects: &[String],
	) -> Result<Vec<Policy>, StoreError>;
}
