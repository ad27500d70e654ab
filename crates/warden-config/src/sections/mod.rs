// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections for Warden.

pub mod audit;
pub mod authenticators;
pub mod logging;
pub mod store;

pub use audit::{AuditConfig, AuditConfigLayer, AuditSeverity, QueueOverflowPolicy};
pub use authenticators::{
	AuthenticatorsConfig, AuthenticatorsConfigLayer, ClientCredentialsConfig,
	ClientCredentialsConfigLayer, IntrospectionConfig, IntrospectionConfigLayer,
};
pub use logging::{LogFormat, LoggingConfig, LoggingConfigLayer};
pub use store::{StoreConfig, StoreConfigLayer};
