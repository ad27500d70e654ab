// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Policy conditions evaluated against request context.
//!
//! A policy stores its conditions by name. When the policy is evaluated, the
//! condition registered under `name` is checked against `context[name]`. Missing
//! context, a value of the wrong JSON type, or an unparsable condition parameter
//! all make the condition fail.
//!
//! Conditions serialize in the Ladon shape, with the kind tag next to its
//! parameters:
//!
//! ```json
//! { "type": "CIDRCondition", "options": { "cidr": "192.168.0.0/16" } }
//! ```

use std::collections::BTreeMap;
use std::net::IpAddr;

use ipnet::IpNet;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::trace;

use crate::request::AccessRequest;

/// Named conditions attached to a policy.
pub type Conditions = BTreeMap<String, Condition>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "options")]
pub enum Condition {
	/// The context value is an IP address inside `cidr`.
	#[serde(rename = "CIDRCondition")]
	Cidr { cidr: String },

	/// The context value equals the authenticated subject.
	#[serde(rename = "EqualsSubjectCondition")]
	EqualsSubject {},

	/// The context value is a string equal to `equals`.
	#[serde(rename = "StringEqualCondition")]
	StringEqual { equals: String },

	/// The context value is a string fully matched by the regex `matches`.
	#[serde(rename = "StringMatchCondition")]
	StringMatch { matches: String },

	/// The context value is a list of two-element string lists, each pair equal.
	#[serde(rename = "StringPairsEqualCondition")]
	StringPairsEqual {},

	/// The context value is a boolean equal to `value`.
	#[serde(rename = "BooleanCondition")]
	Boolean { value: bool },
}

impl Condition {
	pub fn cidr(cidr: impl Into<String>) -> Self {
		Self::Cidr { cidr: cidr.into() }
	}

	pub fn equals_subject() -> Self {
		Self::EqualsSubject {}
	}

	pub fn string_equal(equals: impl Into<String>) -> Self {
		Self::StringEqual {
			equals: equals.into(),
		}
	}

	pub fn string_match(matches: impl Into<String>) -> Self {
		Self::StringMatch {
			matches: matches.into(),
		}
	}

	/// The Ladon type tag for this condition.
	pub fn kind(&self) -> &'static str {
		match self {
			Self::Cidr { .. } => "CIDRCondition",
			Self::EqualsSubject {} => "EqualsSubjectCondition",
			Self::StringEqual { .. } => "StringEqualCondition",
			Self::StringMatch { .. } => "StringMatchCondition",
			Self::StringPairsEqual {} => "StringPairsEqualCondition",
			Self::Boolean { .. } => "BooleanCondition",
		}
	}

	/// Evaluates the condition against one context value.
	///
	/// `value` is `None` when the request context has no entry for the
	/// condition's name; every condition fails in that case.
	pub fn fulfills(&self, value: Option<&Value>, request: &AccessRequest) -> bool {
		let Some(value) = value else {
			trace!(kind = self.kind(), "condition has no context value");
			return false;
		};

		match self {
			Self::Cidr { cidr } => cidr_contains(cidr, value),
			Self::EqualsSubject {} => value.as_str() == Some(request.subject.as_str()),
			Self::StringEqual { equals } => value.as_str() == Some(equals.as_str()),
			Self::StringMatch { matches } => string_matches(matches, value),
			Self::StringPairsEqual {} => pairs_equal(value),
			Self::Boolean { value: expected } => value.as_bool() == Some(*expected),
		}
	}
}

fn cidr_contains(cidr: &str, value: &Value) -> bool {
	let Ok(net) = cidr.parse::<IpNet>() else {
		trace!(cidr, "condition has invalid network");
		return false;
	};
	value
		.as_str()
		.and_then(|s| s.parse::<IpAddr>().ok())
		.is_some_and(|ip| net.contains(&ip))
}

fn string_matches(expr: &str, value: &Value) -> bool {
	let Some(s) = value.as_str() else {
		return false;
	};
	match Regex::new(&format!("^(?:{expr})$")) {
		Ok(re) => re.is_match(s),
		Err(e) => {
			trace!(expr, error = %e, "condition has invalid regex");
			false
		}
	}
}

fn pairs_equal(value: &Value) -> bool {
	let Some(pairs) = value.as_array() else {
		return false;
	};
	pairs.iter().all(|pair| match pair.as_array().map(Vec::as_slice) {
		Some([a, b]) => matches!((a.as_str(), b.as_str()), (Some(a), Some(b)) if a == b),
		_ => false,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn request(subject: &str) -> AccessRequest {
		AccessRequest::new(subject, "article", "view")
	}

	mod cidr {
		use super::*;

		#[test]
		fn contains_address_in_network() {
			let c = Condition::cidr("192.168.0.0/16");
			assert!(c.fulfills(Some(&json!("192.168.4.20")), &request("peter")));
			assert!(!c.fulfills(Some(&json!("10.0.0.1")), &request("peter")));
		}

		#[test]
		fn supports_ipv6() {
			let c = Condition::cidr("2001:db8::/32");
			assert!(c.fulfills(Some(&json!("2001:db8::1")), &request("peter")));
			assert!(!c.fulfills(Some(&json!("2001:db9::1")), &request("peter")));
		}

		#[test]
		fn invalid_network_fails_closed() {
			let c = Condition::cidr("1234");
			assert!(!c.fulfills(Some(&json!("127.0.0.1")), &request("peter")));
		}

		#[test]
		fn non_address_value_fails() {
			let c = Condition::cidr("127.0.0.0/8");
			assert!(!c.fulfills(Some(&json!("localhost")), &request("peter")));
			assert!(!c.fulfills(Some(&json!(127)), &request("peter")));
		}
	}

	#[test]
	fn equals_subject_compares_with_request_subject() {
		let c = Condition::equals_subject();
		assert!(c.fulfills(Some(&json!("peter")), &request("peter")));
		assert!(!c.fulfills(Some(&json!("stan")), &request("peter")));
		assert!(!c.fulfills(Some(&json!(["peter"])), &request("peter")));
	}

	#[test]
	fn string_equal() {
		let c = Condition::string_equal("prod");
		assert!(c.fulfills(Some(&json!("prod")), &request("peter")));
		assert!(!c.fulfills(Some(&json!("Prod")), &request("peter")));
	}

	#[test]
	fn string_match_is_anchored() {
		let c = Condition::string_match("[0-9]+");
		assert!(c.fulfills(Some(&json!("1234")), &request("peter")));
		assert!(!c.fulfills(Some(&json!("12a34")), &request("peter")));
	}

	#[test]
	fn string_pairs_equal() {
		let c = Condition::StringPairsEqual {};
		assert!(c.fulfills(Some(&json!([["a", "a"], ["b", "b"]])), &request("peter")));
		assert!(c.fulfills(Some(&json!([])), &request("peter")));
		assert!(!c.fulfills(Some(&json!([["a", "b"]])), &request("peter")));
		assert!(!c.fulfills(Some(&json!([["a"]])), &request("peter")));
		assert!(!c.fulfills(Some(&json!("a")), &request("peter")));
	}

	#[test]
	fn boolean() {
		let c = Condition::Boolean { value: true };
		assert!(c.fulfills(Some(&json!(true)), &request("peter")));
		assert!(!c.fulfills(Some(&json!(false)), &request("peter")));
		assert!(!c.fulfills(Some(&json!("true")), &request("peter")));
	}

	#[test]
	fn missing_value_fails_for_every_kind() {
		let all = [
			Condition::cidr("0.0.0.0/0"),
			Condition::equals_subject(),
			Condition::string_equal(""),
			Condition::string_match(".*"),
			Condition::StringPairsEqual {},
			Condition::Boolean { value: false },
		];
		for c in all {
			assert!(!c.fulfills(None, &request("peter")), "{} should fail", c.kind());
		}
	}

	mod serde_shape {
		use super::*;

		#[test]
		fn serializes_with_type_and_options() {
			let value = serde_json::to_value(Condition::cidr("1234")).unwrap();
			assert_eq!(
				value,
				json!({ "type": "CIDRCondition", "options": { "cidr": "1234" } })
			);

			let value = serde_json::to_value(Condition::equals_subject()).unwrap();
			assert_eq!(
				value,
				json!({ "type": "EqualsSubjectCondition", "options": {} })
			);
		}

		#[test]
		fn deserializes_ladon_documents() {
			let c: Condition = serde_json::from_value(json!({
				"type": "StringEqualCondition",
				"options": { "equals": "the-value" }
			}))
			.unwrap();
			assert_eq!(c, Condition::string_equal("the-value"));
		}

		#[test]
		fn rejects_unknown_type() {
			let result: Result<Condition, _> = serde_json::from_value(json!({
				"type": "MoonPhaseCondition",
				"options": {}
			}));
			assert!(result.is_err());
		}
	}
}
