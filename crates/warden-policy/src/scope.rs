// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! OAuth2 scope comparison strategies.
//!
//! Scopes are dot-delimited strings such as `photos.read`. A strategy decides
//! whether a set of granted scopes satisfies one required scope:
//!
//! | strategy     | granted      | satisfies required                          |
//! |--------------|--------------|---------------------------------------------|
//! | `exact`      | `photos`     | `photos` only                               |
//! | `hierarchic` | `photos`     | `photos`, `photos.read`, `photos.read.own`  |
//! | `wildcard`   | `photos.*`   | `photos.read`, `photos.read.own`            |
//! | `wildcard`   | `*.read`     | `photos.read`, not `a.b.read`               |
//! | `wildcard`   | `*`          | any non-empty scope                         |
//!
//! Under `wildcard`, a `*` segment stands for exactly one non-empty segment,
//! except in last position where it stands for one or more.
//!
//! An empty required scope is always satisfied; an empty granted set satisfies
//! nothing else.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

const SEPARATOR: char = '.';
const WILDCARD: &str = "*";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeStrategy {
	Exact,
	Hierarchic,
	#[default]
	Wildcard,
}

impl ScopeStrategy {
	/// Returns true if any granted scope satisfies `required`.
	pub fn satisfies<I>(&self, required: &str, granted: I) -> bool
	where
		I: IntoIterator,
		I::Item: AsRef<str>,
	{
		if required.is_empty() {
			return true;
		}

		granted.into_iter().any(|g| {
			let g = g.as_ref();
			match self {
				ScopeStrategy::Exact => g == required,
				ScopeStrategy::Hierarchic => hierarchic_matches(g, required),
				ScopeStrategy::Wildcard => wildcard_matches(g, required),
			}
		})
	}

	/// Parses a configured strategy name, falling back to [`ScopeStrategy::Wildcard`]
	/// for anything unrecognised.
	pub fn from_name_or_default(name: &str) -> Self {
		name.parse().unwrap_or_else(|_| {
			warn!(strategy = name, "unknown scope strategy, using wildcard");
			ScopeStrategy::Wildcard
		})
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			ScopeStrategy::Exact => "exact",
			ScopeStrategy::Hierarchic => "hierarchic",
			ScopeStrategy::Wildcard => "wildcard",
		}
	}
}

impl FromStr for ScopeStrategy {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"exact" => Ok(ScopeStrategy::Exact),
			"hierarchic" => Ok(ScopeStrategy::Hierarchic),
			"wildcard" => Ok(ScopeStrategy::Wildcard),
			other => Err(format!("unknown scope strategy '{other}'")),
		}
	}
}

impl std::fmt::Display for ScopeStrategy {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

fn hierarchic_matches(granted: &str, required: &str) -> bool {
	if granted == required {
		return true;
	}

	let granted: Vec<&str> = granted.split(SEPARATOR).collect();
	let required: Vec<&str> = required.split(SEPARATOR).collect();
	if granted.len() > required.len() {
		return false;
	}

	granted.iter().zip(&required).all(|(g, r)| g == r)
}

fn wildcard_matches(granted: &str, required: &str) -> bool {
	if granted == required {
		return true;
	}
	if !granted.contains(WILDCARD) {
		return false;
	}

	let granted: Vec<&str> = granted.split(SEPARATOR).collect();
	let required: Vec<&str> = required.split(SEPARATOR).collect();
	let last = granted.len() - 1;

	for (i, g) in granted.iter().enumerate() {
		let Some(r) = required.get(i) else {
			return false;
		};

		if *g == WILDCARD {
			if i == last {
				return required[i..].iter().all(|s| !s.is_empty());
			}
			if r.is_empty() {
				return false;
			}
			continue;
		}

		if g.is_empty() || g != r {
			return false;
		}
	}

	granted.len() == required.len()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn granted(scopes: &[&str]) -> Vec<String> {
		scopes.iter().map(|s| s.to_string()).collect()
	}

	mod exact {
		use super::*;

		#[test]
		fn requires_membership() {
			let s = ScopeStrategy::Exact;
			assert!(s.satisfies("photos", granted(&["photos"])));
			assert!(!s.satisfies("photos.read", granted(&["photos"])));
			assert!(!s.satisfies("photos", granted(&["photos.read"])));
		}

		#[test]
		fn wildcard_is_literal() {
			assert!(!ScopeStrategy::Exact.satisfies("photos", granted(&["*"])));
		}
	}

	mod hierarchic {
		use super::*;

		#[test]
		fn parent_satisfies_child() {
			let s = ScopeStrategy::Hierarchic;
			assert!(s.satisfies("photos.read", granted(&["photos"])));
			assert!(s.satisfies("photos.read.own", granted(&["photos"])));
			assert!(s.satisfies("photos.read.own", granted(&["photos.read"])));
		}

		#[test]
		fn child_does_not_satisfy_parent() {
			assert!(!ScopeStrategy::Hierarchic.satisfies("photos", granted(&["photos.read"])));
		}

		#[test]
		fn prefix_must_end_on_segment_boundary() {
			assert!(!ScopeStrategy::Hierarchic.satisfies("photosets.read", granted(&["photos"])));
		}

		#[test]
		fn siblings_do_not_match() {
			assert!(!ScopeStrategy::Hierarchic.satisfies("photos.write", granted(&["photos.read"])));
		}
	}

	mod wildcard {
		use super::*;

		#[test]
		fn lone_star_satisfies_anything() {
			let s = ScopeStrategy::Wildcard;
			assert!(s.satisfies("photos", granted(&["*"])));
			assert!(s.satisfies("photos.read", granted(&["*"])));
			assert!(s.satisfies("a.b.c.d", granted(&["*"])));
		}

		#[test]
		fn trailing_star_covers_one_or_more_segments() {
			let s = ScopeStrategy::Wildcard;
			assert!(s.satisfies("photos.read", granted(&["photos.*"])));
			assert!(s.satisfies("photos.read.own", granted(&["photos.*"])));
			assert!(!s.satisfies("photos", granted(&["photos.*"])));
			assert!(!s.satisfies("videos.read", granted(&["photos.*"])));
		}

		#[test]
		fn inner_star_covers_exactly_one_segment() {
			let s = ScopeStrategy::Wildcard;
			assert!(s.satisfies("photos.read", granted(&["*.read"])));
			assert!(!s.satisfies("a.b.read", granted(&["*.read"])));
			assert!(s.satisfies("a.x.c", granted(&["a.*.c"])));
			assert!(!s.satisfies("a.x.y.c", granted(&["a.*.c"])));
		}

		#[test]
		fn star_never_matches_empty_segment() {
			let s = ScopeStrategy::Wildcard;
			assert!(!s.satisfies("photos.", granted(&["photos.*"])));
			assert!(!s.satisfies(".read", granted(&["*.read"])));
		}

		#[test]
		fn partial_segment_star_is_literal() {
			let s = ScopeStrategy::Wildcard;
			assert!(!s.satisfies("photos.read", granted(&["photos.re*"])));
			assert!(s.satisfies("photos.re*", granted(&["photos.re*"])));
		}

		#[test]
		fn without_star_requires_equality() {
			let s = ScopeStrategy::Wildcard;
			assert!(s.satisfies("photos", granted(&["photos"])));
			assert!(!s.satisfies("photos.read", granted(&["photos"])));
		}
	}

	mod edge_cases {
		use super::*;

		#[test]
		fn empty_required_is_always_satisfied() {
			for s in [ScopeStrategy::Exact, ScopeStrategy::Hierarchic, ScopeStrategy::Wildcard] {
				assert!(s.satisfies("", Vec::<String>::new()));
			}
		}

		#[test]
		fn empty_granted_never_satisfies() {
			for s in [ScopeStrategy::Exact, ScopeStrategy::Hierarchic, ScopeStrategy::Wildcard] {
				assert!(!s.satisfies("photos", Vec::<String>::new()));
			}
		}

		#[test]
		fn any_granted_scope_may_satisfy() {
			assert!(ScopeStrategy::Exact.satisfies("b", granted(&["a", "b", "c"])));
		}
	}

	mod parsing {
		use super::*;

		#[test]
		fn parses_known_names() {
			assert_eq!("exact".parse(), Ok(ScopeStrategy::Exact));
			assert_eq!("Hierarchic".parse(), Ok(ScopeStrategy::Hierarchic));
			assert_eq!(" wildcard ".parse(), Ok(ScopeStrategy::Wildcard));
		}

		#[test]
		fn unknown_name_falls_back_to_wildcard() {
			assert_eq!(ScopeStrategy::from_name_or_default("glob"), ScopeStrategy::Wildcard);
			assert_eq!(ScopeStrategy::from_name_or_default(""), ScopeStrategy::Wildcard);
			assert_eq!(ScopeStrategy::default(), ScopeStrategy::Wildcard);
		}

		#[test]
		fn serde_uses_lowercase_names() {
			let json = serde_json::to_string(&ScopeStrategy::Hierarchic).unwrap();
			assert_eq!(json, "\"hierarchic\"");
		}
	}

	mod property_tests {
		use super::*;
		use proptest::prelude::*;

		proptest! {
			#[test]
			fn every_strategy_accepts_exact_grants(scope in "[a-z]{1,8}(\\.[a-z]{1,8}){0,3}") {
				for s in [ScopeStrategy::Exact, ScopeStrategy::Hierarchic, ScopeStrategy::Wildcard] {
					prop_assert!(s.satisfies(&scope, [scope.as_str()]));
				}
			}

			#[test]
			fn hierarchic_parent_satisfies_any_descendant(
				parent in "[a-z]{1,8}",
				rest in "(\\.[a-z]{1,8}){1,3}",
			) {
				let required = format!("{parent}{rest}");
				prop_assert!(ScopeStrategy::Hierarchic.satisfies(&required, [parent.as_str()]));
				prop_assert!(!ScopeStrategy::Exact.satisfies(&required, [parent.as_str()]));
			}
		}
	}
}
