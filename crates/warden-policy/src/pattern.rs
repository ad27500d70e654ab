// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Anchored pattern matching for policy subjects, resources and actions.
//!
//! A pattern is a string made of literal text, `<...>` groups and `*` globs:
//!
//! - Literal text must match exactly (case-sensitive).
//! - `<...>` encloses a regular expression, so `<peter|stan>` matches either name
//!   and `<.*>` matches anything. Groups may nest (`<a<b>c>` is one group).
//! - `*` outside a group matches any run of characters, including none.
//!
//! The whole value must match; `article` does not match `art`. A pattern that
//! fails to compile matches nothing.

use regex::Regex;
use tracing::debug;

use crate::error::PatternError;

const GROUP_OPEN: char = '<';
const GROUP_CLOSE: char = '>';
const GLOB: char = '*';

/// A compiled policy pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
	source: String,
	matcher: Matcher,
}

#[derive(Debug, Clone)]
enum Matcher {
	Literal,
	Regex(Regex),
}

impl Pattern {
	/// Compiles a pattern.
	pub fn parse(source: &str) -> Result<Self, PatternError> {
		if !source.contains(GROUP_OPEN) && !source.contains(GLOB) {
			return Ok(Self {
				source: source.to_string(),
				matcher: Matcher::Literal,
			});
		}

		let expr = to_regex(source)?;
		let regex = Regex::new(&expr).map_err(|e| PatternError::InvalidRegex {
			pattern: source.to_string(),
			message: e.to_string(),
		})?;

		Ok(Self {
			source: source.to_string(),
			matcher: Matcher::Regex(regex),
		})
	}

	/// The pattern as written in the policy.
	pub fn as_str(&self) -> &str {
		&self.source
	}

	/// Returns true if the whole of `value` matches this pattern.
	pub fn is_match(&self, value: &str) -> bool {
		match &self.matcher {
			Matcher::Literal => self.source == value,
			Matcher::Regex(regex) => regex.is_match(value),
		}
	}
}

/// The compiled form of one pattern list (a policy's subjects, resources or
/// actions), remembering the source strings it was built from.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
	sources: Vec<String>,
	patterns: Vec<Pattern>,
}

impl PatternSet {
	/// Compiles every pattern, failing on the first invalid one.
	pub fn parse(sources: &[String]) -> Result<Self, PatternError> {
		let patterns = sources
			.iter()
			.map(|s| Pattern::parse(s))
			.collect::<Result<Vec<_>, _>>()?;
		Ok(Self {
			sources: sources.to_vec(),
			patterns,
		})
	}

	/// Compiles every pattern, leaving out the ones that fail so they match
	/// nothing.
	pub fn parse_lossy(sources: &[String]) -> Self {
		let patterns = sources
			.iter()
			.filter_map(|s| match Pattern::parse(s) {
				Ok(p) => Some(p),
				Err(e) => {
					debug!(pattern = %s, error = %e, "ignoring invalid pattern");
					None
				}
			})
			.collect();
		Self {
			sources: sources.to_vec(),
			patterns,
		}
	}

	/// Returns true if this set was compiled from exactly `sources`.
	pub fn is_compiled_from(&self, sources: &[String]) -> bool {
		self.sources == sources
	}

	/// Returns true if any pattern matches any of `values`.
	pub fn matches_any<'v, V>(&self, values: V) -> bool
	where
		V: IntoIterator<Item = &'v str> + Clone,
	{
		self
			.patterns
			.iter()
			.any(|p| values.clone().into_iter().any(|v| p.is_match(v)))
	}
}

fn to_regex(source: &str) -> Result<String, PatternError> {
	let mut out = String::with_capacity(source.len() + 8);
	out.push('^');

	let mut depth = 0usize;
	let mut group_start = 0usize;
	let mut literal = String::new();

	for (i, c) in source.char_indices() {
		match c {
			GROUP_OPEN => {
				if depth == 0 {
					push_literal(&mut out, &literal);
					literal.clear();
					group_start = i + c.len_utf8();
				}
				depth += 1;
			}
			GROUP_CLOSE if depth > 0 => {
				depth -= 1;
				if depth == 0 {
					out.push_str("(?:");
					out.push_str(&source[group_start..i]);
					out.push(')');
				}
			}
			_ if depth == 0 => literal.push(c),
			_ => {}
		}
	}

	if depth != 0 {
		return Err(PatternError::Unbalanced(source.to_string()));
	}

	push_literal(&mut out, &literal);
	out.push('$');
	Ok(out)
}

fn push_literal(out: &mut String, literal: &str) {
	let mut parts = literal.split(GLOB);
	if let Some(first) = parts.next() {
		out.push_str(&regex::escape(first));
	}
	for part in parts {
		out.push_str(".*");
		out.push_str(&regex::escape(part));
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn matches(pattern: &str, value: &str) -> bool {
		Pattern::parse(pattern).is_ok_and(|p| p.is_match(value))
	}

	mod literal {
		use super::*;

		#[test]
		fn exact_match_only() {
			assert!(matches("article", "article"));
			assert!(!matches("article", "articles"));
			assert!(!matches("article", "art"));
		}

		#[test]
		fn case_sensitive() {
			assert!(!matches("Article", "article"));
		}

		#[test]
		fn regex_metacharacters_are_literal() {
			assert!(matches("a.b", "a.b"));
			assert!(!matches("a.b", "axb"));
			assert!(matches("resources:a+b", "resources:a+b"));
		}

		#[test]
		fn stray_close_is_literal() {
			assert!(matches("a>b", "a>b"));
		}
	}

	mod groups {
		use super::*;

		#[test]
		fn enumeration_matches_members() {
			assert!(matches("<peter|stan>", "stan"));
			assert!(matches("<peter|stan>", "peter"));
			assert!(!matches("<peter|stan>", "john"));
		}

		#[test]
		fn enumeration_is_anchored() {
			assert!(matches("<article|user>", "article"));
			assert!(!matches("<article|user>", "articles"));
			assert!(!matches("<article|user>", "my-user"));
		}

		#[test]
		fn group_with_literal_prefix() {
			assert!(matches("resources:articles:<.*>", "resources:articles:42"));
			assert!(!matches("resources:articles:<.*>", "resources:users:42"));
		}

		#[test]
		fn literal_text_around_group_is_escaped() {
			assert!(matches("a.<b|c>", "a.b"));
			assert!(!matches("a.<b|c>", "axb"));
		}

		#[test]
		fn nested_delimiters_form_one_group() {
			assert!(matches("<(?P<id>[0-9]+)>", "123"));
			assert!(!matches("<(?P<id>[0-9]+)>", "abc"));
		}

		#[test]
		fn unbalanced_group_never_matches() {
			assert!(matches!(
				Pattern::parse("<peter"),
				Err(PatternError::Unbalanced(_))
			));
			assert!(!matches("<peter", "<peter"));
			assert!(!matches("<peter", "peter"));
		}

		#[test]
		fn invalid_regex_never_matches() {
			assert!(matches!(
				Pattern::parse("<[a-z>"),
				Err(PatternError::InvalidRegex { .. })
			));
			assert!(!matches("<[a-z>", "a"));
		}
	}

	mod globs {
		use super::*;

		#[test]
		fn star_matches_any_run() {
			assert!(matches("articles:*", "articles:1"));
			assert!(matches("articles:*", "articles:"));
			assert!(matches("articles:*", "articles:1:comments"));
			assert!(!matches("articles:*", "users:1"));
		}

		#[test]
		fn star_in_middle() {
			assert!(matches("a*z", "abcz"));
			assert!(matches("a*z", "az"));
			assert!(!matches("a*z", "abc"));
		}

		#[test]
		fn lone_star_matches_everything() {
			assert!(matches("*", ""));
			assert!(matches("*", "anything at all"));
		}

		#[test]
		fn star_inside_group_is_regex() {
			assert!(matches("<a*>", "aaa"));
			assert!(matches("<a*>", ""));
			assert!(!matches("<a*>", "b"));
		}
	}

	mod sets {
		use super::*;

		fn sources(items: &[&str]) -> Vec<String> {
			items.iter().map(|s| s.to_string()).collect()
		}

		#[test]
		fn matches_any_checks_every_pair() {
			let set = PatternSet::parse(&sources(&["<admin|ops>", "peter"])).unwrap();
			assert!(set.matches_any(["john", "ops"]));
			assert!(set.matches_any(["peter"]));
			assert!(!set.matches_any(["john", "stan"]));
			assert!(!PatternSet::default().matches_any(["peter"]));
		}

		#[test]
		fn strict_parse_rejects_invalid_member() {
			let result = PatternSet::parse(&sources(&["peter", "<broken"]));
			assert!(matches!(result, Err(PatternError::Unbalanced(_))));
		}

		#[test]
		fn lossy_parse_skips_invalid_member() {
			let set = PatternSet::parse_lossy(&sources(&["<broken", "peter"]));
			assert!(set.matches_any(["peter"]));
			assert!(!set.matches_any(["<broken"]));
		}

		#[test]
		fn remembers_its_sources() {
			let list = sources(&["a", "<b|c>"]);
			let set = PatternSet::parse(&list).unwrap();
			assert!(set.is_compiled_from(&list));
			assert!(!set.is_compiled_from(&sources(&["a"])));
		}
	}

	mod property_tests {
		use super::*;
		use proptest::prelude::*;

		proptest! {
			#[test]
			fn literal_patterns_match_only_themselves(
				pattern in "[a-zA-Z0-9:._/-]{1,24}",
				value in "[a-zA-Z0-9:._/-]{0,24}",
			) {
				prop_assert_eq!(matches(&pattern, &value), pattern == value);
			}

			#[test]
			fn enumeration_matches_each_member(
				members in proptest::collection::vec("[a-z]{1,8}", 1..6),
				pick in any::<prop::sample::Index>(),
			) {
				let pattern = format!("<{}>", members.join("|"));
				let chosen = pick.get(&members);
				prop_assert!(matches(&pattern, chosen));
			}

			#[test]
			fn prefix_glob_matches_any_suffix(
				prefix in "[a-z:]{1,12}",
				suffix in "[a-z0-9:]{0,12}",
			) {
				let pattern = format!("{prefix}*");
				let value = format!("{prefix}{suffix}");
				prop_assert!(matches(&pattern, &value));
			}
		}
	}
}
