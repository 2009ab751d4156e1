// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Permission matching.
//!
//! Permissions are colon-delimited strings such as `project:settings:write`.
//! A granted entry matches a required permission when it is:
//!
//! - identical (case-sensitive)
//! - the universal grant [`UNIVERSAL_PERMISSION`] (`*:*`)
//! - a trailing wildcard `a:b:*` whose prefix `a:b` covers the required
//!   permission segment-wise (`project:*` covers `project:read` and
//!   `project:settings:write`, never `projects:read`)
//!
//! A bare `*` has no special meaning here; only policy action lists treat it
//! as "any action".

/// Matches every permission. Reserved for elevated roles.
pub const UNIVERSAL_PERMISSION: &str = "*:*";

const WILDCARD_SUFFIX: &str = ":*";

/// Returns true if any entry of `granted` covers `required`.
///
/// Total: an empty set or no covering entry is `false`, never an error.
pub fn matches<S: AsRef<str>>(granted: &[S], required: &str) -> bool {
	granted
		.iter()
		.any(|entry| entry_matches(entry.as_ref(), required))
}

/// Returns true if a single granted entry covers `required`.
pub fn entry_matches(granted: &str, required: &str) -> bool {
	if granted == required || granted == UNIVERSAL_PERMISSION {
		return true;
	}

	match granted.strip_suffix(WILDCARD_SUFFIX) {
		Some(prefix) => match required.strip_prefix(prefix) {
			Some("") => true,
			Some(rest) => rest.starts_with(':'),
			None => false,
		},
		None => false,
	}
}
