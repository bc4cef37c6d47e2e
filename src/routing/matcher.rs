//! Path matching logic.
//!
//! # Responsibilities
//! - Match raw request paths against a prefix (case-sensitive)
//! - Match normalized paths exactly (route table semantics)
//!
//! # Design Decisions
//! - Prefix matching is a plain string comparison: `/media` also matches
//!   `/media-assets`, the same as the dev-server proxy context it mirrors
//! - No regex to guarantee O(n) matching

use crate::routing::normalize_path;

/// Trait for matching request paths against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the path matches this condition.
    fn matches(&self, path: &str) -> bool;
}

/// Matches the request path prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl Matcher for PathPrefixMatcher {
    fn matches(&self, path: &str) -> bool {
        path.starts_with(&self.prefix)
    }
}

/// Matches one path after normalization, so `/Login/` matches `/login`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExactPathMatcher {
    path: String,
}

impl ExactPathMatcher {
    pub fn new(path: &str) -> Self {
        Self {
            path: normalize_path(path),
        }
    }
}

impl Matcher for ExactPathMatcher {
    fn matches(&self, path: &str) -> bool {
        normalize_path(path) == self.path
    }
}
