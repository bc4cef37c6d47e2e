//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path, query)
//!     → router.rs (route table lookup)
//!     → Return: Page, Redirect or NotFound
//!
//! Route Compilation (at startup and on reload):
//!     RouteConfig[]
//!     → Normalize paths (case, trailing slash)
//!     → Follow redirect chains to their final page
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Static paths only, exact lookup after normalization
//! - Redirect chains collapse to a single hop at compile time
//! - Explicit NotFound rather than silent default

pub mod matcher;
pub mod router;

pub use matcher::{ExactPathMatcher, Matcher, PathPrefixMatcher};
pub use router::{Resolution, RouteEntry, RouteTable, RouteTarget};

/// Error raised while compiling a route table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoutingError {
    #[error("path '{0}' is declared more than once")]
    DuplicatePath(String),

    #[error("route '{0}' has no page or redirect target")]
    MissingTarget(String),

    #[error("route '{from}' redirects to '{to}', which is not in the route table")]
    DanglingRedirect { from: String, to: String },

    #[error("redirect cycle starting at '{0}'")]
    RedirectCycle(String),
}

/// Canonical form of a path for table lookup.
///
/// Matching is case-insensitive and tolerates a single trailing slash, so
/// `/Login/` and `/login` share a key.
pub fn normalize_path(path: &str) -> String {
    let trimmed = match path.strip_suffix('/') {
        Some(rest) if !rest.is_empty() => rest,
        _ => path,
    };
    trimmed.to_lowercase()
}
