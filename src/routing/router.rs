//! Route lookup.
//!
//! # Responsibilities
//! - Store compiled route entries
//! - Resolve a request path to a page, a redirect or an explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(1) lookup via HashMap on the normalized path
//! - Declared order kept only for introspection

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::config::RouteConfig;
use crate::pages::Page;
use crate::routing::{normalize_path, RoutingError};

/// What a route entry points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteTarget {
    Page(Page),
    Redirect(String),
}

/// A single entry of the route table, as declared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteEntry {
    pub path: String,
    pub target: RouteTarget,
}

/// Outcome of resolving a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Resolution {
    Page { page: Page },
    Redirect { location: String },
    NotFound,
}

/// Compiled target with redirect chains already followed.
#[derive(Debug, Clone)]
enum Compiled {
    Page(Page),
    Redirect {
        path: String,
        /// Query/fragment written into the redirect itself, if any.
        suffix: Option<String>,
    },
}

/// Immutable, compiled route table.
#[derive(Debug, Clone)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
    index: HashMap<String, Compiled>,
}

impl RouteTable {
    /// Compile a table from configuration entries.
    pub fn from_config(routes: &[RouteConfig]) -> Result<Self, RoutingError> {
        let entries = routes
            .iter()
            .map(|r| {
                let target = match (&r.page, &r.redirect) {
                    (Some(page), None) => RouteTarget::Page(*page),
                    (None, Some(to)) => RouteTarget::Redirect(to.clone()),
                    _ => return Err(RoutingError::MissingTarget(r.path.clone())),
                };
                Ok(RouteEntry {
                    path: r.path.clone(),
                    target,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::from_entries(entries)
    }

    /// Compile a table from declared entries.
    pub fn from_entries(entries: Vec<RouteEntry>) -> Result<Self, RoutingError> {
        let mut declared: HashMap<String, &RouteTarget> = HashMap::new();
        for entry in &entries {
            if declared.insert(normalize_path(&entry.path), &entry.target).is_some() {
                return Err(RoutingError::DuplicatePath(entry.path.clone()));
            }
        }

        let mut index = HashMap::with_capacity(entries.len());
        for entry in &entries {
            let compiled = match &entry.target {
                RouteTarget::Page(page) => Compiled::Page(*page),
                RouteTarget::Redirect(to) => follow_redirects(&entry.path, to, &declared)?,
            };
            index.insert(normalize_path(&entry.path), compiled);
        }

        Ok(Self { entries, index })
    }

    /// Resolve a request path. `query` is the raw query string without `?`.
    pub fn resolve(&self, path: &str, query: Option<&str>) -> Resolution {
        match self.index.get(&normalize_path(path)) {
            Some(Compiled::Page(page)) => Resolution::Page { page: *page },
            Some(Compiled::Redirect { path, suffix }) => {
                let location = match (suffix, query) {
                    (Some(suffix), _) => format!("{path}{suffix}"),
                    (None, Some(q)) if !q.is_empty() => format!("{path}?{q}"),
                    (None, _) => path.clone(),
                };
                Resolution::Redirect { location }
            }
            None => Resolution::NotFound,
        }
    }

    /// Entries in declared order.
    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Split a redirect target into its path and any `?query`/`#fragment` suffix.
fn split_target(target: &str) -> (&str, Option<&str>) {
    match target.find(['?', '#']) {
        Some(idx) => (&target[..idx], Some(&target[idx..])),
        None => (target, None),
    }
}

fn follow_redirects(
    from: &str,
    first: &str,
    declared: &HashMap<String, &RouteTarget>,
) -> Result<Compiled, RoutingError> {
    let mut visited = HashSet::new();
    visited.insert(normalize_path(from));

    let mut hop = first;
    let mut suffix: Option<String> = None;

    loop {
        let (path, hop_suffix) = split_target(hop);
        if let Some(s) = hop_suffix {
            suffix = Some(s.to_string());
        }

        let key = normalize_path(path);
        match declared.get(&key) {
            Some(RouteTarget::Page(_)) => {
                return Ok(Compiled::Redirect {
                    path: path.to_string(),
                    suffix,
                });
            }
            Some(RouteTarget::Redirect(next)) => {
                if !visited.insert(key) {
                    return Err(RoutingError::RedirectCycle(from.to_string()));
                }
                hop = next;
            }
            None => {
                return Err(RoutingError::DanglingRedirect {
                    from: from.to_string(),
                    to: hop.to_string(),
                });
            }
        }
    }
}
