//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Enforce the route table shape (single root entry, root is a redirect)
//! - Validate proxy targets and value ranges
//! - Detect routes that collide with each other, with proxy rules or with the
//!   admin prefix
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: DevServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashMap;
use std::net::SocketAddr;

use crate::config::schema::{DevServerConfig, ProxyRuleConfig, RouteConfig};
use crate::pages::Page;
use crate::proxy::rule::parse_target_origin;
use crate::routing::{
    normalize_path, ExactPathMatcher, Matcher, PathPrefixMatcher, RouteTable, RoutingError,
};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("route table must contain exactly one '/' entry, found {0}")]
    RootCount(usize),

    #[error("the '/' entry must be a redirect, not a page")]
    RootNotRedirect,

    #[error("route '{0}' must set exactly one of `page` or `redirect`")]
    AmbiguousTarget(String),

    #[error("path '{0}' must start with '/'")]
    RelativePath(String),

    #[error("path '{0}' is declared more than once")]
    DuplicatePath(String),

    #[error("page {page} is bound to both '{first}' and '{second}'")]
    DuplicatePage {
        page: Page,
        first: String,
        second: String,
    },

    #[error("proxy prefix '{0}' must start with '/'")]
    RelativeProxyPrefix(String),

    #[error("proxy target '{target}' is invalid: {reason}")]
    InvalidProxyTarget { target: String, reason: String },

    #[error("'{0}' shadows the admin prefix")]
    ShadowsAdmin(String),

    #[error("proxy prefix '{prefix}' captures route '{path}'")]
    ProxyShadowsRoute { prefix: String, path: String },

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("invalid {field} address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error(transparent)]
    Routing(#[from] RoutingError),
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &DevServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let shape_ok = validate_routes(&config.routes, &mut errors);
    validate_proxy(&config.proxy, &mut errors);

    // Proxy rules are tried before the route table.
    for rule in &config.proxy {
        let matcher = PathPrefixMatcher::new(rule.match_prefix.as_str());
        for route in &config.routes {
            if matcher.matches(&route.path) || matcher.matches(&normalize_path(&route.path)) {
                errors.push(ValidationError::ProxyShadowsRoute {
                    prefix: rule.match_prefix.clone(),
                    path: route.path.clone(),
                });
            }
        }
    }

    if config.admin.enabled {
        let prefix = config.admin.path_prefix.as_str();
        if !prefix.starts_with('/') {
            errors.push(ValidationError::RelativePath(prefix.to_string()));
        }
        let admin = normalize_path(prefix);
        for route in &config.routes {
            if under_segment(&normalize_path(&route.path), &admin) {
                errors.push(ValidationError::ShadowsAdmin(route.path.clone()));
            }
        }
        for rule in &config.proxy {
            if prefix.starts_with(&rule.match_prefix) {
                errors.push(ValidationError::ShadowsAdmin(rule.match_prefix.clone()));
            }
        }
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("timeouts.request_secs"));
    }
    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("timeouts.upstream_secs"));
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    // Redirect chains are only meaningful once the table shape is sound.
    if shape_ok {
        if let Err(e) = RouteTable::from_config(&config.routes) {
            errors.push(e.into());
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// True when `path` is `prefix` itself or lies below it, the way `Router::nest`
/// mounts a prefix.
fn under_segment(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || prefix.ends_with('/'),
        None => false,
    }
}

/// Returns true when no structural problem was found.
fn validate_routes(routes: &[RouteConfig], errors: &mut Vec<ValidationError>) -> bool {
    let before = errors.len();

    let root = ExactPathMatcher::new("/");
    let roots: Vec<&RouteConfig> = routes.iter().filter(|r| root.matches(&r.path)).collect();
    if roots.len() != 1 {
        errors.push(ValidationError::RootCount(roots.len()));
    }
    if roots.iter().any(|r| r.page.is_some()) {
        errors.push(ValidationError::RootNotRedirect);
    }

    let mut seen_paths: HashMap<String, &str> = HashMap::new();
    let mut seen_pages: HashMap<Page, &str> = HashMap::new();

    for route in routes {
        if !route.path.starts_with('/') {
            errors.push(ValidationError::RelativePath(route.path.clone()));
        }
        if route.page.is_some() == route.redirect.is_some() {
            errors.push(ValidationError::AmbiguousTarget(route.path.clone()));
        }
        if let Some(to) = &route.redirect {
            if !to.starts_with('/') {
                errors.push(ValidationError::RelativePath(to.clone()));
            }
        }

        let key = normalize_path(&route.path);
        if seen_paths.insert(key, &route.path).is_some() {
            errors.push(ValidationError::DuplicatePath(route.path.clone()));
        }

        if let Some(page) = route.page {
            if let Some(first) = seen_pages.insert(page, &route.path) {
                errors.push(ValidationError::DuplicatePage {
                    page,
                    first: first.to_string(),
                    second: route.path.clone(),
                });
            }
        }
    }

    errors.len() == before
}

fn validate_proxy(rules: &[ProxyRuleConfig], errors: &mut Vec<ValidationError>) {
    for rule in rules {
        if !rule.match_prefix.starts_with('/') {
            errors.push(ValidationError::RelativeProxyPrefix(rule.match_prefix.clone()));
        }
        if let Err(reason) = parse_target_origin(&rule.target_origin) {
            errors.push(ValidationError::InvalidProxyTarget {
                target: rule.target_origin.clone(),
                reason: reason.to_string(),
            });
        }
    }
}
