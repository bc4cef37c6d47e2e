//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the dev server.
//! All types derive Serde traits for deserialization from config files, and the
//! defaults reproduce the application's built-in route table and media proxy.

use serde::{Deserialize, Serialize};

use crate::pages::Page;

/// Root configuration for the dev server.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DevServerConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Client route table entries.
    pub routes: Vec<RouteConfig>,

    /// Reverse proxy rules, checked in order before the route table.
    pub proxy: Vec<ProxyRuleConfig>,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Introspection endpoints.
    pub admin: AdminConfig,

    /// Page shell settings.
    pub app: AppConfig,
}

impl Default for DevServerConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            routes: default_routes(),
            proxy: vec![ProxyRuleConfig::default()],
            timeouts: TimeoutConfig::default(),
            observability: ObservabilityConfig::default(),
            admin: AdminConfig::default(),
            app: AppConfig::default(),
        }
    }
}

fn default_routes() -> Vec<RouteConfig> {
    vec![
        RouteConfig::page("/register", Page::Register),
        RouteConfig::page("/login", Page::Login),
        RouteConfig::page("/comments", Page::Comments),
        RouteConfig::redirect("/", "/register"),
    ]
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// One entry of the client route table.
///
/// Exactly one of `page` and `redirect` must be set; this is checked by
/// validation rather than by the type so that the TOML stays flat.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RouteConfig {
    /// Static URL path (e.g., "/login").
    pub path: String,

    /// Page rendered for this path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<Page>,

    /// Path this entry redirects to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

impl RouteConfig {
    /// Entry binding `path` to a page.
    pub fn page(path: impl Into<String>, page: Page) -> Self {
        Self {
            path: path.into(),
            page: Some(page),
            redirect: None,
        }
    }

    /// Entry redirecting `path` to `to`.
    pub fn redirect(path: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            page: None,
            redirect: Some(to.into()),
        }
    }
}

/// Reverse proxy rule configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ProxyRuleConfig {
    /// Path prefix that selects this rule (raw string prefix).
    pub match_prefix: String,

    /// Origin requests are forwarded to (e.g., "http://localhost:8000").
    pub target_origin: String,

    /// Rewrite the Host header to the target authority.
    #[serde(default)]
    pub change_origin: bool,

    /// Append X-Forwarded-* headers.
    #[serde(default)]
    pub xfwd: bool,
}

impl Default for ProxyRuleConfig {
    fn default() -> Self {
        Self {
            match_prefix: "/media".to_string(),
            target_origin: "http://localhost:8000".to_string(),
            change_origin: true,
            xfwd: false,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total time allowed for a request/response in seconds.
    pub request_secs: u64,

    /// Time allowed for the upstream to produce response headers in seconds.
    pub upstream_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            upstream_secs: 30,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log filter directive used when RUST_LOG is unset.
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Introspection endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Mount the introspection endpoints.
    pub enabled: bool,

    /// Path prefix the endpoints are mounted under.
    pub path_prefix: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path_prefix: "/__devserver".to_string(),
        }
    }
}

/// Page shell configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Document title prefix.
    pub title: String,

    /// Script that boots the client application.
    pub bundle_path: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Comments".to_string(),
            bundle_path: "/js/app.js".to_string(),
        }
    }
}
