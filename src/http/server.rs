//! HTTP server setup and dispatch.
//!
//! # Responsibilities
//! - Create Axum Router with the dispatch handler and introspection endpoints
//! - Wire up middleware (request ID, tracing, timeout)
//! - Dispatch requests: proxy rules first, then the route table
//! - Swap compiled tables when a new configuration arrives
//! - Serve until the shutdown signal fires

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Method, Request},
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::admin;
use crate::config::{validate_config, AppConfig, DevServerConfig, ValidationError};
use crate::http::request::{RequestIdExt, RequestIdLayer};
use crate::http::response;
use crate::observability::metrics;
use crate::proxy::rule::TargetError;
use crate::proxy::{Forwarder, ProxyRules};
use crate::routing::{Resolution, RouteTable, RoutingError};

/// Error raised while compiling a configuration for serving.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("invalid configuration: {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "))]
    Invalid(Vec<ValidationError>),

    #[error("invalid route table: {0}")]
    Routing(#[from] RoutingError),

    #[error("invalid proxy target: {0}")]
    Proxy(#[from] TargetError),
}

/// Everything a request needs that can change on reload.
#[derive(Debug)]
pub struct Tables {
    pub routes: RouteTable,
    pub proxy: ProxyRules,
    pub app: AppConfig,
}

impl Tables {
    /// Validate and compile `config`.
    pub fn compile(config: &DevServerConfig) -> Result<Self, ServerError> {
        validate_config(config).map_err(ServerError::Invalid)?;
        Ok(Self {
            routes: RouteTable::from_config(&config.routes)?,
            proxy: ProxyRules::from_config(&config.proxy)?,
            app: config.app.clone(),
        })
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub tables: Arc<ArcSwap<Tables>>,
    pub forwarder: Forwarder,
}

/// HTTP server for the dev server.
pub struct HttpServer {
    router: Router,
    config: DevServerConfig,
    tables: Arc<ArcSwap<Tables>>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: DevServerConfig) -> Result<Self, ServerError> {
        let tables = Arc::new(ArcSwap::from_pointee(Tables::compile(&config)?));
        let forwarder = Forwarder::new(Duration::from_secs(config.timeouts.upstream_secs));

        tracing::info!(
            routes = tables.load().routes.len(),
            proxy_rules = tables.load().proxy.len(),
            "Tables compiled"
        );

        let state = AppState {
            tables: tables.clone(),
            forwarder,
        };

        let router = Self::build_router(&config, state);
        Ok(Self {
            router,
            config,
            tables,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &DevServerConfig, state: AppState) -> Router {
        let mut router = Router::new();
        if config.admin.enabled {
            router = router.nest(&config.admin.path_prefix, admin::router());
        }

        router
            .fallback(dispatch)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %req.method(),
                    uri = %req.uri(),
                    request_id = %req.request_id().unwrap_or("unknown"),
                )
            }))
            .layer(RequestIdLayer)
    }

    /// The Axum router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Compile `config` and swap it in. On error the current tables stay.
    ///
    /// Listener, timeout and admin settings are fixed at startup.
    pub fn reload(&self, config: &DevServerConfig) -> Result<(), ServerError> {
        reload_tables(&self.tables, &self.config, config)
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<DevServerConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let tables = self.tables.clone();
        let startup_config = self.config.clone();
        let mut reload_shutdown = shutdown.resubscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    update = config_updates.recv() => match update {
                        Some(config) => {
                            if let Err(e) = reload_tables(&tables, &startup_config, &config) {
                                tracing::error!(error = %e, "Reload rejected, keeping current tables");
                            }
                        }
                        None => break,
                    },
                    _ = reload_shutdown.recv() => break,
                }
            }
        });

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

fn reload_tables(
    tables: &ArcSwap<Tables>,
    current: &DevServerConfig,
    next: &DevServerConfig,
) -> Result<(), ServerError> {
    let compiled = Tables::compile(next)?;

    if next.listener.bind_address != current.listener.bind_address {
        tracing::warn!(
            bind_address = %next.listener.bind_address,
            "Listener address changes need a restart"
        );
    }

    tracing::info!(
        routes = compiled.routes.len(),
        proxy_rules = compiled.proxy.len(),
        "Configuration reloaded"
    );
    tables.store(Arc::new(compiled));
    metrics::record_reload();
    Ok(())
}

/// Main handler.
/// Forwards matching requests upstream, otherwise resolves the route table.
async fn dispatch(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let tables = state.tables.load_full();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = request.request_id().unwrap_or("unknown").to_string();

    if let Some(rule) = tables.proxy.match_path(&path) {
        tracing::debug!(
            request_id = %request_id,
            path = %path,
            target = %rule.target_origin(),
            "Proxying request"
        );

        let client_addr = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        let res = match state.forwarder.forward(rule, request, client_addr).await {
            Ok(res) => res,
            Err(e) => {
                tracing::error!(request_id = %request_id, path = %path, error = %e, "Upstream error");
                e.into_response()
            }
        };
        metrics::record_request(&method, res.status(), metrics::Outcome::Proxy, start_time);
        return res;
    }

    let resolution = tables.routes.resolve(&path, request.uri().query());
    let (res, outcome) = match resolution {
        Resolution::NotFound => {
            tracing::debug!(request_id = %request_id, path = %path, "No route matched");
            (response::not_found(&tables.app, &path), metrics::Outcome::NotFound)
        }
        _ if method != Method::GET && method != Method::HEAD => {
            (response::method_not_allowed(), metrics::Outcome::Rejected)
        }
        Resolution::Page { page } => (response::page(&tables.app, page), metrics::Outcome::Page),
        Resolution::Redirect { location } => {
            tracing::debug!(request_id = %request_id, from = %path, to = %location, "Redirecting");
            (response::redirect(&location), metrics::Outcome::Redirect)
        }
    };

    metrics::record_request(&method, res.status(), outcome, start_time);
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RouteConfig;
    use crate::pages::Page;
    use axum::http::{header, StatusCode};
    use tower::ServiceExt;

    fn server() -> HttpServer {
        HttpServer::new(DevServerConfig::default()).unwrap()
    }

    async fn send(router: Router, method: Method, uri: &str) -> Response {
        router
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn body_text(res: Response) -> String {
        let bytes = axum::body::to_bytes(res.into_body(), 64 * 1024).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_root_redirects() {
        let res = send(server().router(), Method::GET, "/").await;
        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(res.headers()[header::LOCATION], "/register");
        assert!(res.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_login_renders_login_page() {
        let res = send(server().router(), Method::GET, "/login").await;
        assert_eq!(res.status(), StatusCode::OK);
        assert!(body_text(res).await.contains("data-component=\"LoginPage\""));
    }

    #[tokio::test]
    async fn test_unknown_is_not_found() {
        let res = send(server().router(), Method::GET, "/unknown").await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_head_answered_like_get() {
        let res = send(server().router(), Method::HEAD, "/").await;
        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(res.headers()[header::LOCATION], "/register");

        let res = send(server().router(), Method::HEAD, "/login").await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_post_to_page_rejected() {
        let res = send(server().router(), Method::POST, "/comments").await;
        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);

        let res = send(server().router(), Method::POST, "/nope").await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_reload_swaps_tables() {
        let server = server();

        let mut next = DevServerConfig::default();
        next.routes.retain(|r| r.path != "/");
        next.routes.push(RouteConfig::redirect("/", "/comments"));
        server.reload(&next).unwrap();

        let res = send(server.router(), Method::GET, "/").await;
        assert_eq!(res.headers()[header::LOCATION], "/comments");
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_tables() {
        let server = server();

        let mut next = DevServerConfig::default();
        next.routes.push(RouteConfig::redirect("/old", "/gone"));
        assert!(server.reload(&next).is_err());

        let mut next = DevServerConfig::default();
        next.routes.retain(|r| r.path != "/");
        assert!(matches!(server.reload(&next), Err(ServerError::Invalid(_))));

        let res = send(server.router(), Method::GET, "/comments").await;
        assert_eq!(res.status(), StatusCode::OK);
        assert!(body_text(res).await.contains(Page::Comments.component()));
    }
}
