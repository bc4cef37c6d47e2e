use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::http::server::AppState;
use crate::proxy::ProxyRules;
use crate::routing::{Resolution, RouteEntry};

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct RoutesSnapshot {
    pub routes: Vec<RouteEntry>,
    pub proxy: ProxyRules,
}

#[derive(Deserialize)]
pub struct ResolveParams {
    pub path: String,
}

/// How the server would answer a path.
#[derive(Serialize)]
pub struct ResolveReport {
    pub path: String,
    /// Target origin when a proxy rule claims the path.
    pub proxied_to: Option<String>,
    /// Route table answer, absent when the path is proxied.
    pub resolution: Option<Resolution>,
}

pub async fn get_status() -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "running",
    })
}

pub async fn get_routes(State(state): State<AppState>) -> Json<RoutesSnapshot> {
    let tables = state.tables.load();
    Json(RoutesSnapshot {
        routes: tables.routes.entries().to_vec(),
        proxy: tables.proxy.clone(),
    })
}

pub async fn get_resolve(
    State(state): State<AppState>,
    Query(params): Query<ResolveParams>,
) -> Json<ResolveReport> {
    let tables = state.tables.load();
    let (path, query) = match params.path.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (params.path.as_str(), None),
    };

    let report = match tables.proxy.match_path(path) {
        Some(rule) => ResolveReport {
            path: params.path.clone(),
            proxied_to: Some(format!(
                "{}{}",
                rule.target_origin().as_str().trim_end_matches('/'),
                params.path
            )),
            resolution: None,
        },
        None => ResolveReport {
            path: params.path.clone(),
            proxied_to: None,
            resolution: Some(tables.routes.resolve(path, query)),
        },
    };
    Json(report)
}
