//! Request forwarding to the proxy target.
//!
//! # Responsibilities
//! - Rewrite the request URI onto the target origin
//! - Rewrite the Host header when the rule asks for it
//! - Strip hop-by-hop headers in both directions
//! - Enforce the upstream timeout

use std::net::SocketAddr;
use std::time::Duration;

use axum::body::Body;
use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};
use axum::http::uri::PathAndQuery;
use axum::http::{Request, Uri, Version};
use axum::response::Response;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::proxy::{ProxyError, ProxyRule};

const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");
const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");

/// Headers that describe a single connection and must not be forwarded.
const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Shared upstream client.
#[derive(Clone)]
pub struct Forwarder {
    client: Client<HttpConnector, Body>,
    timeout: Duration,
}

impl Forwarder {
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self { client, timeout }
    }

    /// Forward `request` according to `rule` and stream the response back.
    pub async fn forward(
        &self,
        rule: &ProxyRule,
        request: Request<Body>,
        client_addr: Option<SocketAddr>,
    ) -> Result<Response, ProxyError> {
        let upstream = build_upstream_request(rule, request, client_addr)?;

        let response = tokio::time::timeout(self.timeout, self.client.request(upstream))
            .await
            .map_err(|_| ProxyError::Timeout(self.timeout))??;

        let (mut parts, body) = response.into_parts();
        strip_hop_by_hop(&mut parts.headers);
        Ok(Response::from_parts(parts, Body::new(body)))
    }
}

/// Turn an incoming request into the request sent to the rule's target.
pub fn build_upstream_request(
    rule: &ProxyRule,
    request: Request<Body>,
    client_addr: Option<SocketAddr>,
) -> Result<Request<Body>, ProxyError> {
    let (mut parts, body) = request.into_parts();

    let path_and_query = parts
        .uri
        .path_and_query()
        .cloned()
        .unwrap_or_else(|| PathAndQuery::from_static("/"));
    parts.uri = Uri::builder()
        .scheme(rule.scheme())
        .authority(rule.authority().clone())
        .path_and_query(path_and_query)
        .build()?;
    parts.version = Version::HTTP_11;

    strip_hop_by_hop(&mut parts.headers);

    let original_host = parts.headers.get(header::HOST).cloned();

    if rule.xfwd() {
        if let Some(addr) = client_addr {
            append_forwarded_for(&mut parts.headers, addr);
        }
        if !parts.headers.contains_key(&X_FORWARDED_HOST) {
            if let Some(host) = &original_host {
                parts.headers.insert(X_FORWARDED_HOST, host.clone());
            }
        }
        parts
            .headers
            .entry(X_FORWARDED_PROTO)
            .or_insert(HeaderValue::from_static("http"));
    }

    if rule.change_origin() {
        let host = HeaderValue::from_str(rule.authority().as_str())
            .map_err(axum::http::Error::from)?;
        parts.headers.insert(header::HOST, host);
    }

    Ok(Request::from_parts(parts, body))
}

fn append_forwarded_for(headers: &mut HeaderMap, addr: SocketAddr) {
    let ip = addr.ip().to_string();
    let value = match headers.get(&X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
        Some(existing) => format!("{existing}, {ip}"),
        None => ip,
    };
    if let Ok(value) = HeaderValue::from_str(&value) {
        headers.insert(X_FORWARDED_FOR, value);
    }
}

/// Remove hop-by-hop headers, including any named by `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let named: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in named.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
}
