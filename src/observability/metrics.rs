//! Metrics collection and exposition.
//!
//! # Metrics
//! - `devserver_requests_total` (counter): requests by method, status, outcome
//! - `devserver_request_duration_seconds` (histogram): latency by outcome
//! - `devserver_reloads_total` (counter): accepted configuration reloads

use std::net::SocketAddr;
use std::time::Instant;

use axum::http::{Method, StatusCode};
use metrics_exporter_prometheus::PrometheusBuilder;

/// How a request was answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Page,
    Redirect,
    Proxy,
    NotFound,
    Rejected,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Page => "page",
            Outcome::Redirect => "redirect",
            Outcome::Proxy => "proxy",
            Outcome::NotFound => "not_found",
            Outcome::Rejected => "rejected",
        }
    }
}

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &Method, status: StatusCode, outcome: Outcome, start: Instant) {
    metrics::counter!(
        "devserver_requests_total",
        "method" => method.to_string(),
        "status" => status.as_u16().to_string(),
        "outcome" => outcome.as_str()
    )
    .increment(1);

    metrics::histogram!(
        "devserver_request_duration_seconds",
        "outcome" => outcome.as_str()
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_reload() {
    metrics::counter!("devserver_reloads_total").increment(1);
}
