//! Development reverse proxy.
//!
//! # Data Flow
//! ```text
//! Request path
//!     → rule.rs (first rule whose prefix matches, in config order)
//!     → forward.rs (rewrite URI + Host, strip hop-by-hop, send upstream)
//!     → Response streamed back to client
//! ```
//!
//! # Design Decisions
//! - Path is forwarded unchanged; only scheme and authority are replaced
//! - One pooled upstream client shared by all rules
//! - No retries: a failed upstream surfaces as 502, a slow one as 504

pub mod forward;
pub mod rule;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

pub use forward::Forwarder;
pub use rule::{ProxyRule, ProxyRules};

/// Error raised while forwarding a request upstream.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("failed to build upstream request: {0}")]
    Request(#[from] axum::http::Error),

    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),

    #[error("upstream did not respond within {0:?}")]
    Timeout(std::time::Duration),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Request(_) => StatusCode::BAD_REQUEST,
            ProxyError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ProxyError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let body = match self {
            ProxyError::Request(_) => "Malformed proxy request",
            ProxyError::Upstream(_) => "Upstream request failed",
            ProxyError::Timeout(_) => "Upstream timed out",
        };
        (self.status(), body).into_response()
    }
}
