//! Request identification.
//!
//! # Responsibilities
//! - Assign a unique request ID (UUID v4) unless the client sent one
//! - Echo the ID on the response
//! - Expose the ID to handlers and spans
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - The header rides along on proxied requests, so backend logs correlate

use axum::http::{HeaderName, HeaderValue, Request};
use tower::Layer;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestId, RequestId as TowerRequestId, SetRequestId,
};
use uuid::Uuid;

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

fn header_name() -> HeaderName {
    HeaderName::from_static(X_REQUEST_ID)
}

/// Generates UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestId;

impl MakeRequestId for RequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<TowerRequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(TowerRequestId::new)
    }
}

/// Layer that sets `x-request-id` on requests and propagates it to responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestIdLayer;

impl<S> Layer<S> for RequestIdLayer {
    type Service = SetRequestId<PropagateRequestId<S>, RequestId>;

    fn layer(&self, inner: S) -> Self::Service {
        SetRequestId::new(
            PropagateRequestId::new(inner, header_name()),
            header_name(),
            RequestId,
        )
    }
}

/// Access to the request ID of a request.
pub trait RequestIdExt {
    fn request_id(&self) -> Option<&str>;
}

impl<B> RequestIdExt for Request<B> {
    fn request_id(&self) -> Option<&str> {
        self.headers()
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
    }
}
