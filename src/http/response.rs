//! Responses produced by the dev server itself.
//!
//! Proxied responses are streamed unchanged apart from hop-by-hop headers
//! (see `proxy::forward`); everything here is a locally generated answer.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::config::AppConfig;
use crate::pages::{render_not_found, render_page, Page};

/// `302 Found` to `location`.
pub fn redirect(location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => (StatusCode::FOUND, [(header::LOCATION, value)]).into_response(),
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Invalid redirect target").into_response(),
    }
}

pub fn page(app: &AppConfig, page: Page) -> Response {
    render_page(app, page).into_response()
}

pub fn not_found(app: &AppConfig, path: &str) -> Response {
    (StatusCode::NOT_FOUND, render_not_found(app, path)).into_response()
}

/// Page and redirect entries only answer safe methods.
pub fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, HeaderValue::from_static("GET, HEAD"))],
        "Method not allowed",
    )
        .into_response()
}
