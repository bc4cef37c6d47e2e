//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID)
//!     → [proxy rule match → forward upstream]
//!     → [route table → page | redirect | not found]
//!     → response.rs (locally generated answers)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestId, RequestIdExt, RequestIdLayer, X_REQUEST_ID};
pub use server::{AppState, HttpServer, ServerError, Tables};
