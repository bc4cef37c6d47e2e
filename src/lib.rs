//! Development server for the comments web application.
//!
//! Serves the client route table (page shells and the `/` redirect) and
//! forwards `/media` requests to the backend, the way the frontend's dev
//! server does during local development.

pub mod admin;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod pages;
pub mod proxy;
pub mod routing;

pub use config::DevServerConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
