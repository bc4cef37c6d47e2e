//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Pick pretty or JSON output from config
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured level
//! - A bare level applies to this crate and tower_http only

use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, util::TryInitError, EnvFilter,
};

use crate::config::{LogFormat, ObservabilityConfig};

/// Filter directive for a configured log level.
pub fn default_directive(log_level: &str) -> String {
    if log_level.contains('=') || log_level.contains(',') {
        log_level.to_string()
    } else {
        format!("comments_dev_server={log_level},tower_http={log_level}")
    }
}

/// Install the global subscriber.
pub fn init_logging(config: &ObservabilityConfig) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(&config.log_level)));

    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Pretty => registry.with(fmt::layer()).try_init(),
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
    }
}
