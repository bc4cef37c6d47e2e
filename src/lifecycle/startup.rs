//! Startup orchestration.
//!
//! # Responsibilities
//! - Compile the validated configuration
//! - Start background tasks (metrics, config watcher, signal handling)
//! - Bind the listener and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener binds last (traffic only when ready)

use std::net::SocketAddr;
use std::path::PathBuf;

use tokio::net::TcpListener;
use tokio::sync::mpsc;

use crate::config::watcher::ConfigWatcher;
use crate::config::DevServerConfig;
use crate::http::{HttpServer, ServerError};
use crate::lifecycle::signals::{handle_signals, ReloadTarget};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;

/// Error type for startup.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Server(#[from] ServerError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },

    #[error("failed to watch config file: {0}")]
    Watch(#[from] notify::Error),

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// What the process was started with.
pub struct StartupOptions {
    /// Validated configuration.
    pub config: DevServerConfig,
    /// File the configuration came from, if any.
    pub config_path: Option<PathBuf>,
    /// Reload automatically when the file changes.
    pub watch: bool,
}

/// Start the dev server and run it until shutdown.
pub async fn start(options: StartupOptions) -> Result<(), StartupError> {
    let StartupOptions {
        config,
        config_path,
        watch,
    } = options;

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let bind_address = config.listener.bind_address.clone();
    let server = HttpServer::new(config)?;

    let (updates_tx, updates_rx) = mpsc::unbounded_channel();

    let _watcher = match (&config_path, watch) {
        (Some(path), true) => Some(ConfigWatcher::new(path, updates_tx.clone()).run()?),
        (None, true) => {
            tracing::warn!("--watch has no effect without --config");
            None
        }
        _ => None,
    };

    let shutdown = Shutdown::new();
    let reload = config_path.map(|path| ReloadTarget {
        path,
        updates: updates_tx,
    });
    tokio::spawn(handle_signals(shutdown.clone(), reload));

    let listener = TcpListener::bind(&bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: bind_address.clone(),
            source,
        })?;

    if let Ok(local_addr) = listener.local_addr() {
        tracing::info!(address = %local_addr, "Listening for connections");
    }

    server
        .run(listener, updates_rx, shutdown.subscribe())
        .await
        .map_err(StartupError::Serve)
}
