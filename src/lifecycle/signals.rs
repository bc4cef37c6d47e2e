//! OS signal handling.
//!
//! # Responsibilities
//! - Listen for SIGINT/SIGTERM and trigger graceful shutdown
//! - Listen for SIGHUP and re-read the config file
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - A second SIGINT/SIGTERM exits immediately
//! - SIGHUP triggers config reload, not shutdown

use std::path::PathBuf;

use tokio::sync::mpsc;

use crate::config::{load_config, DevServerConfig};
use crate::lifecycle::Shutdown;

/// Where SIGHUP reloads are read from and delivered to.
pub struct ReloadTarget {
    pub path: PathBuf,
    pub updates: mpsc::UnboundedSender<DevServerConfig>,
}

/// Handle signals until the process exits.
pub async fn handle_signals(shutdown: Shutdown, reload: Option<ReloadTarget>) {
    loop {
        match next_signal().await {
            Signal::Terminate => {
                if !shutdown.trigger() {
                    tracing::warn!("Second termination signal, exiting now");
                    std::process::exit(130);
                }
                tracing::info!("Termination signal received, draining connections");
            }
            Signal::Reload => match &reload {
                Some(target) => match load_config(&target.path) {
                    Ok(config) => {
                        tracing::info!(path = ?target.path, "SIGHUP, reloading config");
                        let _ = target.updates.send(config);
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "SIGHUP reload failed, keeping current configuration");
                    }
                },
                None => tracing::info!("SIGHUP ignored, no config file in use"),
            },
        }
    }
}

enum Signal {
    Terminate,
    Reload,
}

#[cfg(unix)]
async fn next_signal() -> Signal {
    use tokio::signal::unix::{signal, SignalKind};

    let (Ok(mut term), Ok(mut hup)) = (
        signal(SignalKind::terminate()),
        signal(SignalKind::hangup()),
    ) else {
        tracing::error!("Failed to install signal handlers, falling back to Ctrl+C");
        let _ = tokio::signal::ctrl_c().await;
        return Signal::Terminate;
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => Signal::Terminate,
        _ = term.recv() => Signal::Terminate,
        _ = hup.recv() => Signal::Reload,
    }
}

#[cfg(not(unix))]
async fn next_signal() -> Signal {
    let _ = tokio::signal::ctrl_c().await;
    Signal::Terminate
}
