//! Comments dev server
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request      ┌──────────────────────────────────────────────┐
//!     ────────────────────┼─▶ http server (request id, trace, timeout)   │
//!                         │        │                                     │
//!                         │        ├─ /__devserver/* ─▶ admin            │
//!                         │        │                                     │
//!                         │        ├─ proxy rule? ───▶ forward ──────────┼──▶ Backend
//!                         │        │                  (Host rewritten)   │    (localhost:8000)
//!                         │        │                                     │
//!                         │        └─ route table ─▶ page | 302 | 404    │
//!                         │                                              │
//!                         │  config (TOML, watch, SIGHUP) · logging ·    │
//!                         │  metrics · graceful shutdown                 │
//!                         └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use comments_dev_server::config::{load_config, validate_config, ConfigError, DevServerConfig};
use comments_dev_server::lifecycle::{start, StartupOptions};
use comments_dev_server::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "comments-dev-server")]
#[command(about = "Development server for the comments frontend", long_about = None)]
struct Cli {
    /// TOML configuration file. Without one the built-in table is served.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(short, long)]
    bind: Option<String>,

    /// Reload the configuration file when it changes.
    #[arg(short, long)]
    watch: bool,

    /// Print the effective configuration as TOML and exit.
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => DevServerConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
        validate_config(&config).map_err(ConfigError::Validation)?;
    }

    if cli.print_config {
        println!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    init_logging(&config.observability)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = ?cli.config,
        "comments-dev-server starting"
    );
    tracing::info!(
        bind_address = %config.listener.bind_address,
        routes = config.routes.len(),
        proxy_rules = config.proxy.len(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    start(StartupOptions {
        config,
        config_path: cli.config,
        watch: cli.watch,
    })
    .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
