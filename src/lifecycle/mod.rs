//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validated config → Compile tables → Metrics → Watcher → Bind → Serve
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain connections → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//!     SIGHUP → Reload the config file, if one was given
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then tables, then listener
//! - Fail fast: any startup error is fatal

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{start, StartupError, StartupOptions};
