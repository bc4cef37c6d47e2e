//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → DevServerConfig (validated, immutable)
//!     → compiled into route table + proxy rules
//!
//! On file change (--watch):
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → sent to the server, which swaps its compiled tables atomically
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults, so an empty file yields the built-in table
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AdminConfig, AppConfig, DevServerConfig, ListenerConfig, LogFormat, ObservabilityConfig,
    ProxyRuleConfig, RouteConfig, TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
