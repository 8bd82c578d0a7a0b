//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! built-in defaults
//!     → optional TOML file (loader.rs, --config)
//!     → environment overrides (ENVIRONMENT, REDIS_HOST, REDIS_PORT, ...)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults so the service starts with no file at all
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AppConfig, LogFormat, LoggingConfig, MetricsConfig, ServerConfig, StoreConfig,
    TracingConfig, VideosConfig,
};
