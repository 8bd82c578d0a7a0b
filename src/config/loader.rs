//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{AppConfig, LogFormat};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {name}: '{value}'")]
    Env { name: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration: defaults, then the optional TOML file, then the
/// environment. The result is validated before it is returned.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => AppConfig::default(),
    };

    let config = apply_env_overrides(config, |name| std::env::var(name).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay environment variables onto `config`.
///
/// Empty values are treated as unset.
pub fn apply_env_overrides<F>(mut config: AppConfig, lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(environment) = var("ENVIRONMENT") {
        config.environment = environment;
    }
    if let Some(host) = var("REDIS_HOST") {
        config.store.host = host;
    }
    if let Some(port) = var("REDIS_PORT") {
        config.store.port = port
            .trim()
            .parse()
            .map_err(|_| ConfigError::Env { name: "REDIS_PORT", value: port.clone() })?;
    }
    if let Some(endpoint) = var("JAEGER_HOST_PORT") {
        config.tracing.collector_endpoint = Some(endpoint);
    }
    if let Some(url) = var("VIDEOS_API_URL") {
        config.videos.base_url = url;
    }
    if let Some(addr) = var("LISTEN_ADDRESS") {
        config.server.bind_address = addr;
    }
    if let Some(format) = var("LOG_FORMAT") {
        config.logging.format = match format.to_ascii_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            "json" => LogFormat::Json,
            _ => return Err(ConfigError::Env { name: "LOG_FORMAT", value: format }),
        };
    }

    Ok(config)
}
