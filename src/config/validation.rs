//! Configuration validation.
//!
//! Serde handles syntax; this module checks value ranges and formats.
//! All errors are collected rather than stopping at the first.

use std::net::SocketAddr;
use std::fmt;

use crate::config::schema::AppConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self { field, message: message.into() }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a loaded configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "server.bind_address",
            format!("'{}' is not a socket address", config.server.bind_address),
        ));
    }
    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::new("server.request_timeout_secs", "must be > 0"));
    }

    if config.store.host.trim().is_empty() {
        errors.push(ValidationError::new("store.host", "must not be empty"));
    }
    if config.store.port == 0 {
        errors.push(ValidationError::new("store.port", "must be > 0"));
    }
    if config.store.key.is_empty() {
        errors.push(ValidationError::new("store.key", "must not be empty"));
    }
    if config.store.timeout_ms == 0 {
        errors.push(ValidationError::new("store.timeout_ms", "must be > 0"));
    }

    match url::Url::parse(&config.videos.base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && !url.cannot_be_a_base() => {}
        Ok(url) => errors.push(ValidationError::new(
            "videos.base_url",
            format!("unsupported URL '{}'", url),
        )),
        Err(e) => errors.push(ValidationError::new(
            "videos.base_url",
            format!("'{}' is not a URL: {}", config.videos.base_url, e),
        )),
    }
    if config.videos.timeout_ms == 0 {
        errors.push(ValidationError::new("videos.timeout_ms", "must be > 0"));
    }

    if let Some(endpoint) = config.tracing.collector_url() {
        if url::Url::parse(&endpoint).is_err() {
            errors.push(ValidationError::new(
                "tracing.collector_endpoint",
                format!("'{}' is not a URL", endpoint),
            ));
        }
    }

    if config.metrics.enabled && config.metrics.address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "metrics.address",
            format!("'{}' is not a socket address", config.metrics.address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = AppConfig::default();
        config.server.bind_address = "nowhere".into();
        config.store.port = 0;
        config.videos.base_url = "ftp://videos".into();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["server.bind_address", "store.port", "videos.base_url"]);
    }

    #[test]
    fn test_rejects_relative_video_url() {
        let mut config = AppConfig::default();
        config.videos.base_url = "videos-api:10010".into();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_metrics_address_only_checked_when_enabled() {
        let mut config = AppConfig::default();
        config.metrics.address = "bogus".into();
        assert!(validate_config(&config).is_ok());

        config.metrics.enabled = true;
        assert!(validate_config(&config).is_err());
    }
}
