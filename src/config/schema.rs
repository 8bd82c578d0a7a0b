//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Environment name that switches on debug behaviour (permissive CORS).
pub const DEBUG_ENVIRONMENT: &str = "DEBUG";

/// Root configuration for the playlists service.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Deployment environment name (`DEBUG` enables CORS headers).
    pub environment: String,

    /// Listener configuration.
    pub server: ServerConfig,

    /// Key-value store holding the serialized playlists.
    pub store: StoreConfig,

    /// Downstream video service.
    pub videos: VideosConfig,

    /// Distributed tracing settings.
    pub tracing: TracingConfig,

    /// Log output settings.
    pub logging: LoggingConfig,

    /// Prometheus exposition settings.
    pub metrics: MetricsConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: String::new(),
            server: ServerConfig::default(),
            store: StoreConfig::default(),
            videos: VideosConfig::default(),
            tracing: TracingConfig::default(),
            logging: LoggingConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl AppConfig {
    /// True when running in the debug environment.
    pub fn is_debug(&self) -> bool {
        self.environment == DEBUG_ENVIRONMENT
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:10010").
    pub bind_address: String,

    /// Upper bound on the whole request, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:10010".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Redis connection and lookup settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    pub host: String,
    pub port: u16,
    pub db: i64,

    /// Key holding the JSON array of playlists.
    pub key: String,

    /// Deadline for connect + GET, in milliseconds.
    pub timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6379,
            db: 0,
            key: "playlists".to_string(),
            timeout_ms: 5_000,
        }
    }
}

impl StoreConfig {
    /// Connection URL in the form accepted by `redis::Client::open`.
    pub fn url(&self) -> String {
        format!("redis://{}:{}/{}", self.host, self.port, self.db)
    }
}

/// Downstream video service settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct VideosConfig {
    /// Base URL; the video id is appended as the last path segment.
    pub base_url: String,

    /// Per-call deadline, in milliseconds.
    pub timeout_ms: u64,
}

impl Default for VideosConfig {
    fn default() -> Self {
        Self {
            base_url: "http://videos-api:10010".to_string(),
            timeout_ms: 5_000,
        }
    }
}

/// Distributed tracing settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TracingConfig {
    /// Service name reported on every span.
    pub service_name: String,

    /// Collector endpoint. Spans are still created and propagated when unset,
    /// just never exported.
    pub collector_endpoint: Option<String>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            service_name: "playlists-api".to_string(),
            collector_endpoint: None,
        }
    }
}

impl TracingConfig {
    /// Collector endpoint with a scheme, accepting bare `host:port` values.
    pub fn collector_url(&self) -> Option<String> {
        let endpoint = self.collector_endpoint.as_deref()?.trim();
        if endpoint.is_empty() {
            return None;
        }
        if endpoint.contains("://") {
            Some(endpoint.to_string())
        } else {
            Some(format!("http://{}", endpoint))
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Log output settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,

    /// Filter used when `RUST_LOG` is not set.
    pub default_filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            default_filter: "playlists_api=debug,tower_http=debug".to_string(),
        }
    }
}

/// Prometheus exposition settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub address: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.bind_address, "0.0.0.0:10010");
        assert_eq!(config.store.key, "playlists");
        assert_eq!(config.store.url(), "redis://localhost:6379/0");
        assert_eq!(config.videos.base_url, "http://videos-api:10010");
        assert!(!config.is_debug());
        assert!(!config.metrics.enabled);
    }

    #[test]
    fn test_debug_switch_is_exact() {
        let mut config = AppConfig::default();
        config.environment = "DEBUG".into();
        assert!(config.is_debug());

        config.environment = "debug".into();
        assert!(!config.is_debug());
    }

    #[test]
    fn test_collector_url_adds_scheme() {
        let mut tracing = TracingConfig::default();
        assert_eq!(tracing.collector_url(), None);

        tracing.collector_endpoint = Some("jaeger:4317".into());
        assert_eq!(tracing.collector_url().as_deref(), Some("http://jaeger:4317"));

        tracing.collector_endpoint = Some("https://collector:4317".into());
        assert_eq!(tracing.collector_url().as_deref(), Some("https://collector:4317"));

        tracing.collector_endpoint = Some("  ".into());
        assert_eq!(tracing.collector_url(), None);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            environment = "DEBUG"

            [store]
            host = "redis"
            "#,
        )
        .unwrap();

        assert!(config.is_debug());
        assert_eq!(config.store.host, "redis");
        assert_eq!(config.store.port, 6379);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }
}
