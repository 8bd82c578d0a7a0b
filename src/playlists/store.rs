//! Playlist store client.
//!
//! # Responsibilities
//! - Look up the serialized playlists under one fixed key
//! - Decode them into [`StoredPlaylist`] records
//! - Fail open: any store problem is logged, tagged on the span, and served
//!   as an empty list
//!
//! # Design Decisions
//! - [`KeyValueStore`] is the seam to the backing store; [`RedisStore`] is
//!   the production implementation
//! - The Redis connection is opened lazily and re-opened after a failure, so
//!   the service starts even when Redis is down

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use opentelemetry::{Context, KeyValue};
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::config::StoreConfig;
use crate::observability::metrics;
use crate::observability::tracing::{Tracing, STORE_SPAN};
use crate::playlists::types::StoredPlaylist;

/// Errors that can occur while reading playlists from the store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid store URL: {0}")]
    InvalidUrl(#[source] redis::RedisError),

    #[error("store connection failed: {0}")]
    Connect(#[source] redis::RedisError),

    #[error("store command failed: {0}")]
    Command(#[source] redis::RedisError),

    #[error("store lookup timed out after {0:?}")]
    Timeout(Duration),

    #[error("key '{0}' not found")]
    MissingKey(String),

    #[error("stored playlists are not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Read access to a key-value store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Value stored under `key`, or `None` when the key is absent.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
}

/// Redis-backed [`KeyValueStore`] sharing one multiplexed connection.
pub struct RedisStore {
    client: redis::Client,
    connection: Mutex<Option<MultiplexedConnection>>,
    timeout: Duration,
}

impl RedisStore {
    /// Create the store. No connection is made until the first lookup.
    pub fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        let client = redis::Client::open(config.url()).map_err(StoreError::InvalidUrl)?;
        Ok(Self {
            client,
            connection: Mutex::new(None),
            timeout: Duration::from_millis(config.timeout_ms),
        })
    }

    async fn connection(&self) -> Result<MultiplexedConnection, StoreError> {
        let mut slot = self.connection.lock().await;
        if let Some(conn) = slot.as_ref() {
            return Ok(conn.clone());
        }

        let conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(StoreError::Connect)?;
        tracing::debug!("Connected to playlist store");
        *slot = Some(conn.clone());
        Ok(conn)
    }

    async fn lookup(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.connection().await?;
        let result: redis::RedisResult<Option<String>> = conn.get(key).await;
        match result {
            Ok(value) => Ok(value),
            Err(e) => {
                // Drop the cached connection so the next request reconnects.
                self.connection.lock().await.take();
                Err(StoreError::Command(e))
            }
        }
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match tokio::time::timeout(self.timeout, self.lookup(key)).await {
            Ok(result) => result,
            Err(_) => {
                // A hung connection must not be reused by the next request.
                self.connection.lock().await.take();
                Err(StoreError::Timeout(self.timeout))
            }
        }
    }
}

/// Reads the playlist list from a [`KeyValueStore`].
#[derive(Clone)]
pub struct PlaylistStore {
    backend: Arc<dyn KeyValueStore>,
    key: String,
    tracing: Tracing,
}

impl PlaylistStore {
    pub fn new(backend: Arc<dyn KeyValueStore>, key: impl Into<String>, tracing: Tracing) -> Self {
        Self {
            backend,
            key: key.into(),
            tracing,
        }
    }

    /// Fetch playlists under a `redis-get` span child of `cx`.
    ///
    /// Never fails: store errors degrade to an empty list.
    pub async fn fetch_playlists(&self, cx: &Context) -> Vec<StoredPlaylist> {
        let span = self.tracing.start_client_span(cx, STORE_SPAN);
        span.set_attribute(KeyValue::new("db.system", "redis"));
        span.set_attribute(KeyValue::new("db.key", self.key.clone()));

        match self.try_fetch_playlists().await {
            Ok(playlists) => {
                tracing::debug!(count = playlists.len(), "Fetched playlists");
                playlists
            }
            Err(e) => {
                tracing::warn!(
                    key = %self.key,
                    error = %e,
                    "Error retrieving playlists from store, serving empty list"
                );
                span.record_error(e.to_string());
                metrics::record_store_fallback();
                Vec::new()
            }
        }
    }

    /// Fetch and decode without the fail-open fallback.
    pub async fn try_fetch_playlists(&self) -> Result<Vec<StoredPlaylist>, StoreError> {
        let raw = self
            .backend
            .get(&self.key)
            .await?
            .ok_or_else(|| StoreError::MissingKey(self.key.clone()))?;
        Ok(serde_json::from_str(&raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playlists::types::VideoRef;
    use opentelemetry_sdk::trace::TracerProvider;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::{TcpListener, TcpStream};

    enum Fixed {
        Value(Option<&'static str>),
        Fail,
    }

    #[async_trait]
    impl KeyValueStore for Fixed {
        async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            match self {
                Fixed::Value(v) => Ok(v.map(str::to_string)),
                Fixed::Fail => Err(StoreError::Timeout(Duration::from_millis(1))),
            }
        }
    }

    fn store(backend: Fixed) -> PlaylistStore {
        let tracing = Tracing::from_provider(&TracerProvider::builder().build(), "test");
        PlaylistStore::new(Arc::new(backend), "playlists", tracing)
    }

    #[tokio::test]
    async fn test_fetch_decodes_playlists() {
        let store = store(Fixed::Value(Some(
            r#"[{"id":"p1","name":"Favorites","videos":[{"id":"v1"},{"id":"v2"}]}]"#,
        )));

        let playlists = store.fetch_playlists(&Context::new()).await;
        assert_eq!(playlists.len(), 1);
        assert_eq!(playlists[0].videos, vec![VideoRef::from("v1"), VideoRef::from("v2")]);
    }

    #[tokio::test]
    async fn test_missing_key_serves_empty() {
        let store = store(Fixed::Value(None));
        assert!(store.fetch_playlists(&Context::new()).await.is_empty());
        assert!(matches!(
            store.try_fetch_playlists().await,
            Err(StoreError::MissingKey(k)) if k == "playlists"
        ));
    }

    #[tokio::test]
    async fn test_invalid_json_serves_empty() {
        let store = store(Fixed::Value(Some("{not json")));
        assert!(store.fetch_playlists(&Context::new()).await.is_empty());
        assert!(matches!(store.try_fetch_playlists().await, Err(StoreError::Decode(_))));
    }

    #[tokio::test]
    async fn test_backend_failure_serves_empty() {
        let store = store(Fixed::Fail);
        assert!(store.fetch_playlists(&Context::new()).await.is_empty());
    }

    /// Redis stand-in that acknowledges every command except `GET`, which
    /// it never answers. Returns its address and the number of accepted
    /// connections.
    async fn start_hanging_redis() -> (std::net::SocketAddr, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accepted = Arc::new(AtomicUsize::new(0));

        let counter = accepted.clone();
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(serve_until_get(socket));
            }
        });

        (addr, accepted)
    }

    async fn serve_until_get(socket: TcpStream) {
        let (read, mut write) = socket.into_split();
        let mut lines = BufReader::new(read).lines();

        while let Ok(Some(line)) = lines.next_line().await {
            let Some(count) = line.strip_prefix('*').and_then(|n| n.parse::<usize>().ok()) else {
                continue;
            };
            let mut args = Vec::with_capacity(count);
            for _ in 0..count {
                // `$len` header, then the argument itself.
                let Ok(Some(_)) = lines.next_line().await else {
                    return;
                };
                let Ok(Some(arg)) = lines.next_line().await else {
                    return;
                };
                args.push(arg);
            }

            if args.first().is_some_and(|cmd| cmd.eq_ignore_ascii_case("GET")) {
                continue;
            }
            if write.write_all(b"+OK\r\n").await.is_err() {
                return;
            }
        }
    }

    #[tokio::test]
    async fn test_timeout_drops_cached_connection() {
        let (addr, accepted) = start_hanging_redis().await;
        let config = StoreConfig {
            host: addr.ip().to_string(),
            port: addr.port(),
            timeout_ms: 200,
            ..StoreConfig::default()
        };
        let redis = RedisStore::new(&config).unwrap();

        let first = redis.get("playlists").await;
        assert!(matches!(first, Err(StoreError::Timeout(_))));
        assert!(redis.connection.lock().await.is_none());

        let second = redis.get("playlists").await;
        assert!(matches!(second, Err(StoreError::Timeout(_))));
        assert_eq!(accepted.load(Ordering::SeqCst), 2, "each lookup opens a fresh connection");
    }

    #[tokio::test]
    async fn test_unreachable_redis_serves_empty() {
        let config = StoreConfig {
            host: "127.0.0.1".into(),
            port: 1,
            timeout_ms: 500,
            ..StoreConfig::default()
        };
        let tracing = Tracing::from_provider(&TracerProvider::builder().build(), "test");
        let store = PlaylistStore::new(Arc::new(RedisStore::new(&config).unwrap()), "playlists", tracing);

        assert!(store.fetch_playlists(&Context::new()).await.is_empty());
    }
}
