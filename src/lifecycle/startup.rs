//! Service assembly.
//!
//! Builds the shared clients once and hands them to the HTTP layer as
//! [`AppState`]. Nothing here touches the network: the store connects on
//! first use and the video client per request.

use std::sync::Arc;

use thiserror::Error;

use crate::config::AppConfig;
use crate::enrichment::Aggregator;
use crate::http::AppState;
use crate::observability::Tracing;
use crate::playlists::{KeyValueStore, PlaylistStore, RedisStore, StoreError};
use crate::videos::{HttpVideoClient, VideoClientError, VideoLookup};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("playlist store: {0}")]
    Store(#[from] StoreError),

    #[error("video client: {0}")]
    Videos(#[from] VideoClientError),
}

/// State backed by Redis and the HTTP video service.
pub fn build_state(config: &AppConfig, tracing: Tracing) -> Result<AppState, StartupError> {
    let backend = Arc::new(RedisStore::new(&config.store)?);
    let videos = Arc::new(HttpVideoClient::new(&config.videos, tracing.clone())?);
    Ok(assemble(config, backend, videos, tracing))
}

/// State over arbitrary store and video backends.
pub fn assemble(
    config: &AppConfig,
    backend: Arc<dyn KeyValueStore>,
    videos: Arc<dyn VideoLookup>,
    tracing: Tracing,
) -> AppState {
    AppState {
        store: PlaylistStore::new(backend, config.store.key.clone(), tracing.clone()),
        aggregator: Aggregator::new(videos, tracing.clone()),
        tracing,
    }
}
