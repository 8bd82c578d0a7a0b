//! Playlist enrichment.
//!
//! Replaces each playlist's video references with full video records, one
//! downstream call per reference, each under its own `videos-api GET` span.
//!
//! Failure policy:
//! - transport-class failure: the span is tagged, the remaining references of
//!   *that* playlist are skipped, and the next playlist proceeds normally
//! - malformed video body: the whole request fails
//!
//! Calls are sequential, in reference order, playlist by playlist.

use std::sync::Arc;

use opentelemetry::{Context, KeyValue};
use thiserror::Error;

use crate::observability::metrics::{self, FetchOutcome};
use crate::observability::tracing::{Tracing, VIDEO_SPAN};
use crate::playlists::types::{EnrichedPlaylist, StoredPlaylist, Video};
use crate::videos::{VideoError, VideoLookup};

/// Enrichment failures that abort the request.
#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("playlist '{playlist_id}': {source}")]
    Video {
        playlist_id: String,
        #[source]
        source: VideoError,
    },
}

#[derive(Clone)]
pub struct Aggregator {
    videos: Arc<dyn VideoLookup>,
    tracing: Tracing,
}

impl Aggregator {
    pub fn new(videos: Arc<dyn VideoLookup>, tracing: Tracing) -> Self {
        Self { videos, tracing }
    }

    /// Enrich every playlist, keeping playlist order and, inside each
    /// playlist, reference order.
    pub async fn enrich(
        &self,
        cx: &Context,
        playlists: Vec<StoredPlaylist>,
    ) -> Result<Vec<EnrichedPlaylist>, EnrichError> {
        let mut enriched = Vec::with_capacity(playlists.len());
        for playlist in playlists {
            let videos = self.enrich_videos(cx, &playlist).await?;
            enriched.push(playlist.with_videos(videos));
        }
        Ok(enriched)
    }

    async fn enrich_videos(
        &self,
        cx: &Context,
        playlist: &StoredPlaylist,
    ) -> Result<Vec<Video>, EnrichError> {
        let mut videos = Vec::with_capacity(playlist.videos.len());

        for (position, video_ref) in playlist.videos.iter().enumerate() {
            let span = self.tracing.start_client_span(cx, VIDEO_SPAN);
            span.set_attribute(KeyValue::new("video.id", video_ref.id.clone()));

            match self.videos.fetch_video(span.context(), &video_ref.id).await {
                Ok(video) => {
                    metrics::record_video_fetch(FetchOutcome::Ok);
                    videos.push(video);
                }
                Err(e) if e.is_fatal() => {
                    metrics::record_video_fetch(FetchOutcome::Decode);
                    span.record_error(e.to_string());
                    tracing::error!(
                        playlist_id = %playlist.id,
                        video_id = %video_ref.id,
                        error = %e,
                        "Malformed video record, aborting request"
                    );
                    return Err(EnrichError::Video {
                        playlist_id: playlist.id.clone(),
                        source: e,
                    });
                }
                Err(e) => {
                    metrics::record_video_fetch(FetchOutcome::Transport);
                    span.record_error(e.to_string());
                    tracing::warn!(
                        playlist_id = %playlist.id,
                        video_id = %video_ref.id,
                        skipped = playlist.videos.len() - position - 1,
                        error = %e,
                        "Video lookup failed, truncating playlist"
                    );
                    break;
                }
            }
        }

        Ok(videos)
    }
}
