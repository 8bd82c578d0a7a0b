//! Video service client.
//!
//! # Responsibilities
//! - One `GET <base>/<videoId>` per lookup
//! - Inject the caller's trace context as B3 headers
//! - Classify failures: transport-class (connect, timeout, non-2xx) versus
//!   a body that is not a video record
//!
//! # Design Decisions
//! - No retries; the caller decides what a failure means
//! - The video id is pushed as an escaped path segment, never concatenated
//! - Environment proxies are ignored, the video service is reached directly

use std::time::Duration;

use async_trait::async_trait;
use axum::http::{HeaderMap, StatusCode};
use opentelemetry::Context;
use thiserror::Error;
use url::Url;

use crate::config::VideosConfig;
use crate::observability::Tracing;
use crate::playlists::types::Video;

/// Errors from a single video lookup.
#[derive(Debug, Error)]
pub enum VideoError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("video service answered {status} for {url}")]
    Status { url: String, status: StatusCode },

    #[error("response for video '{video_id}' is not a video record: {source}")]
    Decode {
        video_id: String,
        #[source]
        source: serde_json::Error,
    },
}

impl VideoError {
    /// A malformed body aborts the whole request; everything else only
    /// affects the playlist being enriched.
    pub fn is_fatal(&self) -> bool {
        matches!(self, VideoError::Decode { .. })
    }

    fn from_reqwest(url: &Url, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            VideoError::Timeout { url: url.to_string() }
        } else {
            VideoError::Transport {
                url: url.to_string(),
                source,
            }
        }
    }
}

/// Errors building the client at startup.
#[derive(Debug, Error)]
pub enum VideoClientError {
    #[error("invalid video service URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Lookup of full video records by id.
#[async_trait]
pub trait VideoLookup: Send + Sync {
    /// Fetch one video. `cx` carries the span the call runs under.
    async fn fetch_video(&self, cx: &Context, video_id: &str) -> Result<Video, VideoError>;
}

/// [`VideoLookup`] over HTTP with `reqwest`.
#[derive(Clone)]
pub struct HttpVideoClient {
    http: reqwest::Client,
    base_url: Url,
    tracing: Tracing,
}

impl HttpVideoClient {
    pub fn new(config: &VideosConfig, tracing: Tracing) -> Result<Self, VideoClientError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| VideoClientError::InvalidBaseUrl {
            url: config.base_url.clone(),
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(VideoClientError::InvalidBaseUrl {
                url: config.base_url.clone(),
                reason: "URL cannot carry a path".to_string(),
            });
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .no_proxy()
            .build()?;

        Ok(Self {
            http,
            base_url,
            tracing,
        })
    }

    /// URL of one video: the id becomes the last path segment.
    pub fn video_url(&self, video_id: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(video_id);
        }
        url
    }
}

#[async_trait]
impl VideoLookup for HttpVideoClient {
    async fn fetch_video(&self, cx: &Context, video_id: &str) -> Result<Video, VideoError> {
        let url = self.video_url(video_id);

        let mut headers = HeaderMap::new();
        self.tracing.inject(cx, &mut headers);

        let response = self
            .http
            .get(url.clone())
            .headers(headers)
            .send()
            .await
            .map_err(|e| VideoError::from_reqwest(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(VideoError::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| VideoError::from_reqwest(&url, e))?;

        serde_json::from_slice(&body).map_err(|source| VideoError::Decode {
            video_id: video_id.to_string(),
            source,
        })
    }
}
