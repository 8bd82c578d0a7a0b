//! Error responses.
//!
//! Store failures never get here (they are served as `[]`) and transport
//! failures only truncate playlists. What remains are malformed payloads,
//! answered with a 500 and a JSON error body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::enrichment::EnrichError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Enrichment(#[from] EnrichError),

    #[error("failed to encode response: {0}")]
    Encode(#[source] serde_json::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "Request failed");
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
