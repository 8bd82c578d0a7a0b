//! Route handlers.

use std::time::Instant;

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use opentelemetry::{Context, KeyValue};

use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::observability::tracing::SERVER_SPAN;

/// `GET /`: stored playlists with their videos filled in.
pub async fn list_playlists(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let start_time = Instant::now();
    let span = state.tracing.start_server_span(SERVER_SPAN, &headers);
    span.set_attribute(KeyValue::new("http.method", "GET"));
    span.set_attribute(KeyValue::new("http.route", "/"));

    let response = match serve_playlists(&state, span.context()).await {
        Ok(response) => response,
        Err(e) => {
            span.record_error(e.to_string());
            e.into_response()
        }
    };

    let status = response.status().as_u16();
    span.set_attribute(KeyValue::new("http.status_code", i64::from(status)));
    metrics::record_request(status, start_time);
    response
}

async fn serve_playlists(state: &AppState, cx: &Context) -> Result<Response, ApiError> {
    let stored = state.store.fetch_playlists(cx).await;
    let playlists = state.aggregator.enrich(cx, stored).await?;
    let body = serde_json::to_vec(&playlists).map_err(ApiError::Encode)?;

    tracing::debug!(playlists = playlists.len(), bytes = body.len(), "Serving playlists");
    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}

/// `OPTIONS /`: advertise the allowed methods.
pub async fn preflight() -> impl IntoResponse {
    (StatusCode::OK, [(header::ALLOW, "GET, OPTIONS")])
}
