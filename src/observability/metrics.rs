//! Metrics collection and exposition.
//!
//! # Metrics
//! - `playlists_requests_total` (counter): requests by response status
//! - `playlists_request_duration_seconds` (histogram): end-to-end latency
//! - `playlists_store_fallback_total` (counter): store failures served as `[]`
//! - `videos_fetch_total` (counter): video calls by outcome
//!
//! Recording is a no-op until [`init_metrics`] installs the Prometheus
//! recorder.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Outcome label for `videos_fetch_total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Ok,
    Transport,
    Decode,
}

impl FetchOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            FetchOutcome::Ok => "ok",
            FetchOutcome::Transport => "transport",
            FetchOutcome::Decode => "decode",
        }
    }
}

/// Install the Prometheus recorder and serve it on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(status: u16, start: Instant) {
    metrics::counter!("playlists_requests_total", "status" => status.to_string()).increment(1);
    metrics::histogram!("playlists_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_store_fallback() {
    metrics::counter!("playlists_store_fallback_total").increment(1);
}

pub fn record_video_fetch(outcome: FetchOutcome) {
    metrics::counter!("videos_fetch_total", "outcome" => outcome.as_str()).increment(1);
}
