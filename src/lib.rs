//! Playlists API
//!
//! Serves the stored playlists with every video reference replaced by the
//! full record from the video service.
//!
//! ```text
//!   GET /  ──▶ http ──▶ playlists::store ──▶ Redis "playlists"
//!                │
//!                └────▶ enrichment ──▶ videos::client ──▶ videos-api /{id}
//!                         (one child span per call, B3 headers injected)
//! ```

pub mod config;
pub mod enrichment;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod playlists;
pub mod videos;

pub use config::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
