//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace logging, timeout, CORS)
//!     → handlers.rs (server span, store fetch, enrichment, JSON body)
//!     → error.rs (malformed payloads → 500)
//!     → Send to client
//! ```

pub mod cors;
pub mod error;
pub mod handlers;
pub mod server;

pub use error::ApiError;
pub use server::{AppState, HttpServer};
