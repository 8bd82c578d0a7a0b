//! Enrichment subsystem.
//!
//! # Data Flow
//! ```text
//! Vec<StoredPlaylist> (video references)
//!     → aggregator.rs (one video call per reference, child span each)
//!     → Vec<EnrichedPlaylist> (full video records, possibly truncated)
//! ```

pub mod aggregator;

pub use aggregator::{Aggregator, EnrichError};
