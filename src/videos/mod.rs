//! Downstream video service integration.

pub mod client;

pub use client::{HttpVideoClient, VideoClientError, VideoError, VideoLookup};
