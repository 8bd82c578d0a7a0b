//! Playlists subsystem.
//!
//! # Data Flow
//! ```text
//! Redis key "playlists" (JSON array)
//!     → store.rs (GET under a redis-get span, fail-open)
//!     → types.rs (StoredPlaylist with VideoRef entries)
//! ```

pub mod store;
pub mod types;

pub use store::{KeyValueStore, PlaylistStore, RedisStore, StoreError};
pub use types::{EnrichedPlaylist, Playlist, StoredPlaylist, Video, VideoRef};
