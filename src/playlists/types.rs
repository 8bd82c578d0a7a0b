//! Playlist and video records.
//!
//! Decoding is lenient: missing or `null` strings become `""`, a missing or
//! `null` `videos` list becomes empty, and unknown fields are ignored.

use serde::{Deserialize, Deserializer, Serialize};

/// A named, ordered list of videos.
///
/// Generic over its entries so the stored form ([`StoredPlaylist`]) and the
/// enriched form ([`EnrichedPlaylist`]) share one shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(deserialize = "V: Deserialize<'de>"))]
pub struct Playlist<V> {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    #[serde(default = "Vec::new", deserialize_with = "null_as_empty")]
    pub videos: Vec<V>,
}

/// Playlist as held in the store: videos are bare references.
pub type StoredPlaylist = Playlist<VideoRef>;

/// Playlist as served: videos are full records.
pub type EnrichedPlaylist = Playlist<Video>;

impl<V> Playlist<V> {
    /// Swap the video entries, keeping identity and name.
    pub fn with_videos<W>(self, videos: Vec<W>) -> Playlist<W> {
        Playlist {
            id: self.id,
            name: self.name,
            videos,
        }
    }
}

/// Minimal video identifier found in stored playlists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRef {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
}

impl From<&str> for VideoRef {
    fn from(id: &str) -> Self {
        Self { id: id.to_string() }
    }
}

/// Full video record returned by the video service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Video {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(rename = "imageurl", deserialize_with = "null_as_default")]
    pub image_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub url: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
