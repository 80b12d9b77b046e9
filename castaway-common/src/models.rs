//! Catalog models
//!
//! Feeds and episodes as stored by the catalog. The player only ever holds
//! value copies of these; the catalog owns the canonical records.

use serde::{Deserialize, Serialize};

/// Saved listening progress of an episode, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlaybackPosition {
    pub position: i64,
    pub duration: i64,
}

impl PlaybackPosition {
    pub fn new(position: i64, duration: i64) -> Self {
        Self { position, duration }
    }
}

/// One podcast episode as known to the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    /// Stable identifier, also used as the engine media id
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub description: String,
    pub audio_url: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub playback_position: PlaybackPosition,
    /// Ordinal index of the episode within its feed
    #[serde(default)]
    pub episode: i64,
    pub podcast_url: String,
}

impl Episode {
    /// Copy of this episode with its saved progress replaced
    pub fn with_progress(&self, playback_position: PlaybackPosition) -> Self {
        Self {
            playback_position,
            ..self.clone()
        }
    }
}

/// Feed-level metadata
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FeedInfo {
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
}

/// A feed together with its episodes
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FeedData {
    pub info: FeedInfo,
    #[serde(default)]
    pub episodes: Vec<Episode>,
}

impl FeedData {
    /// Look up an episode by id
    pub fn episode(&self, id: &str) -> Option<&Episode> {
        self.episodes.iter().find(|episode| episode.id == id)
    }
}
