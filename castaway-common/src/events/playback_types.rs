//! Playback-related type definitions
//!
//! Types reported by (or handed to) the playback engine: transport state,
//! the currently loaded track, and the items prepared for playback.

use serde::{Deserialize, Serialize};

use crate::models::Episode;

/// Duration value an engine reports while the length of a track is not yet known
pub const UNKNOWN_DURATION_MS: i64 = -1;

/// Transport state as reported by the playback engine
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransportState {
    /// Nothing loaded
    #[default]
    Idle,
    /// Item is being loaded/buffered
    Preparing,
    /// Item loaded and ready to start
    Prepared,
    Playing,
    Paused,
    Stopped,
    /// Engine reported a playback error
    Error,
}

impl TransportState {
    /// True when an item is loaded and ready to render.
    ///
    /// A playing or paused transport has necessarily been prepared.
    pub fn is_prepared(&self) -> bool {
        matches!(
            self,
            TransportState::Prepared | TransportState::Playing | TransportState::Paused
        )
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, TransportState::Playing)
    }
}

impl std::fmt::Display for TransportState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportState::Idle => write!(f, "idle"),
            TransportState::Preparing => write!(f, "preparing"),
            TransportState::Prepared => write!(f, "prepared"),
            TransportState::Playing => write!(f, "playing"),
            TransportState::Paused => write!(f, "paused"),
            TransportState::Stopped => write!(f, "stopped"),
            TransportState::Error => write!(f, "error"),
        }
    }
}

/// Transport update: the new state plus the position at which it happened
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TransportSnapshot {
    pub state: TransportState,
    pub position_ms: i64,
}

impl TransportSnapshot {
    pub fn new(state: TransportState, position_ms: i64) -> Self {
        Self { state, position_ms }
    }
}

/// The engine's view of the currently loaded media item
///
/// An empty `media_id` means nothing is loaded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TrackData {
    pub media_id: String,
    #[serde(default)]
    pub media_uri: String,
    #[serde(default)]
    pub display_title: String,
    #[serde(default)]
    pub display_subtitle: String,
    #[serde(default)]
    pub display_icon_uri: Option<String>,
    /// Latest position tick, filled in by the merge
    #[serde(default)]
    pub position_ms: i64,
    /// `None` or [`UNKNOWN_DURATION_MS`] while the length is unknown
    #[serde(default)]
    pub duration: Option<i64>,
}

impl TrackData {
    /// True when the engine reports no active media
    pub fn is_empty(&self) -> bool {
        self.media_id.is_empty()
    }

    /// Track duration if the engine knows it
    pub fn known_duration(&self) -> Option<i64> {
        self.duration.filter(|d| *d != UNKNOWN_DURATION_MS)
    }
}

/// One item handed to the engine's `prepare` call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaItem {
    pub media_id: String,
    pub media_uri: String,
    pub display_title: String,
    #[serde(default)]
    pub display_subtitle: String,
    #[serde(default)]
    pub display_description: String,
    #[serde(default)]
    pub display_icon_uri: Option<String>,
    /// Resume position in milliseconds
    #[serde(default)]
    pub playback_position: i64,
    #[serde(default)]
    pub duration: i64,
}

impl From<&Episode> for MediaItem {
    fn from(episode: &Episode) -> Self {
        Self {
            media_id: episode.id.clone(),
            media_uri: episode.audio_url.clone(),
            display_title: episode.title.clone(),
            display_subtitle: episode.subtitle.clone().unwrap_or_default(),
            display_description: episode.description.clone(),
            display_icon_uri: episode.image_url.clone(),
            playback_position: episode.playback_position.position,
            duration: episode.playback_position.duration,
        }
    }
}
