//! Event types for the Castaway event system
//!
//! Provides the shared event definitions and the EventBus used by the
//! playback coordinator to announce what it did.

mod playback_types;

pub use playback_types::{
    MediaItem, TrackData, TransportSnapshot, TransportState, UNKNOWN_DURATION_MS,
};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Where a loaded catalog came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogSource {
    /// Previously stored copy
    Cached,
    /// Freshly fetched and stored
    Fetched,
}

/// Castaway event types
///
/// Events are broadcast via EventBus and serialized for SSE transmission.
/// They are notifications only; the derived playback state itself is
/// published on its own watch channels.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CastawayEvent {
    /// Engine connection came up or went down
    ConnectionChanged {
        connected: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Transport state transition reported by the engine
    TransportChanged {
        old_state: TransportState,
        new_state: TransportState,
        position_ms: i64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Now-playing projection changed episode or play/pause variant
    ///
    /// Position-only updates are not announced here.
    NowPlayingChanged {
        /// None when the projection carries no episode (Loading/Buffering/Played)
        episode_id: Option<String>,
        playing: bool,
        position_ms: i64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Playback speed applied
    SpeedChanged {
        speed: f32,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Catalog loaded for the configured feed
    CatalogLoaded {
        feed_url: String,
        episode_count: usize,
        source: CatalogSource,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Neither the stored copy nor a fresh fetch produced a catalog
    CatalogLoadFailed {
        feed_url: String,
        reason: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Episode progress written back to the catalog
    EpisodeSaved {
        episode_id: String,
        position_ms: i64,
        duration_ms: i64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Progress write-back failed (not retried)
    EpisodeSaveFailed {
        episode_id: String,
        reason: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// An intent was dropped because the engine is not connected
    IntentDropped {
        intent: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

/// Central event distribution bus
///
/// One-to-many broadcast of [`CastawayEvent`]s built on `tokio::sync::broadcast`.
/// Slow subscribers lag and lose the oldest events rather than blocking the
/// coordinator.
#[derive(Debug)]
pub struct EventBus {
    tx: broadcast::Sender<CastawayEvent>,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Examples
    ///
    /// ```
    /// use castaway_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(256);
    /// let mut rx = event_bus.subscribe();
    /// assert!(rx.try_recv().is_err());
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<CastawayEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: CastawayEvent) {
        let _ = self.tx.send(event);
    }
}
