//! Playback engine interface
//!
//! The engine decodes and renders audio; the coordinator only observes its
//! signals and issues fire-and-forget control calls.

pub mod loopback;

use async_trait::async_trait;
use castaway_common::events::{MediaItem, TrackData, TransportSnapshot};
use tokio::sync::watch;

pub use loopback::{LoopbackConfig, LoopbackEngine};

/// Engine-published signals
#[derive(Debug, Clone)]
pub struct EngineSignals {
    pub connected: watch::Receiver<bool>,
    pub position_ms: watch::Receiver<i64>,
    pub now_playing: watch::Receiver<TrackData>,
    pub transport: watch::Receiver<TransportSnapshot>,
}

/// Control surface of a playback engine
///
/// Calls report nothing back; their effects arrive through [`EngineSignals`].
#[async_trait]
pub trait PlaybackEngine: Send + Sync {
    /// Fresh receivers for every engine signal
    fn signals(&self) -> EngineSignals;

    /// Replace the list of playable items
    async fn prepare(&self, items: Vec<MediaItem>);

    /// Start the given item, or toggle play/pause if it is already active
    async fn play_by_id(&self, media_id: &str);

    async fn fast_forward(&self);

    async fn rewind(&self);

    async fn skip_next(&self);

    async fn skip_previous(&self);

    async fn seek_to(&self, position_ms: i64);

    async fn set_speed(&self, speed: f32);

    /// Attach to the media root; the engine reports `connected` once ready
    async fn subscribe(&self, root_id: &str);

    async fn unsubscribe(&self, root_id: &str);
}
