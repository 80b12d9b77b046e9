//! Episode progress write-back
//!
//! `PersistencePolicy` decides, per transport transition, whether the active
//! episode's progress is written. Writes fire only on entry into `Paused` or
//! `Stopped`; ticks and steady `Playing` never write.
//!
//! `PositionWriter` performs the writes on its own task, in submission order,
//! so the derived state never waits on the catalog.

use crate::catalog::Catalog;
use castaway_common::events::{CastawayEvent, EventBus, TransportState};
use castaway_common::{Episode, PlaybackPosition};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Duration written when neither the track nor the catalog knows one
pub const MIN_PERSISTED_DURATION_MS: i64 = 1;

/// Edge detector over transport transitions
#[derive(Debug, Default)]
pub struct PersistencePolicy {
    last: Option<TransportState>,
}

impl PersistencePolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a transport state; true when it is an entry into Paused/Stopped
    pub fn observe(&mut self, state: TransportState) -> bool {
        let previous = self.last.replace(state);
        is_store_state(state) && previous != Some(state)
    }
}

fn is_store_state(state: TransportState) -> bool {
    matches!(state, TransportState::Paused | TransportState::Stopped)
}

/// Copy of `episode` carrying the progress to persist
///
/// Duration falls back from the track-reported value to the previously
/// persisted one, and finally to [`MIN_PERSISTED_DURATION_MS`].
pub fn build_write(episode: &Episode, position_ms: i64, track_duration: Option<i64>) -> Episode {
    let duration = track_duration
        .filter(|d| *d > 0)
        .or(Some(episode.playback_position.duration).filter(|d| *d > 0))
        .unwrap_or(MIN_PERSISTED_DURATION_MS);

    episode.with_progress(PlaybackPosition::new(position_ms, duration))
}

/// Handle to the ordered write-back task
#[derive(Debug, Clone)]
pub struct PositionWriter {
    tx: mpsc::UnboundedSender<Episode>,
}

impl PositionWriter {
    /// Spawn the writer task
    ///
    /// The task exits once every `PositionWriter` clone is dropped and the
    /// queue is drained.
    pub fn spawn(catalog: Arc<dyn Catalog>, events: Arc<EventBus>) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run_writer(rx, catalog, events));
        (Self { tx }, handle)
    }

    /// Queue a write; returns false if the writer task is gone
    pub fn submit(&self, episode: Episode) -> bool {
        self.tx.send(episode).is_ok()
    }
}

async fn run_writer(
    mut rx: mpsc::UnboundedReceiver<Episode>,
    catalog: Arc<dyn Catalog>,
    events: Arc<EventBus>,
) {
    while let Some(episode) = rx.recv().await {
        let episode_id = episode.id.clone();
        match catalog.save_episode(episode).await {
            Ok(saved) => {
                debug!(
                    "Stored progress for {}: {}/{} ms",
                    saved.id, saved.playback_position.position, saved.playback_position.duration
                );
                events.emit_lossy(CastawayEvent::EpisodeSaved {
                    episode_id: saved.id,
                    position_ms: saved.playback_position.position,
                    duration_ms: saved.playback_position.duration,
                    timestamp: chrono::Utc::now(),
                });
            }
            Err(e) => {
                warn!("Failed to store progress for {}: {}", episode_id, e);
                events.emit_lossy(CastawayEvent::EpisodeSaveFailed {
                    episode_id,
                    reason: e.to_string(),
                    timestamp: chrono::Utc::now(),
                });
            }
        }
    }
    debug!("Position writer stopped");
}
