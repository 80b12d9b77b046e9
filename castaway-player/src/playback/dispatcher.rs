//! User intent queue
//!
//! Any number of producers submit [`UiEvent`]s through an [`EventDispatcher`];
//! exactly one consumer (the coordinator task) drains the [`EventQueue`] and
//! handles each event to completion before taking the next.

use castaway_common::events::MediaItem;
use castaway_common::Episode;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// User intents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum UiEvent {
    /// Hand the catalog to the engine; buffered until connected
    PrepareCatalog(Vec<MediaItem>),
    PlayPause(String),
    SkipNext,
    SkipPrevious,
    FastForward,
    Rewind,
    SeekTo(i64),
    /// Step to the next rate of the speed cycle
    ChangeSpeed,
    /// Explicit playback rate
    SetSpeed(f32),
    /// Scrubber moved (milliseconds)
    EditingPosition(i64),
    /// Scrubbing started/stopped
    EditingFlag(bool),
    EpisodeClicked(Episode),
    MediaItemClicked(String),
}

impl UiEvent {
    /// Short name for logs and notifications
    pub fn name(&self) -> &'static str {
        match self {
            UiEvent::PrepareCatalog(_) => "prepare_catalog",
            UiEvent::PlayPause(_) => "play_pause",
            UiEvent::SkipNext => "skip_next",
            UiEvent::SkipPrevious => "skip_previous",
            UiEvent::FastForward => "fast_forward",
            UiEvent::Rewind => "rewind",
            UiEvent::SeekTo(_) => "seek_to",
            UiEvent::ChangeSpeed => "change_speed",
            UiEvent::SetSpeed(_) => "set_speed",
            UiEvent::EditingPosition(_) => "editing_position",
            UiEvent::EditingFlag(_) => "editing_flag",
            UiEvent::EpisodeClicked(_) => "episode_clicked",
            UiEvent::MediaItemClicked(_) => "media_item_clicked",
        }
    }

    /// True for intents that are dropped while the engine is disconnected
    ///
    /// `PrepareCatalog` is buffered instead; editing intents only touch
    /// local state.
    pub fn requires_connection(&self) -> bool {
        match self {
            UiEvent::PrepareCatalog(_)
            | UiEvent::EditingPosition(_)
            | UiEvent::EditingFlag(_) => false,
            UiEvent::PlayPause(_)
            | UiEvent::SkipNext
            | UiEvent::SkipPrevious
            | UiEvent::FastForward
            | UiEvent::Rewind
            | UiEvent::SeekTo(_)
            | UiEvent::ChangeSpeed
            | UiEvent::SetSpeed(_)
            | UiEvent::EpisodeClicked(_)
            | UiEvent::MediaItemClicked(_) => true,
        }
    }
}

/// Producer handle (cheap to clone)
#[derive(Debug, Clone)]
pub struct EventDispatcher {
    tx: mpsc::UnboundedSender<UiEvent>,
}

/// Consumer side, owned by the coordinator task
#[derive(Debug)]
pub struct EventQueue {
    rx: mpsc::UnboundedReceiver<UiEvent>,
}

/// Create a connected producer/consumer pair
pub fn event_channel() -> (EventDispatcher, EventQueue) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventDispatcher { tx }, EventQueue { rx })
}

impl EventDispatcher {
    /// Enqueue an intent; returns false once the consumer is gone
    pub fn submit(&self, event: UiEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

impl EventQueue {
    /// Next intent in arrival order; `None` when every producer is gone
    pub async fn recv(&mut self) -> Option<UiEvent> {
        self.rx.recv().await
    }

    /// Stop accepting intents and drop whatever is still queued
    pub fn close_and_discard(&mut self) -> usize {
        self.rx.close();
        let mut dropped = 0;
        while self.rx.try_recv().is_ok() {
            dropped += 1;
        }
        dropped
    }
}

/// Catalog preparation waiting for the engine to connect
///
/// Only the most recent request is kept.
#[derive(Debug, Default)]
pub struct PendingPrepare {
    items: Option<Vec<MediaItem>>,
}

impl PendingPrepare {
    pub fn store(&mut self, items: Vec<MediaItem>) {
        self.items = Some(items);
    }

    pub fn take(&mut self) -> Option<Vec<MediaItem>> {
        self.items.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str) -> MediaItem {
        MediaItem {
            media_id: id.to_string(),
            media_uri: format!("file:///{}.mp3", id),
            display_title: id.to_string(),
            display_subtitle: String::new(),
            display_description: String::new(),
            display_icon_uri: None,
            playback_position: 0,
            duration: 1,
        }
    }

    #[tokio::test]
    async fn test_queue_preserves_submission_order() {
        let (dispatcher, mut queue) = event_channel();
        let other = dispatcher.clone();

        assert!(dispatcher.submit(UiEvent::SeekTo(1000)));
        assert!(other.submit(UiEvent::ChangeSpeed));
        assert!(dispatcher.submit(UiEvent::SeekTo(2000)));

        assert_eq!(queue.recv().await, Some(UiEvent::SeekTo(1000)));
        assert_eq!(queue.recv().await, Some(UiEvent::ChangeSpeed));
        assert_eq!(queue.recv().await, Some(UiEvent::SeekTo(2000)));
    }

    #[tokio::test]
    async fn test_close_discards_pending() {
        let (dispatcher, mut queue) = event_channel();
        dispatcher.submit(UiEvent::SkipNext);
        dispatcher.submit(UiEvent::SkipPrevious);

        assert_eq!(queue.close_and_discard(), 2);
        assert!(!dispatcher.submit(UiEvent::Rewind));
        assert_eq!(queue.recv().await, None);
    }

    #[test]
    fn test_pending_prepare_keeps_latest() {
        let mut pending = PendingPrepare::default();
        assert!(pending.take().is_none());

        pending.store(vec![item("a")]);
        pending.store(vec![item("b"), item("c")]);

        let items = pending.take().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].media_id, "b");
        assert!(pending.take().is_none());
    }

    #[test]
    fn test_connection_guard_classification() {
        assert!(!UiEvent::PrepareCatalog(vec![]).requires_connection());
        assert!(!UiEvent::EditingFlag(true).requires_connection());
        assert!(!UiEvent::EditingPosition(5).requires_connection());
        assert!(UiEvent::SeekTo(5).requires_connection());
        assert!(UiEvent::ChangeSpeed.requires_connection());
        assert!(UiEvent::MediaItemClicked("x".to_string()).requires_connection());
    }

    #[test]
    fn test_ui_event_json_shape() {
        let event: UiEvent = serde_json::from_str(r#"{"type":"seek_to","value":1500}"#).unwrap();
        assert_eq!(event, UiEvent::SeekTo(1500));

        let event: UiEvent = serde_json::from_str(r#"{"type":"skip_next"}"#).unwrap();
        assert_eq!(event, UiEvent::SkipNext);

        let json = serde_json::to_value(UiEvent::PlayPause("e1".to_string())).unwrap();
        assert_eq!(json["type"], "play_pause");
        assert_eq!(json["value"], "e1");
    }
}
