//! Scriptable playback engine that records control calls

use async_trait::async_trait;
use castaway_common::events::{MediaItem, TrackData, TransportSnapshot, TransportState};
use castaway_player::engine::{EngineSignals, PlaybackEngine};
use std::sync::Mutex;
use tokio::sync::watch;

/// One control call received by the engine
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Prepare(Vec<String>),
    PlayById(String),
    FastForward,
    Rewind,
    SkipNext,
    SkipPrevious,
    SeekTo(i64),
    SetSpeed(f32),
    Subscribe(String),
    Unsubscribe(String),
}

/// Engine whose signals are driven by the test
pub struct RecordingEngine {
    connected: watch::Sender<bool>,
    position_ms: watch::Sender<i64>,
    track: watch::Sender<TrackData>,
    transport: watch::Sender<TransportSnapshot>,
    calls: Mutex<Vec<EngineCall>>,
    connect_on_subscribe: bool,
}

impl RecordingEngine {
    /// Engine that reports `connected` as soon as it is subscribed
    pub fn new() -> Self {
        Self::build(true)
    }

    /// Engine that only connects when the test says so
    pub fn manual() -> Self {
        Self::build(false)
    }

    fn build(connect_on_subscribe: bool) -> Self {
        Self {
            connected: watch::channel(false).0,
            position_ms: watch::channel(0).0,
            track: watch::channel(TrackData::default()).0,
            transport: watch::channel(TransportSnapshot::default()).0,
            calls: Mutex::new(Vec::new()),
            connect_on_subscribe,
        }
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.send_replace(connected);
    }

    pub fn set_position(&self, position_ms: i64) {
        self.position_ms.send_replace(position_ms);
    }

    pub fn set_track(&self, media_id: &str, duration: Option<i64>) {
        self.track.send_replace(TrackData {
            media_id: media_id.to_string(),
            display_title: media_id.to_string(),
            duration,
            ..Default::default()
        });
    }

    pub fn set_transport(&self, state: TransportState, position_ms: i64) {
        self.transport
            .send_replace(TransportSnapshot::new(state, position_ms));
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls other than subscribe/unsubscribe/prepare
    pub fn control_calls(&self) -> Vec<EngineCall> {
        self.calls()
            .into_iter()
            .filter(|call| {
                !matches!(
                    call,
                    EngineCall::Subscribe(_) | EngineCall::Unsubscribe(_) | EngineCall::Prepare(_)
                )
            })
            .collect()
    }

    fn record(&self, call: EngineCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl PlaybackEngine for RecordingEngine {
    fn signals(&self) -> EngineSignals {
        EngineSignals {
            connected: self.connected.subscribe(),
            position_ms: self.position_ms.subscribe(),
            now_playing: self.track.subscribe(),
            transport: self.transport.subscribe(),
        }
    }

    async fn prepare(&self, items: Vec<MediaItem>) {
        self.record(EngineCall::Prepare(
            items.into_iter().map(|item| item.media_id).collect(),
        ));
    }

    async fn play_by_id(&self, media_id: &str) {
        self.record(EngineCall::PlayById(media_id.to_string()));
    }

    async fn fast_forward(&self) {
        self.record(EngineCall::FastForward);
    }

    async fn rewind(&self) {
        self.record(EngineCall::Rewind);
    }

    async fn skip_next(&self) {
        self.record(EngineCall::SkipNext);
    }

    async fn skip_previous(&self) {
        self.record(EngineCall::SkipPrevious);
    }

    async fn seek_to(&self, position_ms: i64) {
        self.record(EngineCall::SeekTo(position_ms));
    }

    async fn set_speed(&self, speed: f32) {
        self.record(EngineCall::SetSpeed(speed));
    }

    async fn subscribe(&self, root_id: &str) {
        self.record(EngineCall::Subscribe(root_id.to_string()));
        if self.connect_on_subscribe {
            self.set_connected(true);
        }
    }

    async fn unsubscribe(&self, root_id: &str) {
        self.record(EngineCall::Unsubscribe(root_id.to_string()));
        self.set_connected(false);
    }
}
