//! In-process playback engine
//!
//! Simulates transport behaviour without producing audio: it keeps a list of
//! prepared items, advances the position on a speed-scaled timer while
//! playing, and publishes everything on watch channels. Used for headless
//! runs of the player.

use super::{EngineSignals, PlaybackEngine};
use async_trait::async_trait;
use castaway_common::events::{
    MediaItem, TrackData, TransportSnapshot, TransportState, UNKNOWN_DURATION_MS,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

/// Loopback engine timing and step sizes
#[derive(Debug, Clone)]
pub struct LoopbackConfig {
    pub tick_interval: Duration,
    pub fast_forward_ms: i64,
    pub rewind_ms: i64,
}

impl Default for LoopbackConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(500),
            fast_forward_ms: 30_000,
            rewind_ms: 10_000,
        }
    }
}

/// Transport bookkeeping
#[derive(Debug)]
struct Transport {
    items: Vec<MediaItem>,
    current: Option<usize>,
    position_ms: i64,
    state: TransportState,
    speed: f32,
}

impl Transport {
    fn current_item(&self) -> Option<&MediaItem> {
        self.current.and_then(|i| self.items.get(i))
    }

    /// Known length of the active item
    fn duration(&self) -> Option<i64> {
        self.current_item()
            .map(|item| item.duration)
            .filter(|d| *d > 0)
    }

    fn clamp(&self, position_ms: i64) -> i64 {
        match self.duration() {
            Some(duration) => position_ms.clamp(0, duration),
            None => position_ms.max(0),
        }
    }
}

struct Signals {
    connected: watch::Sender<bool>,
    position_ms: watch::Sender<i64>,
    now_playing: watch::Sender<TrackData>,
    transport: watch::Sender<TransportSnapshot>,
}

struct Inner {
    config: LoopbackConfig,
    signals: Signals,
    transport: Mutex<Transport>,
    ticker: std::sync::Mutex<Option<CancellationToken>>,
}

/// Loopback playback engine
#[derive(Clone)]
pub struct LoopbackEngine {
    inner: Arc<Inner>,
}

impl LoopbackEngine {
    pub fn new(config: LoopbackConfig) -> Self {
        let (connected, _) = watch::channel(false);
        let (position_ms, _) = watch::channel(0);
        let (now_playing, _) = watch::channel(TrackData::default());
        let (transport, _) = watch::channel(TransportSnapshot::default());

        Self {
            inner: Arc::new(Inner {
                config,
                signals: Signals {
                    connected,
                    position_ms,
                    now_playing,
                    transport,
                },
                transport: Mutex::new(Transport {
                    items: Vec::new(),
                    current: None,
                    position_ms: 0,
                    state: TransportState::Idle,
                    speed: 1.0,
                }),
                ticker: std::sync::Mutex::new(None),
            }),
        }
    }

    /// Current rate applied to the position timer
    pub async fn speed(&self) -> f32 {
        self.inner.transport.lock().await.speed
    }

    /// Ids of the prepared items
    pub async fn prepared_ids(&self) -> Vec<String> {
        let transport = self.inner.transport.lock().await;
        transport.items.iter().map(|i| i.media_id.clone()).collect()
    }

    fn start_ticker(&self) {
        let mut ticker = self.inner.ticker.lock().unwrap_or_else(|p| p.into_inner());
        if ticker.is_some() {
            return;
        }

        let token = CancellationToken::new();
        let inner = self.inner.clone();
        let cancel = token.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(inner.config.tick_interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = interval.tick() => inner.tick().await,
                }
            }
            debug!("Loopback ticker stopped");
        });
        *ticker = Some(token);
    }

    fn stop_ticker(&self) {
        let token = self
            .inner
            .ticker
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .take();
        if let Some(token) = token {
            token.cancel();
        }
    }
}

impl Default for LoopbackEngine {
    fn default() -> Self {
        Self::new(LoopbackConfig::default())
    }
}

impl Inner {
    async fn tick(&self) {
        let mut transport = self.transport.lock().await;
        if transport.state != TransportState::Playing {
            return;
        }

        let step = (self.config.tick_interval.as_millis() as f64 * transport.speed as f64) as i64;
        let position = transport.position_ms + step;

        match transport.duration() {
            Some(duration) if position >= duration => {
                transport.position_ms = duration;
                transport.state = TransportState::Stopped;
                debug!(
                    "Loopback reached end of {:?}",
                    transport.current_item().map(|i| &i.media_id)
                );
                self.publish_position(&transport);
                self.publish_transport(&transport);
            }
            _ => {
                transport.position_ms = position;
                trace!("Loopback tick {} ms", position);
                self.publish_position(&transport);
            }
        }
    }

    fn publish_position(&self, transport: &Transport) {
        self.signals.position_ms.send_replace(transport.position_ms);
    }

    fn publish_transport(&self, transport: &Transport) {
        self.signals
            .transport
            .send_replace(TransportSnapshot::new(transport.state, transport.position_ms));
    }

    fn publish_track(&self, transport: &Transport) {
        let track = match transport.current_item() {
            Some(item) => TrackData {
                media_id: item.media_id.clone(),
                media_uri: item.media_uri.clone(),
                display_title: item.display_title.clone(),
                display_subtitle: item.display_subtitle.clone(),
                display_icon_uri: item.display_icon_uri.clone(),
                position_ms: transport.position_ms,
                duration: Some(transport.duration().unwrap_or(UNKNOWN_DURATION_MS)),
            },
            None => TrackData::default(),
        };
        self.signals.now_playing.send_replace(track);
    }

    /// Make item `index` active and start playing it from its resume point
    fn start_item(&self, transport: &mut Transport, index: usize) {
        transport.current = Some(index);
        transport.position_ms = transport
            .current_item()
            .map(|item| item.playback_position)
            .unwrap_or(0);
        transport.position_ms = transport.clamp(transport.position_ms);
        if transport.duration() == Some(transport.position_ms) {
            transport.position_ms = 0;
        }
        transport.state = TransportState::Playing;

        self.publish_track(transport);
        self.publish_position(transport);
        self.publish_transport(transport);
    }

    fn move_to(&self, transport: &mut Transport, position_ms: i64) {
        transport.position_ms = transport.clamp(position_ms);
        self.publish_position(transport);
        self.publish_transport(transport);
    }
}

#[async_trait]
impl PlaybackEngine for LoopbackEngine {
    fn signals(&self) -> EngineSignals {
        EngineSignals {
            connected: self.inner.signals.connected.subscribe(),
            position_ms: self.inner.signals.position_ms.subscribe(),
            now_playing: self.inner.signals.now_playing.subscribe(),
            transport: self.inner.signals.transport.subscribe(),
        }
    }

    async fn prepare(&self, items: Vec<MediaItem>) {
        let mut transport = self.inner.transport.lock().await;
        let active_id = transport.current_item().map(|i| i.media_id.clone());
        debug!("Loopback prepared {} items", items.len());
        transport.items = items;

        transport.current = active_id
            .and_then(|id| transport.items.iter().position(|i| i.media_id == id));
        if transport.current.is_none() && transport.state != TransportState::Idle {
            transport.state = TransportState::Idle;
            transport.position_ms = 0;
            self.inner.publish_track(&transport);
            self.inner.publish_position(&transport);
            self.inner.publish_transport(&transport);
        }
    }

    async fn play_by_id(&self, media_id: &str) {
        let mut transport = self.inner.transport.lock().await;

        let is_active = transport.current_item().map(|i| i.media_id.as_str()) == Some(media_id);
        if is_active {
            match transport.state {
                TransportState::Playing => transport.state = TransportState::Paused,
                TransportState::Stopped => {
                    if let Some(index) = transport.current {
                        self.inner.start_item(&mut transport, index);
                    }
                    return;
                }
                _ => transport.state = TransportState::Playing,
            }
            debug!("Loopback {} -> {}", media_id, transport.state);
            self.inner.publish_transport(&transport);
            return;
        }

        match transport.items.iter().position(|i| i.media_id == media_id) {
            Some(index) => {
                debug!("Loopback playing {}", media_id);
                self.inner.start_item(&mut transport, index);
            }
            None => warn!("Loopback has no prepared item {}", media_id),
        }
    }

    async fn fast_forward(&self) {
        let mut transport = self.inner.transport.lock().await;
        if transport.current.is_some() {
            let target = transport.position_ms + self.inner.config.fast_forward_ms;
            self.inner.move_to(&mut transport, target);
        }
    }

    async fn rewind(&self) {
        let mut transport = self.inner.transport.lock().await;
        if transport.current.is_some() {
            let target = transport.position_ms - self.inner.config.rewind_ms;
            self.inner.move_to(&mut transport, target);
        }
    }

    async fn skip_next(&self) {
        let mut transport = self.inner.transport.lock().await;
        if let Some(index) = transport.current {
            if index + 1 < transport.items.len() {
                self.inner.start_item(&mut transport, index + 1);
            }
        }
    }

    async fn skip_previous(&self) {
        let mut transport = self.inner.transport.lock().await;
        if let Some(index) = transport.current {
            if index > 0 {
                self.inner.start_item(&mut transport, index - 1);
            }
        }
    }

    async fn seek_to(&self, position_ms: i64) {
        let mut transport = self.inner.transport.lock().await;
        if transport.current.is_some() {
            self.inner.move_to(&mut transport, position_ms);
        }
    }

    async fn set_speed(&self, speed: f32) {
        if !speed.is_finite() || speed <= 0.0 {
            warn!("Loopback ignoring speed {}", speed);
            return;
        }
        self.inner.transport.lock().await.speed = speed;
    }

    async fn subscribe(&self, root_id: &str) {
        info!("Loopback engine subscribed to {}", root_id);
        self.start_ticker();
        self.inner.signals.connected.send_replace(true);
    }

    async fn unsubscribe(&self, root_id: &str) {
        info!("Loopback engine unsubscribed from {}", root_id);
        self.stop_ticker();
        self.inner.signals.connected.send_replace(false);
    }
}
