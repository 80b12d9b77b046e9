//! Playback coordinator
//!
//! Façade over the engine and the catalog. While subscribed, one task owns
//! all coordinator state and processes, one at a time:
//! - engine signal changes (through the [`SignalMerger`])
//! - user intents (through the [`EventQueue`])
//! - catalog load results
//!
//! Derived state is published on watch channels; notable transitions are
//! announced on the [`EventBus`].

use crate::catalog::Catalog;
use crate::engine::PlaybackEngine;
use crate::error::{Error, Result};
use crate::playback::dispatcher::{
    event_channel, EventDispatcher, EventQueue, PendingPrepare, UiEvent,
};
use crate::playback::matcher::match_episode;
use crate::playback::merge::{MergeInputs, PlaybackState, SignalChange, SignalMerger};
use crate::playback::now_playing::{NowPlayingEpisode, NowPlayingState, PodcastState};
use crate::playback::persistence::{build_write, PersistencePolicy, PositionWriter};
use crate::playback::speed::{SpeedController, DEFAULT_SPEED_RATES};
use castaway_common::events::{
    CastawayEvent, CatalogSource, EventBus, MediaItem, TransportSnapshot, TransportState,
};
use castaway_common::FeedData;
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

/// Media root the coordinator subscribes to when none is configured
pub const DEFAULT_MEDIA_ROOT_ID: &str = "castaway_root";

/// Coordinator settings
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Feed loaded on every engine connection
    pub feed_url: String,
    pub media_root_id: String,
    pub speed_rates: Vec<f32>,
    pub event_bus_capacity: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            feed_url: String::new(),
            media_root_id: DEFAULT_MEDIA_ROOT_ID.to_string(),
            speed_rates: DEFAULT_SPEED_RATES.to_vec(),
            event_bus_capacity: 100,
        }
    }
}

/// Published outputs, shared between the façade and the running task
#[derive(Debug)]
struct Outputs {
    playback: watch::Sender<PlaybackState>,
    now_playing: watch::Sender<NowPlayingState>,
    podcast: watch::Sender<PodcastState>,
    events: Arc<EventBus>,
}

/// Live subscription
struct Session {
    dispatcher: EventDispatcher,
    cancel: CancellationToken,
    task: JoinHandle<()>,
    writer: JoinHandle<()>,
}

/// Result of loading the configured feed
type LoadOutcome = std::result::Result<(FeedData, CatalogSource), String>;

/// Playback coordinator façade
pub struct PlaybackCoordinator {
    engine: Arc<dyn PlaybackEngine>,
    catalog: Arc<dyn Catalog>,
    config: CoordinatorConfig,
    speed: Arc<SpeedController>,
    outputs: Arc<Outputs>,
    session: Mutex<Option<Session>>,
}

impl PlaybackCoordinator {
    pub fn new(
        engine: Arc<dyn PlaybackEngine>,
        catalog: Arc<dyn Catalog>,
        config: CoordinatorConfig,
    ) -> Result<Self> {
        let speed = SpeedController::new(config.speed_rates.clone())?;
        let (playback, _) = watch::channel(PlaybackState {
            speed: speed.current(),
            ..Default::default()
        });
        let (now_playing, _) = watch::channel(NowPlayingState::Loading);
        let (podcast, _) = watch::channel(PodcastState::Loading);

        let outputs = Outputs {
            playback,
            now_playing,
            podcast,
            events: Arc::new(EventBus::new(config.event_bus_capacity)),
        };

        Ok(Self {
            engine,
            catalog,
            config,
            speed: Arc::new(speed),
            outputs: Arc::new(outputs),
            session: Mutex::new(None),
        })
    }

    /// Attach to the engine and start processing
    ///
    /// Must be called from within a tokio runtime.
    pub async fn subscribe(&self) -> Result<()> {
        {
            let mut session = self.lock_session();
            if session.is_some() {
                return Err(Error::InvalidState("coordinator already subscribed".to_string()));
            }

            let (dispatcher, queue) = event_channel();
            let cancel = CancellationToken::new();
            let (writer, writer_task) =
                PositionWriter::spawn(self.catalog.clone(), self.outputs.events.clone());

            let signals = self.engine.signals();
            let merger = SignalMerger::new(MergeInputs {
                connected: signals.connected,
                position_ms: signals.position_ms,
                track: signals.now_playing,
                transport: signals.transport,
                speed: self.speed.subscribe(),
            });

            let (load_tx, load_rx) = mpsc::unbounded_channel();
            let transport_state = merger.slots().transport.state;
            let mut policy = PersistencePolicy::new();
            policy.observe(transport_state);
            let task = CoordinatorTask {
                engine: self.engine.clone(),
                catalog: self.catalog.clone(),
                feed_url: self.config.feed_url.clone(),
                speed: self.speed.clone(),
                outputs: self.outputs.clone(),
                merger,
                queue,
                requeue: dispatcher.clone(),
                cancel: cancel.clone(),
                load_tx,
                load_rx,
                writer,
                policy,
                pending: PendingPrepare::default(),
                connected: false,
                editing: false,
                transport_state,
                now_playing: self.outputs.now_playing.borrow().clone(),
                podcast: self.outputs.podcast.borrow().clone(),
            };

            *session = Some(Session {
                dispatcher,
                cancel,
                task: tokio::spawn(task.run()),
                writer: writer_task,
            });
        }

        info!("Subscribing to media root {}", self.config.media_root_id);
        self.engine.subscribe(&self.config.media_root_id).await;
        Ok(())
    }

    /// Detach from the engine
    ///
    /// Queued intents are dropped. An intent already being handled runs to
    /// completion; queued progress writes still reach the catalog.
    pub async fn unsubscribe(&self) {
        let session = self.lock_session().take();
        let Some(session) = session else {
            debug!("Unsubscribe ignored: not subscribed");
            return;
        };

        session.cancel.cancel();
        drop(session.dispatcher);
        if let Err(e) = session.task.await {
            warn!("Coordinator task ended abnormally: {}", e);
        }

        info!("Unsubscribing from media root {}", self.config.media_root_id);
        self.engine.unsubscribe(&self.config.media_root_id).await;

        if let Err(e) = session.writer.await {
            warn!("Position writer ended abnormally: {}", e);
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.lock_session().is_some()
    }

    /// Queue a user intent; false when not subscribed
    pub fn submit_event(&self, event: UiEvent) -> bool {
        match self.lock_session().as_ref() {
            Some(session) => session.dispatcher.submit(event),
            None => {
                debug!("Intent {} rejected: coordinator not subscribed", event.name());
                false
            }
        }
    }

    pub fn playback_state(&self) -> watch::Receiver<PlaybackState> {
        self.outputs.playback.subscribe()
    }

    pub fn now_playing(&self) -> watch::Receiver<NowPlayingState> {
        self.outputs.now_playing.subscribe()
    }

    pub fn podcast_state(&self) -> watch::Receiver<PodcastState> {
        self.outputs.podcast.subscribe()
    }

    pub fn events(&self) -> broadcast::Receiver<CastawayEvent> {
        self.outputs.events.subscribe()
    }

    pub fn event_bus(&self) -> Arc<EventBus> {
        self.outputs.events.clone()
    }

    fn lock_session(&self) -> std::sync::MutexGuard<'_, Option<Session>> {
        self.session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Single writer for all coordinator state
struct CoordinatorTask {
    engine: Arc<dyn PlaybackEngine>,
    catalog: Arc<dyn Catalog>,
    feed_url: String,
    speed: Arc<SpeedController>,
    outputs: Arc<Outputs>,
    merger: SignalMerger,
    queue: EventQueue,
    /// Used to enqueue the catalog preparation behind already queued intents
    requeue: EventDispatcher,
    cancel: CancellationToken,
    load_tx: mpsc::UnboundedSender<LoadOutcome>,
    load_rx: mpsc::UnboundedReceiver<LoadOutcome>,
    writer: PositionWriter,
    policy: PersistencePolicy,
    pending: PendingPrepare,
    connected: bool,
    editing: bool,
    transport_state: TransportState,
    now_playing: NowPlayingState,
    podcast: PodcastState,
}

impl CoordinatorTask {
    async fn run(mut self) {
        debug!("Coordinator task started");
        self.publish_playback();

        if self.merger.slots().connected {
            self.on_connection(true).await;
        }

        loop {
            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => {
                    debug!("Coordinator task cancelled");
                    break;
                }

                changes = self.merger.next_changes() => match changes {
                    Some(changes) => self.on_signals(changes).await,
                    None => {
                        warn!("Engine signals closed, stopping coordinator task");
                        break;
                    }
                },

                Some(outcome) = self.load_rx.recv() => {
                    self.on_catalog_loaded(outcome).await;
                }

                event = self.queue.recv() => match event {
                    Some(event) => self.dispatch(event).await,
                    None => break,
                },
            }
        }

        let dropped = self.queue.close_and_discard();
        if dropped > 0 {
            debug!("Dropped {} pending intents on unsubscribe", dropped);
        }
    }

    // ------------------------------------------------------------------
    // Signals
    // ------------------------------------------------------------------

    async fn on_signals(&mut self, changes: Vec<SignalChange>) {
        for change in changes {
            match change {
                SignalChange::Connected(connected) => self.on_connection(connected).await,
                SignalChange::Position(position) => self.on_position(position),
                SignalChange::Track(_) => self.rematch_track(),
                SignalChange::Transport(snapshot) => self.on_transport(snapshot),
                SignalChange::Speed(speed) => {
                    let updated = self.now_playing.with_speed(speed);
                    self.set_now_playing(updated);
                }
            }
        }
        self.publish_playback();
    }

    async fn on_connection(&mut self, connected: bool) {
        let was_connected = std::mem::replace(&mut self.connected, connected);
        if was_connected == connected {
            return;
        }

        self.outputs.events.emit_lossy(CastawayEvent::ConnectionChanged {
            connected,
            timestamp: chrono::Utc::now(),
        });

        if !connected {
            info!("Engine disconnected");
            return;
        }

        info!("Engine connected");
        if let Some(items) = self.pending.take() {
            debug!("Flushing buffered catalog preparation ({} items)", items.len());
            self.engine.prepare(items).await;
        }
        self.start_catalog_load();
    }

    fn on_position(&mut self, position: i64) {
        trace!("Position tick {} ms", position);
        if !self.follow_track() {
            trace!("No catalogued track, tick not applied");
            return;
        }
        if !self.editing {
            let updated = self.now_playing.with_position(position);
            self.set_now_playing(updated);
        }
        self.mirror_progress_into_replica();
    }

    fn on_transport(&mut self, snapshot: TransportSnapshot) {
        let playing = snapshot.state.is_playing();
        let old_state = std::mem::replace(&mut self.transport_state, snapshot.state);
        debug!(
            "Transport {} -> {} at {} ms",
            old_state, snapshot.state, snapshot.position_ms
        );
        if old_state != snapshot.state {
            self.outputs.events.emit_lossy(CastawayEvent::TransportChanged {
                old_state,
                new_state: snapshot.state,
                position_ms: snapshot.position_ms,
                timestamp: chrono::Utc::now(),
            });
        }

        let entered_rest = self.policy.observe(snapshot.state);
        if !self.follow_track() {
            debug!(
                "Transport {} without a catalogued track, now playing unchanged",
                snapshot.state
            );
            return;
        }

        let mut updated = self.now_playing.with_playing(playing);
        if !self.editing {
            updated = updated.with_position(snapshot.position_ms);
        }
        self.set_now_playing(updated);

        if entered_rest {
            self.persist_on_transition(snapshot.state, snapshot.position_ms);
        }
    }

    /// Whether the now-playing episode is the engine's current track
    ///
    /// Re-resolves first when the track moved on and now playing has not
    /// followed it yet. False for an empty or uncatalogued track.
    fn follow_track(&mut self) -> bool {
        let media_id = self.merger.slots().track.media_id.clone();
        if media_id.is_empty() {
            return false;
        }

        if self.now_playing.episode().map(|e| e.id.as_str()) != Some(media_id.as_str()) {
            self.rematch_track();
        }
        self.now_playing.episode().is_some_and(|e| e.id == media_id)
    }

    /// Re-resolve the now-playing episode from the current track
    fn rematch_track(&mut self) {
        let slots = self.merger.slots();
        let track = &slots.track;

        let Some(episode) = match_episode(self.podcast.episodes(), &track.media_id) else {
            debug!("Track '{}' not in catalog, now playing unchanged", track.media_id);
            return;
        };

        let position = if self.editing {
            self.now_playing
                .episode()
                .filter(|current| current.id == episode.id)
                .map(|current| current.position)
                .unwrap_or(slots.position_ms)
        } else {
            slots.position_ms
        };

        let projection = NowPlayingEpisode::from_match(episode, track, position, slots.speed);
        let updated = NowPlayingState::active(projection, slots.transport.state.is_playing());
        self.set_now_playing(updated);
    }

    fn persist_on_transition(&mut self, state: TransportState, position_ms: i64) {
        let Some(active) = self.now_playing.episode() else {
            debug!("Entered {} with no active episode, nothing to store", state);
            return;
        };

        let Some(episode) = match_episode(self.podcast.episodes(), &active.id) else {
            debug!("Active episode {} missing from catalog, nothing to store", active.id);
            return;
        };

        let track_duration = self.merger.slots().track.known_duration();
        let write = build_write(episode, position_ms, track_duration);
        debug!(
            "Entered {}: storing {} at {}/{} ms",
            state, write.id, write.playback_position.position, write.playback_position.duration
        );

        self.update_replica(&write.id, write.playback_position);
        if !self.writer.submit(write) {
            warn!("Position writer unavailable, progress not stored");
        }
    }

    // ------------------------------------------------------------------
    // Catalog
    // ------------------------------------------------------------------

    fn start_catalog_load(&self) {
        if self.feed_url.is_empty() {
            debug!("No feed configured, skipping catalog load");
            return;
        }

        info!("Loading catalog for {}", self.feed_url);
        let catalog = self.catalog.clone();
        let feed_url = self.feed_url.clone();
        let tx = self.load_tx.clone();
        tokio::spawn(async move {
            let outcome = load_feed(catalog.as_ref(), &feed_url).await;
            // Receiver is gone after unsubscribe
            let _ = tx.send(outcome);
        });
    }

    async fn on_catalog_loaded(&mut self, outcome: LoadOutcome) {
        match outcome {
            Ok((feed, source)) => {
                info!(
                    "Catalog loaded: {} ({} episodes, {:?})",
                    feed.info.title,
                    feed.episodes.len(),
                    source
                );
                self.outputs.events.emit_lossy(CastawayEvent::CatalogLoaded {
                    feed_url: self.feed_url.clone(),
                    episode_count: feed.episodes.len(),
                    source,
                    timestamp: chrono::Utc::now(),
                });

                let items: Vec<MediaItem> = feed.episodes.iter().map(MediaItem::from).collect();
                self.set_podcast(PodcastState::Loaded(feed));
                self.rematch_track();

                if !self.requeue.submit(UiEvent::PrepareCatalog(items)) {
                    debug!("Intent queue closed, catalog not prepared");
                }
            }
            Err(reason) => {
                warn!("Catalog load failed for {}: {}", self.feed_url, reason);
                self.outputs.events.emit_lossy(CastawayEvent::CatalogLoadFailed {
                    feed_url: self.feed_url.clone(),
                    reason: reason.clone(),
                    timestamp: chrono::Utc::now(),
                });
                self.set_podcast(PodcastState::Failed {
                    feed_url: self.feed_url.clone(),
                    reason,
                });
            }
        }
    }

    /// Copy the now-playing progress into the in-memory catalog
    fn mirror_progress_into_replica(&mut self) {
        if let Some(active) = self.now_playing.episode() {
            let (id, progress) = (active.id.clone(), active.progress());
            self.update_replica(&id, progress);
        }
    }

    fn update_replica(&mut self, episode_id: &str, progress: castaway_common::PlaybackPosition) {
        let PodcastState::Loaded(feed) = &self.podcast else {
            return;
        };

        let Some(index) = feed.episodes.iter().position(|e| e.id == episode_id) else {
            return;
        };
        if feed.episodes[index].playback_position == progress {
            return;
        }

        let mut feed = feed.clone();
        feed.episodes[index] = feed.episodes[index].with_progress(progress);
        self.set_podcast(PodcastState::Loaded(feed));
    }

    // ------------------------------------------------------------------
    // Intents
    // ------------------------------------------------------------------

    async fn dispatch(&mut self, event: UiEvent) {
        let name = event.name();
        if event.requires_connection() && !self.connected {
            debug!("Dropping {}: engine not connected", name);
            self.outputs.events.emit_lossy(CastawayEvent::IntentDropped {
                intent: name.to_string(),
                timestamp: chrono::Utc::now(),
            });
            return;
        }
        debug!("Dispatching {}", name);

        match event {
            UiEvent::PrepareCatalog(items) => {
                if self.connected {
                    self.engine.prepare(items).await;
                } else {
                    debug!("Buffering catalog preparation until connected");
                    self.pending.store(items);
                }
            }
            UiEvent::PlayPause(id) | UiEvent::MediaItemClicked(id) => {
                self.engine.play_by_id(&id).await;
            }
            UiEvent::SkipNext => self.engine.skip_next().await,
            UiEvent::SkipPrevious => self.engine.skip_previous().await,
            UiEvent::FastForward => self.engine.fast_forward().await,
            UiEvent::Rewind => self.engine.rewind().await,
            UiEvent::SeekTo(position_ms) => self.engine.seek_to(position_ms).await,
            UiEvent::ChangeSpeed => match self.now_playing.episode().map(|e| e.speed) {
                Some(current) => {
                    let next = self.speed.advance(current);
                    self.apply_speed(next).await;
                }
                None => debug!("change_speed ignored: nothing playing"),
            },
            UiEvent::SetSpeed(rate) => {
                if !rate.is_finite() || rate <= 0.0 {
                    debug!("set_speed ignored: invalid rate {}", rate);
                } else if self.now_playing.episode().is_none() {
                    debug!("set_speed ignored: nothing playing");
                } else {
                    self.apply_speed(rate).await;
                }
            }
            UiEvent::EditingPosition(position) => {
                let updated = self.now_playing.with_position(position);
                self.set_now_playing(updated);
            }
            UiEvent::EditingFlag(editing) => {
                self.editing = editing;
            }
            UiEvent::EpisodeClicked(episode) => {
                let slots = self.merger.slots();
                let already_playing =
                    slots.track.media_id == episode.id && slots.transport.state.is_playing();
                if already_playing {
                    debug!("Episode {} already playing", episode.id);
                } else {
                    self.engine.play_by_id(&episode.id).await;
                }
            }
        }
    }

    async fn apply_speed(&mut self, speed: f32) {
        self.speed.set(speed);
        self.engine.set_speed(speed).await;

        let updated = self.now_playing.with_speed(speed);
        self.set_now_playing(updated);
        self.outputs.events.emit_lossy(CastawayEvent::SpeedChanged {
            speed,
            timestamp: chrono::Utc::now(),
        });
    }

    // ------------------------------------------------------------------
    // Publishing
    // ------------------------------------------------------------------

    fn publish_playback(&self) {
        self.outputs.playback.send_replace(self.merger.state());
    }

    fn set_now_playing(&mut self, state: NowPlayingState) {
        if state == self.now_playing {
            return;
        }

        let previous_id = self.now_playing.episode().map(|e| e.id.clone());
        let current_id = state.episode().map(|e| e.id.clone());
        let variant_changed =
            std::mem::discriminant(&state) != std::mem::discriminant(&self.now_playing);

        if variant_changed || previous_id != current_id {
            self.outputs.events.emit_lossy(CastawayEvent::NowPlayingChanged {
                episode_id: current_id,
                playing: state.is_playing(),
                position_ms: state.episode().map(|e| e.position).unwrap_or(0),
                timestamp: chrono::Utc::now(),
            });
        }

        self.now_playing = state.clone();
        self.outputs.now_playing.send_replace(state);
    }

    fn set_podcast(&mut self, state: PodcastState) {
        self.podcast = state.clone();
        self.outputs.podcast.send_replace(state);
    }
}

/// Stored copy first, then a fresh fetch
async fn load_feed(catalog: &dyn Catalog, feed_url: &str) -> LoadOutcome {
    match catalog.load_cached(feed_url).await {
        Ok(feed) => Ok((feed, CatalogSource::Cached)),
        Err(cached_err) => {
            debug!("No stored feed for {} ({}), fetching", feed_url, cached_err);
            catalog
                .fetch_and_store(feed_url)
                .await
                .map(|feed| (feed, CatalogSource::Fetched))
                .map_err(|e| e.to_string())
        }
    }
}
