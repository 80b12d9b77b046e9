//! Combine-latest merge of the five playback signals
//!
//! `SignalMerger` holds one slot per input (connection, position, track,
//! transport, speed). Every wake-up pulls all pending upstream values into
//! their slots; the derived `PlaybackState` is always recomputed from all
//! five slots, never from the change that triggered it.

use castaway_common::events::{TrackData, TransportSnapshot};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Derived, UI-facing snapshot of playback
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlaybackState {
    pub connected: bool,
    /// Transport prepared and track length known
    pub prepared: bool,
    /// `None` whenever the engine reports no active media id
    pub active_track: Option<TrackData>,
    pub playing: bool,
    pub speed: f32,
}

/// Latest value of each input signal
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignalSlots {
    pub connected: bool,
    pub position_ms: i64,
    pub track: TrackData,
    pub transport: TransportSnapshot,
    pub speed: f32,
}

/// Recompute the derived state from the five latest values
pub fn derive_playback_state(slots: &SignalSlots) -> PlaybackState {
    let active_track = if slots.track.is_empty() {
        None
    } else {
        Some(TrackData {
            position_ms: slots.position_ms,
            ..slots.track.clone()
        })
    };

    let prepared = slots.transport.state.is_prepared()
        && active_track
            .as_ref()
            .and_then(TrackData::known_duration)
            .is_some();

    PlaybackState {
        connected: slots.connected,
        prepared,
        active_track,
        playing: slots.transport.state.is_playing(),
        speed: slots.speed,
    }
}

/// Which input changed
#[derive(Debug, Clone, PartialEq)]
pub enum SignalChange {
    Connected(bool),
    Position(i64),
    Track(TrackData),
    Transport(TransportSnapshot),
    Speed(f32),
}

/// Receivers for the five merged inputs
#[derive(Debug, Clone)]
pub struct MergeInputs {
    pub connected: watch::Receiver<bool>,
    pub position_ms: watch::Receiver<i64>,
    pub track: watch::Receiver<TrackData>,
    pub transport: watch::Receiver<TransportSnapshot>,
    pub speed: watch::Receiver<f32>,
}

/// Merge node owning the latest value of every input
#[derive(Debug)]
pub struct SignalMerger {
    inputs: MergeInputs,
    slots: SignalSlots,
}

impl SignalMerger {
    /// Attach to the inputs, seeding every slot with its current value
    pub fn new(mut inputs: MergeInputs) -> Self {
        let slots = SignalSlots {
            connected: *inputs.connected.borrow_and_update(),
            position_ms: *inputs.position_ms.borrow_and_update(),
            track: inputs.track.borrow_and_update().clone(),
            transport: *inputs.transport.borrow_and_update(),
            speed: *inputs.speed.borrow_and_update(),
        };
        Self { inputs, slots }
    }

    pub fn slots(&self) -> &SignalSlots {
        &self.slots
    }

    /// Derived state from the current slots
    pub fn state(&self) -> PlaybackState {
        derive_playback_state(&self.slots)
    }

    /// Wait for input changes and store every pending one in its slot
    ///
    /// All inputs with an unseen value are pulled in before returning, so
    /// handlers always see the latest value of every signal. Changes come
    /// back in handling order: connection, track, transport, position,
    /// speed. Returns `None` once any input's sender is gone.
    pub async fn next_changes(&mut self) -> Option<Vec<SignalChange>> {
        let fired = tokio::select! {
            res = self.inputs.connected.changed() => res.map(|_| Input::Connected),
            res = self.inputs.track.changed() => res.map(|_| Input::Track),
            res = self.inputs.transport.changed() => res.map(|_| Input::Transport),
            res = self.inputs.position_ms.changed() => res.map(|_| Input::Position),
            res = self.inputs.speed.changed() => res.map(|_| Input::Speed),
        }
        .ok()?;

        Some(self.drain_pending(fired))
    }

    fn drain_pending(&mut self, fired: Input) -> Vec<SignalChange> {
        let mut changes = Vec::new();

        if pending(&self.inputs.connected, fired == Input::Connected) {
            let connected = *self.inputs.connected.borrow_and_update();
            self.slots.connected = connected;
            changes.push(SignalChange::Connected(connected));
        }
        if pending(&self.inputs.track, fired == Input::Track) {
            let track = self.inputs.track.borrow_and_update().clone();
            self.slots.track = track.clone();
            changes.push(SignalChange::Track(track));
        }
        if pending(&self.inputs.transport, fired == Input::Transport) {
            let transport = *self.inputs.transport.borrow_and_update();
            self.slots.transport = transport;
            changes.push(SignalChange::Transport(transport));
        }
        if pending(&self.inputs.position_ms, fired == Input::Position) {
            let position = *self.inputs.position_ms.borrow_and_update();
            self.slots.position_ms = position;
            changes.push(SignalChange::Position(position));
        }
        if pending(&self.inputs.speed, fired == Input::Speed) {
            let speed = *self.inputs.speed.borrow_and_update();
            self.slots.speed = speed;
            changes.push(SignalChange::Speed(speed));
        }

        changes
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input {
    Connected,
    Track,
    Transport,
    Position,
    Speed,
}

/// The input that woke the merger is always taken, even if its sender has
/// since closed
fn pending<T>(rx: &watch::Receiver<T>, fired: bool) -> bool {
    fired || rx.has_changed().unwrap_or(false)
}
