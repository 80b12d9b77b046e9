//! HTTP request handlers

use super::AppContext;
use crate::error::{Error, Result};
use crate::playback::{NowPlayingState, PlaybackState, PodcastState, UiEvent};
use axum::{extract::State, http::StatusCode, Json};
use castaway_common::human_time::{format_position_ms, progress_percent};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
    git_hash: String,
    build_timestamp: String,
    build_profile: String,
    port: u16,
    subscribed: bool,
}

#[derive(Debug, Serialize)]
pub struct PlaybackStateResponse {
    #[serde(flatten)]
    state: PlaybackState,
    /// Human-readable position of the active track
    position: Option<String>,
    /// Human-readable duration of the active track
    duration: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NowPlayingResponse {
    now_playing: NowPlayingState,
    position: Option<String>,
    progress_percent: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    status: String,
}

/// GET /health - Health check endpoint
pub async fn health(State(ctx): State<AppContext>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "castaway-player".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: env!("CASTAWAY_GIT_HASH").to_string(),
        build_timestamp: env!("CASTAWAY_BUILD_TIMESTAMP").to_string(),
        build_profile: env!("CASTAWAY_BUILD_PROFILE").to_string(),
        port: ctx.port,
        subscribed: ctx.coordinator.is_subscribed(),
    })
}

/// GET /playback/state - Latest merged playback snapshot
pub async fn get_playback_state(State(ctx): State<AppContext>) -> Json<PlaybackStateResponse> {
    let state = ctx.coordinator.playback_state().borrow().clone();
    let position = state
        .active_track
        .as_ref()
        .map(|track| format_position_ms(track.position_ms));
    let duration = state
        .active_track
        .as_ref()
        .and_then(|track| track.known_duration())
        .map(format_position_ms);

    Json(PlaybackStateResponse {
        state,
        position,
        duration,
    })
}

/// GET /playback/now_playing - Episode-centric view
pub async fn get_now_playing(State(ctx): State<AppContext>) -> Json<NowPlayingResponse> {
    let now_playing = ctx.coordinator.now_playing().borrow().clone();
    let episode = now_playing.episode();
    let position = episode.map(|e| format_position_ms(e.position));
    let progress = episode.map(|e| progress_percent(e.position, e.duration));

    Json(NowPlayingResponse {
        now_playing,
        position,
        progress_percent: progress,
    })
}

/// GET /catalog - Catalog load state (with episodes once loaded)
pub async fn get_catalog(State(ctx): State<AppContext>) -> Json<PodcastState> {
    Json(ctx.coordinator.podcast_state().borrow().clone())
}

/// POST /playback/event - Queue a user intent
pub async fn submit_event(
    State(ctx): State<AppContext>,
    Json(event): Json<UiEvent>,
) -> Result<(StatusCode, Json<StatusResponse>)> {
    let name = event.name();
    if !ctx.coordinator.submit_event(event) {
        return Err(Error::InvalidState(
            "playback coordinator is not subscribed".to_string(),
        ));
    }

    debug!("Queued {} from HTTP", name);
    Ok((
        StatusCode::ACCEPTED,
        Json(StatusResponse {
            status: "queued".to_string(),
        }),
    ))
}
