//! HTTP/SSE surface of the player
//!
//! Read-only views of the derived playback state plus one endpoint that
//! queues user intents on the coordinator.

pub mod handlers;
pub mod server;
pub mod sse;

use crate::playback::PlaybackCoordinator;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use server::run;

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    pub coordinator: Arc<PlaybackCoordinator>,
    /// Server port (reported by /health)
    pub port: u16,
}

/// Create the API router
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/playback/state", get(handlers::get_playback_state))
        .route("/playback/now_playing", get(handlers::get_now_playing))
        .route("/playback/event", post(handlers::submit_event))
        .route("/catalog", get(handlers::get_catalog))
        .route("/events", get(sse::event_stream))
        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
