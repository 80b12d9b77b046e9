//! Server-Sent Events (SSE) stream of coordinator notifications

use super::AppContext;
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use castaway_common::events::CastawayEvent;
use futures::stream::{Stream, StreamExt};
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, warn};

/// GET /events - SSE event stream
pub async fn event_stream(
    State(ctx): State<AppContext>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!("New SSE client connected");

    let rx = ctx.coordinator.events();

    let stream = BroadcastStream::new(rx).filter_map(|result| async move {
        match result {
            Ok(event) => match serde_json::to_string(&event) {
                Ok(json) => Some(Ok(Event::default().event(event_type_str(&event)).data(json))),
                Err(e) => {
                    warn!("Failed to serialize event: {}", e);
                    None
                }
            },
            Err(e) => {
                // Lagged: the client missed events but stays connected
                warn!("SSE stream error: {:?}", e);
                None
            }
        }
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// SSE event name for a notification
pub fn event_type_str(event: &CastawayEvent) -> &'static str {
    match event {
        CastawayEvent::ConnectionChanged { .. } => "ConnectionChanged",
        CastawayEvent::TransportChanged { .. } => "TransportChanged",
        CastawayEvent::NowPlayingChanged { .. } => "NowPlayingChanged",
        CastawayEvent::SpeedChanged { .. } => "SpeedChanged",
        CastawayEvent::CatalogLoaded { .. } => "CatalogLoaded",
        CastawayEvent::CatalogLoadFailed { .. } => "CatalogLoadFailed",
        CastawayEvent::EpisodeSaved { .. } => "EpisodeSaved",
        CastawayEvent::EpisodeSaveFailed { .. } => "EpisodeSaveFailed",
        CastawayEvent::IntentDropped { .. } => "IntentDropped",
    }
}
