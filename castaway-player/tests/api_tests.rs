//! Integration tests for the castaway-player HTTP API
//!
//! Tests the API surface against a coordinator driven by a scripted engine:
//! - Health and read-only state views
//! - Intent submission and its error mapping
//! - Catalog view

mod helpers;

use axum::http::StatusCode;
use castaway_common::events::TransportState;
use castaway_player::api::{create_router, AppContext};
use castaway_player::playback::{CoordinatorConfig, NowPlayingState};
use castaway_player::PlaybackCoordinator;
use helpers::{
    episode, eventually, feed, wait_for_value, EngineCall, MemoryCatalog, RecordingEngine,
    FEED_URL,
};
use serde_json::{json, Value};
use std::sync::Arc;

/// Test helper to create a router over a fresh coordinator
fn setup_test_server(
    catalog: MemoryCatalog,
) -> (axum::Router, Arc<PlaybackCoordinator>, Arc<RecordingEngine>) {
    let engine = Arc::new(RecordingEngine::new());
    let config = CoordinatorConfig {
        feed_url: FEED_URL.to_string(),
        ..Default::default()
    };
    let coordinator = Arc::new(
        PlaybackCoordinator::new(engine.clone(), Arc::new(catalog), config)
            .expect("Failed to create coordinator"),
    );

    let ctx = AppContext {
        coordinator: Arc::clone(&coordinator),
        port: 5810,
    };
    (create_router(ctx), coordinator, engine)
}

/// Helper function to make HTTP requests to the test router
async fn make_request(
    app: &axum::Router,
    method: &str,
    path: &str,
    body: Option<Value>,
) -> (StatusCode, Option<Value>) {
    use axum::body::Body;
    use http::{Method, Request};
    use tower::ServiceExt;

    let method = match method {
        "GET" => Method::GET,
        "POST" => Method::POST,
        _ => panic!("Unsupported method"),
    };

    let request = Request::builder().method(method).uri(path);
    let request = match body {
        Some(json_body) => request
            .header("content-type", "application/json")
            .body(Body::from(json_body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json_body = serde_json::from_slice(&body).ok();

    (status, json_body)
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, coordinator, _engine) = setup_test_server(MemoryCatalog::new());

    let (status, body) = make_request(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    let body = body.expect("health body");
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["module"], "castaway-player");
    assert_eq!(body["port"], 5810);
    assert_eq!(body["subscribed"], false);

    coordinator.subscribe().await.unwrap();
    let (_, body) = make_request(&app, "GET", "/health", None).await;
    assert_eq!(body.unwrap()["subscribed"], true);
    coordinator.unsubscribe().await;
}

#[tokio::test]
async fn test_event_rejected_when_not_subscribed() {
    let (app, _coordinator, _engine) = setup_test_server(MemoryCatalog::new());

    let (status, body) = make_request(
        &app,
        "POST",
        "/playback/event",
        Some(json!({"type": "seek_to", "value": 1500})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    let status_text = body.unwrap()["status"].as_str().unwrap().to_string();
    assert!(status_text.starts_with("error:"), "got {}", status_text);
}

#[tokio::test]
async fn test_event_reaches_engine() {
    let (app, coordinator, engine) = setup_test_server(MemoryCatalog::new());
    coordinator.subscribe().await.unwrap();

    let (status, body) = make_request(
        &app,
        "POST",
        "/playback/event",
        Some(json!({"type": "seek_to", "value": 1500})),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body.unwrap()["status"], "queued");

    let (status, _) = make_request(
        &app,
        "POST",
        "/playback/event",
        Some(json!({"type": "skip_next"})),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let handle = engine.clone();
    eventually("both intents dispatched", || {
        let handle = handle.clone();
        async move { handle.control_calls().len() == 2 }
    })
    .await;
    assert_eq!(
        engine.control_calls(),
        vec![EngineCall::SeekTo(1500), EngineCall::SkipNext]
    );

    coordinator.unsubscribe().await;
}

#[tokio::test]
async fn test_malformed_event_rejected() {
    let (app, coordinator, _engine) = setup_test_server(MemoryCatalog::new());
    coordinator.subscribe().await.unwrap();

    let (status, _) = make_request(
        &app,
        "POST",
        "/playback/event",
        Some(json!({"type": "warp_drive"})),
    )
    .await;
    assert!(status.is_client_error(), "got {}", status);

    coordinator.unsubscribe().await;
}

#[tokio::test]
async fn test_state_views_follow_engine() {
    let (app, coordinator, engine) =
        setup_test_server(MemoryCatalog::with_stored(feed(vec![episode("e1", 0, 0)])));

    let (status, body) = make_request(&app, "GET", "/playback/now_playing", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["now_playing"]["state"], "loading");

    engine.set_track("e1", Some(125_000));
    engine.set_transport(TransportState::Paused, 65_000);
    let mut now = coordinator.now_playing();
    coordinator.subscribe().await.unwrap();
    wait_for_value(&mut now, |state| matches!(state, NowPlayingState::Paused(_))).await;

    let (_, body) = make_request(&app, "GET", "/playback/now_playing", None).await;
    let body = body.unwrap();
    assert_eq!(body["now_playing"]["state"], "paused");
    assert_eq!(body["now_playing"]["episode"]["id"], "e1");
    assert_eq!(body["position"], "1:05");
    assert_eq!(body["progress_percent"], 52.0);

    let (status, body) = make_request(&app, "GET", "/playback/state", None).await;
    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap();
    assert_eq!(body["connected"], true);
    assert_eq!(body["prepared"], true);
    assert_eq!(body["playing"], false);
    assert_eq!(body["active_track"]["media_id"], "e1");
    assert_eq!(body["duration"], "2:05");

    let (status, body) = make_request(&app, "GET", "/catalog", None).await;
    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap();
    assert_eq!(body["state"], "loaded");
    assert_eq!(body["episodes"][0]["id"], "e1");

    coordinator.unsubscribe().await;
}

#[tokio::test]
async fn test_invalid_endpoints() {
    let (app, _coordinator, _engine) = setup_test_server(MemoryCatalog::new());

    let (status, _) = make_request(&app, "GET", "/nonexistent", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = make_request(&app, "GET", "/playback/event", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}
