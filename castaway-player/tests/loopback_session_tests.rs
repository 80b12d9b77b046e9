//! End-to-end session: loopback engine, SQLite catalog, coordinator

mod helpers;

use castaway_common::events::CastawayEvent;
use castaway_player::catalog::{Catalog, SqliteCatalog};
use castaway_player::engine::{LoopbackConfig, LoopbackEngine};
use castaway_player::playback::{CoordinatorConfig, NowPlayingState, UiEvent};
use castaway_player::PlaybackCoordinator;
use helpers::{episode, eventually, feed, wait_for_event, wait_for_value};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

#[tokio::test]
async fn test_play_pause_persists_progress() {
    let temp = TempDir::new().unwrap();
    let export = temp.path().join("show.json");
    std::fs::write(
        &export,
        serde_json::to_string(&feed(vec![episode("e1", 0, 3_600_000)])).unwrap(),
    )
    .unwrap();
    let feed_url = export.display().to_string();

    let catalog = Arc::new(SqliteCatalog::in_memory().await.unwrap());
    let engine = Arc::new(LoopbackEngine::new(LoopbackConfig {
        tick_interval: Duration::from_millis(10),
        ..Default::default()
    }));
    let coordinator = PlaybackCoordinator::new(
        engine.clone(),
        catalog.clone(),
        CoordinatorConfig {
            feed_url: feed_url.clone(),
            ..Default::default()
        },
    )
    .unwrap();

    let mut events = coordinator.events();
    let mut now = coordinator.now_playing();
    coordinator.subscribe().await.unwrap();

    let handle = engine.clone();
    eventually("catalog prepared on engine", || {
        let handle = handle.clone();
        async move { handle.prepared_ids().await == vec!["e1".to_string()] }
    })
    .await;

    coordinator.submit_event(UiEvent::PlayPause("e1".to_string()));
    wait_for_value(&mut now, |state| {
        matches!(state, NowPlayingState::Playing(ep) if ep.id == "e1" && ep.position > 0)
    })
    .await;

    coordinator.submit_event(UiEvent::PlayPause("e1".to_string()));
    let saved =
        wait_for_event(&mut events, |e| matches!(e, CastawayEvent::EpisodeSaved { .. })).await;
    let CastawayEvent::EpisodeSaved {
        episode_id,
        position_ms,
        duration_ms,
        ..
    } = saved
    else {
        panic!("unexpected event {:?}", saved);
    };
    assert_eq!(episode_id, "e1");
    assert!(position_ms > 0);
    assert_eq!(duration_ms, 3_600_000);

    coordinator.unsubscribe().await;

    let stored = catalog.load_cached(&feed_url).await.unwrap();
    assert_eq!(stored.episodes[0].playback_position.position, position_ms);
    assert!(matches!(
        *coordinator.now_playing().borrow(),
        NowPlayingState::Paused(_)
    ));
}
