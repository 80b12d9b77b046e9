//! Catalog fixtures and async wait helpers

use castaway_common::events::CastawayEvent;
use castaway_common::{Episode, FeedData, FeedInfo, PlaybackPosition};
use std::future::Future;
use std::time::Duration;
use tokio::sync::{broadcast, watch};

pub const FEED_URL: &str = "memory://castaway-test";

const WAIT_TIMEOUT: Duration = Duration::from_secs(2);
const POLL_INTERVAL: Duration = Duration::from_millis(5);

pub fn episode(id: &str, position: i64, duration: i64) -> Episode {
    Episode {
        id: id.to_string(),
        title: format!("Episode {}", id),
        subtitle: Some(format!("About {}", id)),
        description: String::new(),
        audio_url: format!("file:///audio/{}.mp3", id),
        image_url: None,
        author: Some("Host".to_string()),
        playback_position: PlaybackPosition::new(position, duration),
        episode: 1,
        podcast_url: FEED_URL.to_string(),
    }
}

pub fn feed(episodes: Vec<Episode>) -> FeedData {
    FeedData {
        info: FeedInfo {
            url: FEED_URL.to_string(),
            title: "Test Feed".to_string(),
            ..Default::default()
        },
        episodes,
    }
}

/// Wait until a watch value satisfies `pred` and return a copy of it
///
/// Panics after two seconds so a broken coordinator fails the test instead
/// of hanging it.
pub async fn wait_for_value<T, F>(rx: &mut watch::Receiver<T>, pred: F) -> T
where
    T: Clone,
    F: FnMut(&T) -> bool,
{
    match tokio::time::timeout(WAIT_TIMEOUT, rx.wait_for(pred)).await {
        Ok(Ok(value)) => value.clone(),
        Ok(Err(_)) => panic!("watch channel closed while waiting"),
        Err(_) => panic!("timed out waiting for {}", std::any::type_name::<T>()),
    }
}

/// Poll `check` until it returns true (or panic after two seconds)
pub async fn eventually<F, Fut>(what: &str, mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + WAIT_TIMEOUT;
    while tokio::time::Instant::now() < deadline {
        if check().await {
            return;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
    panic!("timed out waiting for: {}", what);
}

/// Receive events until one satisfies `pred`
pub async fn wait_for_event<F>(
    rx: &mut broadcast::Receiver<CastawayEvent>,
    mut pred: F,
) -> CastawayEvent
where
    F: FnMut(&CastawayEvent) -> bool,
{
    let search = async {
        loop {
            match rx.recv().await {
                Ok(event) if pred(&event) => return event,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => panic!("event bus closed"),
            }
        }
    };
    match tokio::time::timeout(WAIT_TIMEOUT, search).await {
        Ok(event) => event,
        Err(_) => panic!("timed out waiting for event"),
    }
}
