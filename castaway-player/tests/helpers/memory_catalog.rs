//! In-memory catalog for coordinator tests

use async_trait::async_trait;
use castaway_common::{Episode, Error, FeedData, Result};
use castaway_player::catalog::Catalog;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Catalog with a "stored" map, a "remote" map, and a write log
#[derive(Default)]
pub struct MemoryCatalog {
    stored: Mutex<HashMap<String, FeedData>>,
    remote: Mutex<HashMap<String, FeedData>>,
    saves: Mutex<Vec<Episode>>,
    fail_saves: AtomicBool,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog that already holds `feed`
    pub fn with_stored(feed: FeedData) -> Self {
        let catalog = Self::new();
        catalog
            .stored
            .lock()
            .unwrap()
            .insert(feed.info.url.clone(), feed);
        catalog
    }

    /// Catalog that can only fetch `feed`
    pub fn with_remote(feed: FeedData) -> Self {
        let catalog = Self::new();
        catalog
            .remote
            .lock()
            .unwrap()
            .insert(feed.info.url.clone(), feed);
        catalog
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Every `save_episode` call, in order (failed ones included)
    pub fn saves(&self) -> Vec<Episode> {
        self.saves.lock().unwrap().clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.lock().unwrap().len()
    }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn load_cached(&self, feed_url: &str) -> Result<FeedData> {
        self.stored
            .lock()
            .unwrap()
            .get(feed_url)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("feed {}", feed_url)))
    }

    async fn fetch_and_store(&self, feed_url: &str) -> Result<FeedData> {
        let feed = self
            .remote
            .lock()
            .unwrap()
            .get(feed_url)
            .cloned()
            .ok_or_else(|| Error::Internal(format!("cannot fetch {}", feed_url)))?;
        self.stored
            .lock()
            .unwrap()
            .insert(feed_url.to_string(), feed.clone());
        Ok(feed)
    }

    async fn save_episode(&self, episode: Episode) -> Result<Episode> {
        self.saves.lock().unwrap().push(episode.clone());
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(Error::Internal("disk full".to_string()));
        }

        let mut stored = self.stored.lock().unwrap();
        if let Some(feed) = stored.get_mut(&episode.podcast_url) {
            if let Some(slot) = feed.episodes.iter_mut().find(|e| e.id == episode.id) {
                *slot = episode.clone();
            }
        }
        Ok(episode)
    }
}
