//! SQLite-backed catalog
//!
//! Feeds are imported from JSON exports (`FeedData` shape) found at a local
//! path or `file://` URL. Stored playback progress survives re-imports.

use super::Catalog;
use crate::db;
use async_trait::async_trait;
use castaway_common::{Episode, Error, FeedData, Result};
use sqlx::{Pool, Sqlite};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Catalog stored in SQLite
#[derive(Debug, Clone)]
pub struct SqliteCatalog {
    db: Pool<Sqlite>,
}

impl SqliteCatalog {
    /// Wrap a pool whose schema is already initialized
    pub fn new(db: Pool<Sqlite>) -> Self {
        Self { db }
    }

    /// Open the database file, creating it and its schema as needed
    pub async fn open(database_path: &Path) -> Result<Self> {
        Ok(Self::new(db::connect(database_path).await?))
    }

    /// Throwaway catalog for tests and demos
    pub async fn in_memory() -> Result<Self> {
        Ok(Self::new(db::connect_in_memory().await?))
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.db
    }
}

/// Local file path named by a feed URL
fn feed_source_path(feed_url: &str) -> Result<PathBuf> {
    if let Some(path) = feed_url.strip_prefix("file://") {
        return Ok(PathBuf::from(path));
    }
    if feed_url.contains("://") {
        return Err(Error::InvalidInput(format!(
            "unsupported feed source {}: only local exports can be imported",
            feed_url
        )));
    }
    Ok(PathBuf::from(feed_url))
}

#[async_trait]
impl Catalog for SqliteCatalog {
    async fn load_cached(&self, feed_url: &str) -> Result<FeedData> {
        let feed = db::episodes::load_feed(&self.db, feed_url).await?;
        debug!("Loaded stored feed {} ({} episodes)", feed_url, feed.episodes.len());
        Ok(feed)
    }

    async fn fetch_and_store(&self, feed_url: &str) -> Result<FeedData> {
        let path = feed_source_path(feed_url)?;
        let content = tokio::fs::read_to_string(&path).await?;
        let mut feed: FeedData = serde_json::from_str(&content)?;

        feed.info.url = feed_url.to_string();
        let known = db::episodes::stored_positions(&self.db, feed_url).await?;
        for episode in &mut feed.episodes {
            episode.podcast_url = feed_url.to_string();
            if let Some(progress) = known.get(&episode.id) {
                episode.playback_position = *progress;
            }
        }

        db::episodes::upsert_feed(&self.db, &feed).await?;
        info!(
            "Imported feed {} from {} ({} episodes, {} already known)",
            feed_url,
            path.display(),
            feed.episodes.len(),
            known.len()
        );

        db::episodes::load_feed(&self.db, feed_url).await
    }

    async fn save_episode(&self, episode: Episode) -> Result<Episode> {
        db::episodes::upsert_episode(&self.db, &episode).await?;
        db::episodes::get_episode(&self.db, &episode.id).await
    }
}
