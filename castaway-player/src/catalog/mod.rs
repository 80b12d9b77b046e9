//! Episode catalog interface
//!
//! The catalog owns the canonical feed and episode records. The coordinator
//! only reads snapshots and writes progress back through `save_episode`.

pub mod sqlite;

use async_trait::async_trait;
use castaway_common::{Episode, FeedData, Result};

pub use sqlite::SqliteCatalog;

/// Feed/episode store
///
/// Implementations must be usable from multiple tasks (Send + Sync).
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Previously stored copy of a feed
    ///
    /// Returns `Error::NotFound` when the feed has never been stored.
    async fn load_cached(&self, feed_url: &str) -> Result<FeedData>;

    /// Retrieve the feed from its source, store it, and return the stored copy
    async fn fetch_and_store(&self, feed_url: &str) -> Result<FeedData>;

    /// Overwrite an episode by id and return the stored record
    async fn save_episode(&self, episode: Episode) -> Result<Episode>;
}
