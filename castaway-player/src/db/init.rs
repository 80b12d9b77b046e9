//! Database connection and schema initialization

use castaway_common::Result;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Open (creating if needed) the catalog database and ensure its schema
pub async fn connect(database_path: &Path) -> Result<Pool<Sqlite>> {
    if let Some(parent) = database_path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let db_url = format!("sqlite:{}?mode=rwc", database_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Some(Duration::from_secs(60)))
        .connect(&db_url)
        .await?;

    info!("Connected to database: {}", database_path.display());
    init_schema(&pool).await?;
    Ok(pool)
}

/// Private in-memory database with the catalog schema
///
/// Limited to one connection: every `sqlite::memory:` connection is a
/// separate database.
pub async fn connect_in_memory() -> Result<Pool<Sqlite>> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    init_schema(&pool).await?;
    Ok(pool)
}

/// Create the catalog tables if missing
pub async fn init_schema(pool: &Pool<Sqlite>) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS feeds (
            url TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT,
            image_url TEXT,
            author TEXT,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS episodes (
            id TEXT PRIMARY KEY,
            podcast_url TEXT NOT NULL,
            title TEXT NOT NULL,
            subtitle TEXT,
            description TEXT NOT NULL DEFAULT '',
            audio_url TEXT NOT NULL,
            image_url TEXT,
            author TEXT,
            position_ms INTEGER NOT NULL DEFAULT 0,
            duration_ms INTEGER NOT NULL DEFAULT 0,
            episode INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_episodes_podcast ON episodes(podcast_url)")
        .execute(pool)
        .await?;

    Ok(())
}
