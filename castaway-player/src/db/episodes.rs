//! Feed and episode queries

use castaway_common::{Episode, Error, FeedData, FeedInfo, PlaybackPosition, Result};
use sqlx::{Pool, Sqlite};
use std::collections::HashMap;

type EpisodeRow = (
    String,
    String,
    String,
    Option<String>,
    String,
    String,
    Option<String>,
    Option<String>,
    i64,
    i64,
    i64,
);

const EPISODE_COLUMNS: &str = "id, podcast_url, title, subtitle, description, audio_url, \
                               image_url, author, position_ms, duration_ms, episode";

fn episode_from_row(row: EpisodeRow) -> Episode {
    let (
        id,
        podcast_url,
        title,
        subtitle,
        description,
        audio_url,
        image_url,
        author,
        position,
        duration,
        episode,
    ) = row;
    Episode {
        id,
        title,
        subtitle,
        description,
        audio_url,
        image_url,
        author,
        playback_position: PlaybackPosition::new(position, duration),
        episode,
        podcast_url,
    }
}

/// Stored feed with its episodes, newest ordinal first
pub async fn load_feed(db: &Pool<Sqlite>, url: &str) -> Result<FeedData> {
    let info: Option<(String, String, Option<String>, Option<String>, Option<String>)> =
        sqlx::query_as(
            "SELECT url, title, description, image_url, author FROM feeds WHERE url = ?",
        )
        .bind(url)
        .fetch_optional(db)
        .await?;

    let Some((url, title, description, image_url, author)) = info else {
        return Err(Error::NotFound(format!("feed {}", url)));
    };

    let rows: Vec<EpisodeRow> = sqlx::query_as(&format!(
        "SELECT {} FROM episodes WHERE podcast_url = ? ORDER BY episode DESC, id",
        EPISODE_COLUMNS
    ))
    .bind(&url)
    .fetch_all(db)
    .await?;

    Ok(FeedData {
        info: FeedInfo {
            url,
            title,
            description,
            image_url,
            author,
        },
        episodes: rows.into_iter().map(episode_from_row).collect(),
    })
}

/// Single episode by id
pub async fn get_episode(db: &Pool<Sqlite>, id: &str) -> Result<Episode> {
    let row: Option<EpisodeRow> = sqlx::query_as(&format!(
        "SELECT {} FROM episodes WHERE id = ?",
        EPISODE_COLUMNS
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;

    row.map(episode_from_row)
        .ok_or_else(|| Error::NotFound(format!("episode {}", id)))
}

/// Saved progress of every stored episode of a feed
pub async fn stored_positions(
    db: &Pool<Sqlite>,
    podcast_url: &str,
) -> Result<HashMap<String, PlaybackPosition>> {
    let rows: Vec<(String, i64, i64)> = sqlx::query_as(
        "SELECT id, position_ms, duration_ms FROM episodes WHERE podcast_url = ?",
    )
    .bind(podcast_url)
    .fetch_all(db)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, position, duration)| (id, PlaybackPosition::new(position, duration)))
        .collect())
}

/// Insert or overwrite a feed and all of its episodes in one transaction
pub async fn upsert_feed(db: &Pool<Sqlite>, feed: &FeedData) -> Result<()> {
    let mut tx = db.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO feeds (url, title, description, image_url, author, updated_at)
        VALUES (?, ?, ?, ?, ?, CURRENT_TIMESTAMP)
        ON CONFLICT(url) DO UPDATE SET
            title = excluded.title,
            description = excluded.description,
            image_url = excluded.image_url,
            author = excluded.author,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(&feed.info.url)
    .bind(&feed.info.title)
    .bind(&feed.info.description)
    .bind(&feed.info.image_url)
    .bind(&feed.info.author)
    .execute(&mut *tx)
    .await?;

    for episode in &feed.episodes {
        upsert_episode_query(episode).execute(&mut *tx).await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Insert or overwrite one episode by id
pub async fn upsert_episode(db: &Pool<Sqlite>, episode: &Episode) -> Result<()> {
    upsert_episode_query(episode).execute(db).await?;
    Ok(())
}

fn upsert_episode_query(
    episode: &Episode,
) -> sqlx::query::Query<'_, Sqlite, sqlx::sqlite::SqliteArguments<'_>> {
    sqlx::query(
        r#"
        INSERT INTO episodes (id, podcast_url, title, subtitle, description, audio_url,
                              image_url, author, position_ms, duration_ms, episode)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            podcast_url = excluded.podcast_url,
            title = excluded.title,
            subtitle = excluded.subtitle,
            description = excluded.description,
            audio_url = excluded.audio_url,
            image_url = excluded.image_url,
            author = excluded.author,
            position_ms = excluded.position_ms,
            duration_ms = excluded.duration_ms,
            episode = excluded.episode
        "#,
    )
    .bind(&episode.id)
    .bind(&episode.podcast_url)
    .bind(&episode.title)
    .bind(&episode.subtitle)
    .bind(&episode.description)
    .bind(&episode.audio_url)
    .bind(&episode.image_url)
    .bind(&episode.author)
    .bind(episode.playback_position.position)
    .bind(episode.playback_position.duration)
    .bind(episode.episode)
}
