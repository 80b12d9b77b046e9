//! Presentation-facing projections
//!
//! `NowPlayingState` is the episode-centric view of playback; `PodcastState`
//! is the catalog-load view. Both are published by the coordinator as
//! immutable snapshots.

use castaway_common::events::TrackData;
use castaway_common::{Episode, FeedData, PlaybackPosition};
use serde::{Deserialize, Serialize};

/// Catalog episode overlaid with live transport fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NowPlayingEpisode {
    pub id: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub audio_url: String,
    pub image_url: Option<String>,
    pub author: Option<String>,
    /// Milliseconds
    pub position: i64,
    /// Milliseconds
    pub duration: i64,
    pub speed: f32,
}

impl NowPlayingEpisode {
    /// Build the projection for a matched episode
    ///
    /// Position comes from the live position signal. Duration comes from the
    /// track metadata when known, else from the catalog's last saved value.
    pub fn from_match(episode: &Episode, track: &TrackData, position: i64, speed: f32) -> Self {
        Self {
            id: episode.id.clone(),
            title: episode.title.clone(),
            subtitle: episode.subtitle.clone(),
            audio_url: episode.audio_url.clone(),
            image_url: episode.image_url.clone(),
            author: episode.author.clone(),
            position,
            duration: track
                .known_duration()
                .unwrap_or(episode.playback_position.duration),
            speed,
        }
    }

    pub fn progress(&self) -> PlaybackPosition {
        PlaybackPosition::new(self.position, self.duration)
    }
}

/// Episode-centric playback view
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "episode", rename_all = "lowercase")]
pub enum NowPlayingState {
    #[default]
    Loading,
    Buffering,
    Playing(NowPlayingEpisode),
    Paused(NowPlayingEpisode),
    Played,
}

impl NowPlayingState {
    /// `Playing` or `Paused` around the given episode
    pub fn active(episode: NowPlayingEpisode, playing: bool) -> Self {
        if playing {
            NowPlayingState::Playing(episode)
        } else {
            NowPlayingState::Paused(episode)
        }
    }

    /// The carried episode, if any
    pub fn episode(&self) -> Option<&NowPlayingEpisode> {
        match self {
            NowPlayingState::Playing(episode) | NowPlayingState::Paused(episode) => Some(episode),
            NowPlayingState::Loading | NowPlayingState::Buffering | NowPlayingState::Played => {
                None
            }
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, NowPlayingState::Playing(_))
    }

    /// Same variant with the position replaced; inert states are returned as-is
    pub fn with_position(&self, position: i64) -> Self {
        self.map_episode(|episode| NowPlayingEpisode {
            position,
            ..episode.clone()
        })
    }

    /// Same variant with the speed replaced; inert states are returned as-is
    pub fn with_speed(&self, speed: f32) -> Self {
        self.map_episode(|episode| NowPlayingEpisode {
            speed,
            ..episode.clone()
        })
    }

    /// Same episode with the play/pause variant chosen by `playing`
    pub fn with_playing(&self, playing: bool) -> Self {
        match self.episode() {
            Some(episode) => NowPlayingState::active(episode.clone(), playing),
            None => self.clone(),
        }
    }

    fn map_episode(&self, f: impl FnOnce(&NowPlayingEpisode) -> NowPlayingEpisode) -> Self {
        match self {
            NowPlayingState::Playing(episode) => NowPlayingState::Playing(f(episode)),
            NowPlayingState::Paused(episode) => NowPlayingState::Paused(f(episode)),
            NowPlayingState::Loading => NowPlayingState::Loading,
            NowPlayingState::Buffering => NowPlayingState::Buffering,
            NowPlayingState::Played => NowPlayingState::Played,
        }
    }
}

/// Catalog-load view
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum PodcastState {
    #[default]
    Loading,
    Loaded(FeedData),
    Failed { feed_url: String, reason: String },
}

impl PodcastState {
    pub fn feed(&self) -> Option<&FeedData> {
        match self {
            PodcastState::Loaded(feed) => Some(feed),
            PodcastState::Loading | PodcastState::Failed { .. } => None,
        }
    }

    pub fn episodes(&self) -> &[Episode] {
        self.feed().map(|feed| feed.episodes.as_slice()).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use castaway_common::events::UNKNOWN_DURATION_MS;

    fn catalog_episode(duration: i64) -> Episode {
        Episode {
            id: "e1".to_string(),
            title: "First".to_string(),
            subtitle: Some("sub".to_string()),
            description: "desc".to_string(),
            audio_url: "file:///e1.mp3".to_string(),
            image_url: None,
            author: Some("host".to_string()),
            playback_position: PlaybackPosition::new(1200, duration),
            episode: 1,
            podcast_url: "feed".to_string(),
        }
    }

    fn track(duration: Option<i64>) -> TrackData {
        TrackData {
            media_id: "e1".to_string(),
            duration,
            ..Default::default()
        }
    }

    #[test]
    fn test_from_match_prefers_live_fields() {
        let np =
            NowPlayingEpisode::from_match(&catalog_episode(500), &track(Some(90_000)), 3000, 1.5);
        assert_eq!(np.position, 3000);
        assert_eq!(np.duration, 90_000);
        assert_eq!(np.speed, 1.5);
        assert_eq!(np.author.as_deref(), Some("host"));
    }

    #[test]
    fn test_from_match_falls_back_to_catalog_duration() {
        let np = NowPlayingEpisode::from_match(&catalog_episode(500), &track(None), 0, 1.0);
        assert_eq!(np.duration, 500);

        let np = NowPlayingEpisode::from_match(
            &catalog_episode(500),
            &track(Some(UNKNOWN_DURATION_MS)),
            0,
            1.0,
        );
        assert_eq!(np.duration, 500);
    }

    #[test]
    fn test_inert_states_ignore_edits() {
        for state in [
            NowPlayingState::Loading,
            NowPlayingState::Buffering,
            NowPlayingState::Played,
        ] {
            assert_eq!(state.with_position(9999), state);
            assert_eq!(state.with_speed(2.0), state);
            assert_eq!(state.with_playing(true), state);
        }
    }

    #[test]
    fn test_edits_keep_variant() {
        let np = NowPlayingEpisode::from_match(&catalog_episode(1), &track(None), 0, 1.0);
        let paused = NowPlayingState::Paused(np);

        let moved = paused.with_position(4200);
        assert!(matches!(moved, NowPlayingState::Paused(ref e) if e.position == 4200));

        let playing = moved.with_playing(true);
        assert!(playing.is_playing());
        assert_eq!(playing.episode().map(|e| e.position), Some(4200));
    }

    #[test]
    fn test_now_playing_serialization() {
        let np = NowPlayingEpisode::from_match(&catalog_episode(1), &track(None), 10, 1.0);
        let json = serde_json::to_value(NowPlayingState::Playing(np)).unwrap();
        assert_eq!(json["state"], "playing");
        assert_eq!(json["episode"]["id"], "e1");

        let json = serde_json::to_value(NowPlayingState::Loading).unwrap();
        assert_eq!(json["state"], "loading");
    }
}
