//! Playback state coordination
//!
//! Leaf components (speed cycle, episode matcher, signal merge, progress
//! write-back, intent queue) and the coordinator that wires them together.

pub mod coordinator;
pub mod dispatcher;
pub mod matcher;
pub mod merge;
pub mod now_playing;
pub mod persistence;
pub mod speed;

pub use coordinator::{CoordinatorConfig, PlaybackCoordinator, DEFAULT_MEDIA_ROOT_ID};
pub use dispatcher::{EventDispatcher, UiEvent};
pub use matcher::match_episode;
pub use merge::{derive_playback_state, PlaybackState, SignalSlots};
pub use now_playing::{NowPlayingEpisode, NowPlayingState, PodcastState};
pub use persistence::{PersistencePolicy, PositionWriter};
pub use speed::SpeedController;
