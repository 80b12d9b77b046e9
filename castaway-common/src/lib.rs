//! # Castaway Common Library
//!
//! Shared code for the Castaway podcast player crates:
//! - Catalog models (feeds, episodes, saved playback progress)
//! - Engine-facing playback types (transport state, track metadata)
//! - Event types (CastawayEvent enum) and the EventBus
//! - Configuration file resolution
//! - Human-readable position formatting

pub mod config;
pub mod error;
pub mod events;
pub mod human_time;
pub mod models;

pub use error::{Error, Result};
pub use models::{Episode, FeedData, FeedInfo, PlaybackPosition};
