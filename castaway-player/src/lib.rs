//! # Castaway Player Library (castaway-player)
//!
//! Playback state coordinator for the Castaway podcast client.
//!
//! **Purpose:** Merge the asynchronous signals of a playback engine into one
//! consistent playback state, serialize user intents against it, and keep
//! per-episode listening progress stored in the catalog.
//!
//! **Architecture:** One coordinator task per subscription (tokio), watch
//! channels for derived state, broadcast EventBus for notifications, SQLite
//! catalog, axum HTTP/SSE surface.

pub mod api;
pub mod catalog;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod playback;

pub use error::{Error, Result};
pub use playback::PlaybackCoordinator;
