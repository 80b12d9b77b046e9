//! Test helper modules for castaway-player integration tests
//!
//! Provides reusable test infrastructure components:
//! - RecordingEngine: scriptable engine signals plus a log of control calls
//! - MemoryCatalog: in-memory catalog with injectable failures
//! - fixtures: episode/feed builders and wait helpers

#![allow(dead_code)]

pub mod fixtures;
pub mod memory_catalog;
pub mod recording_engine;

pub use fixtures::{episode, eventually, feed, wait_for_event, wait_for_value, FEED_URL};
pub use memory_catalog::MemoryCatalog;
pub use recording_engine::{EngineCall, RecordingEngine};
