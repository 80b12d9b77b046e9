//! Database access layer
//!
//! Schema setup and queries for the feed/episode catalog tables.

pub mod episodes;
pub mod init;

pub use init::{connect, connect_in_memory, init_schema};
