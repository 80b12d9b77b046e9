//! Configuration for castaway-player
//!
//! Bootstrap settings come from a TOML file (see
//! `castaway_common::config` for how the file is located), then command-line
//! overrides are applied. Every field has a built-in default, so a missing
//! file still yields a runnable player.

use crate::engine::LoopbackConfig;
use crate::error::{Error, Result};
use crate::playback::speed::{validate_rates, DEFAULT_SPEED_RATES};
use crate::playback::{CoordinatorConfig, DEFAULT_MEDIA_ROOT_ID};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct TomlConfig {
    /// HTTP server port
    pub port: u16,

    /// Path to SQLite catalog database file
    pub database_path: PathBuf,

    /// Feed loaded whenever the engine connects (local JSON export or file:// URL)
    pub feed_url: String,

    /// Media root the coordinator subscribes to
    pub media_root_id: String,

    /// Speed cycle, strictly ascending
    pub speed_rates: Vec<f32>,

    /// Capacity of the notification broadcast channel
    pub event_bus_capacity: usize,

    pub engine: EngineConfig,

    pub logging: LoggingConfig,
}

/// Loopback engine settings
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Position tick interval in milliseconds
    pub tick_interval_ms: u64,
    pub fast_forward_ms: i64,
    pub rewind_ms: i64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); `RUST_LOG` wins when set
    pub level: String,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            port: 5810,
            database_path: castaway_common::config::default_data_dir().join("castaway.db"),
            feed_url: String::new(),
            media_root_id: DEFAULT_MEDIA_ROOT_ID.to_string(),
            speed_rates: DEFAULT_SPEED_RATES.to_vec(),
            event_bus_capacity: 100,
            engine: EngineConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        let loopback = LoopbackConfig::default();
        Self {
            tick_interval_ms: loopback.tick_interval.as_millis() as u64,
            fast_forward_ms: loopback.fast_forward_ms,
            rewind_ms: loopback.rewind_ms,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Command-line overrides
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub port: Option<u16>,
    pub database_path: Option<PathBuf>,
    pub feed_url: Option<String>,
}

impl TomlConfig {
    /// Load from the given file (if any), apply overrides, then validate
    pub fn load(path: Option<&Path>, overrides: CliOverrides) -> Result<Self> {
        let config: TomlConfig = castaway_common::config::load_toml(path)
            .map_err(|e| Error::Config(e.to_string()))?;
        let config = config.with_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    pub fn with_overrides(mut self, overrides: CliOverrides) -> Self {
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(path) = overrides.database_path {
            self.database_path = path;
        }
        if let Some(url) = overrides.feed_url {
            self.feed_url = url;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_rates(&self.speed_rates)?;
        if self.engine.tick_interval_ms == 0 {
            return Err(Error::Config("engine.tick_interval_ms must be > 0".to_string()));
        }
        if self.event_bus_capacity == 0 {
            return Err(Error::Config("event_bus_capacity must be > 0".to_string()));
        }
        if self.media_root_id.is_empty() {
            return Err(Error::Config("media_root_id must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn coordinator(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            feed_url: self.feed_url.clone(),
            media_root_id: self.media_root_id.clone(),
            speed_rates: self.speed_rates.clone(),
            event_bus_capacity: self.event_bus_capacity,
        }
    }

    pub fn loopback(&self) -> LoopbackConfig {
        LoopbackConfig {
            tick_interval: Duration::from_millis(self.engine.tick_interval_ms),
            fast_forward_ms: self.engine.fast_forward_ms,
            rewind_ms: self.engine.rewind_ms,
        }
    }
}
