//! Playback speed cycle
//!
//! Holds the current speed multiplier and the fixed ascending cycle of
//! supported rates. The current value is published on a watch channel and is
//! one of the five signals the merge combines.

use crate::error::{Error, Result};
use tokio::sync::watch;

/// Supported multipliers when none are configured
pub const DEFAULT_SPEED_RATES: [f32; 3] = [1.0, 1.5, 2.0];

/// Rates closer than this are considered the same cycle entry
const RATE_EPSILON: f32 = 1e-3;

/// Owner of the local speed signal
#[derive(Debug)]
pub struct SpeedController {
    rates: Vec<f32>,
    tx: watch::Sender<f32>,
}

impl SpeedController {
    /// Create a controller starting at the first rate of the cycle
    ///
    /// Rejects an empty cycle, non-positive rates, and cycles that are not
    /// strictly ascending.
    pub fn new(rates: Vec<f32>) -> Result<Self> {
        validate_rates(&rates)?;
        let (tx, _) = watch::channel(rates[0]);
        Ok(Self { rates, tx })
    }

    /// Next rate after `current`
    ///
    /// Wraps to the first entry when `current` is the last entry or is not
    /// part of the cycle at all.
    pub fn advance(&self, current: f32) -> f32 {
        let index = self
            .rates
            .iter()
            .position(|rate| (rate - current).abs() < RATE_EPSILON);

        match index {
            Some(i) if i + 1 < self.rates.len() => self.rates[i + 1],
            _ => self.rates[0],
        }
    }

    /// Currently applied rate
    pub fn current(&self) -> f32 {
        *self.tx.borrow()
    }

    /// Publish an explicit rate
    pub fn set(&self, rate: f32) {
        self.tx.send_replace(rate);
    }

    /// Subscribe to the speed signal
    pub fn subscribe(&self) -> watch::Receiver<f32> {
        self.tx.subscribe()
    }
}

impl Default for SpeedController {
    fn default() -> Self {
        let rates = DEFAULT_SPEED_RATES.to_vec();
        let (tx, _) = watch::channel(rates[0]);
        Self { rates, tx }
    }
}

/// Check a configured cycle of rates
pub fn validate_rates(rates: &[f32]) -> Result<()> {
    if rates.is_empty() {
        return Err(Error::Config("speed_rates must not be empty".to_string()));
    }
    if let Some(rate) = rates.iter().find(|r| !r.is_finite() || **r <= 0.0) {
        return Err(Error::Config(format!("speed rate {} must be positive", rate)));
    }
    if rates.windows(2).any(|w| w[1] <= w[0]) {
        return Err(Error::Config(
            "speed_rates must be strictly ascending".to_string(),
        ));
    }
    Ok(())
}
