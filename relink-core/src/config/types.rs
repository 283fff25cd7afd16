use super::constants::*;
use crate::core::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Per-connection reconnect policy
///
/// Immutable once handed to a strategy. Missing fields in a JSON document
/// fall back to the defaults in [`constants`](super::constants).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    /// Attempts allowed per episode
    pub max_retries: u32,

    /// Delay before the first retry (ms)
    pub base_delay_ms: u64,

    /// Cap on the un-jittered delay (ms)
    pub max_delay_ms: u64,

    /// Jitter as a fraction of the delay, 0.0 to 1.0
    pub jitter_factor: f64,

    /// Growth factor per attempt (typically 2.0)
    pub backoff_multiplier: f64,

    /// Consecutive failures before the breaker opens
    pub circuit_breaker_threshold: u32,

    /// Breaker cool-down before a probe is allowed (ms)
    pub circuit_breaker_timeout_ms: u64,

    /// Retained sequence ids for duplicate detection
    #[serde(alias = "sequence_validation_window")]
    pub sequence_window_size: usize,

    /// Heartbeat silence tolerated while connected (ms)
    pub heartbeat_timeout_ms: u64,

    /// Advisory dial timeout for the transport (ms)
    pub connection_timeout_ms: u64,

    /// Advisory interval between heartbeat checks (ms)
    pub health_check_interval_ms: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            jitter_factor: DEFAULT_JITTER_FACTOR,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            circuit_breaker_threshold: DEFAULT_CIRCUIT_BREAKER_THRESHOLD,
            circuit_breaker_timeout_ms: DEFAULT_CIRCUIT_BREAKER_TIMEOUT_MS,
            sequence_window_size: DEFAULT_SEQUENCE_WINDOW_SIZE,
            heartbeat_timeout_ms: DEFAULT_HEARTBEAT_TIMEOUT_MS,
            connection_timeout_ms: DEFAULT_CONNECTION_TIMEOUT_MS,
            health_check_interval_ms: DEFAULT_HEALTH_CHECK_INTERVAL_MS,
        }
    }
}

impl ReconnectConfig {
    /// Fast retries and a short cool-down (local development, tests)
    pub fn aggressive() -> Self {
        Self {
            max_retries: 5,
            base_delay_ms: 10,
            max_delay_ms: 1_000,
            backoff_multiplier: 1.5,
            circuit_breaker_threshold: 3,
            circuit_breaker_timeout_ms: 5_000,
            heartbeat_timeout_ms: 5_000,
            ..Default::default()
        }
    }

    /// Slow, patient retries (production feeds behind rate limits)
    pub fn conservative() -> Self {
        Self {
            max_retries: 20,
            base_delay_ms: 2_000,
            max_delay_ms: 60_000,
            jitter_factor: 0.2,
            circuit_breaker_threshold: 10,
            circuit_breaker_timeout_ms: 120_000,
            ..Default::default()
        }
    }

    /// Check every field against its allowed range
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.jitter_factor) {
            return Err(ConfigError::invalid(
                "jitter_factor",
                format!("{} is outside 0.0..=1.0", self.jitter_factor),
            ));
        }

        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(ConfigError::invalid(
                "backoff_multiplier",
                format!("{} must be a finite value >= 1.0", self.backoff_multiplier),
            ));
        }

        if self.max_delay_ms == 0 {
            return Err(ConfigError::invalid("max_delay_ms", "must be positive"));
        }

        if self.base_delay_ms > self.max_delay_ms {
            return Err(ConfigError::invalid(
                "base_delay_ms",
                format!(
                    "{} exceeds max_delay_ms ({})",
                    self.base_delay_ms, self.max_delay_ms
                ),
            ));
        }

        if self.circuit_breaker_threshold == 0 {
            return Err(ConfigError::invalid(
                "circuit_breaker_threshold",
                "must be at least 1",
            ));
        }

        if self.sequence_window_size == 0 {
            return Err(ConfigError::invalid(
                "sequence_window_size",
                "must be at least 1",
            ));
        }

        Ok(())
    }

    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    pub fn circuit_breaker_timeout(&self) -> Duration {
        Duration::from_millis(self.circuit_breaker_timeout_ms)
    }

    pub fn heartbeat_timeout(&self) -> Duration {
        Duration::from_millis(self.heartbeat_timeout_ms)
    }

    pub fn connection_timeout(&self) -> Duration {
        Duration::from_millis(self.connection_timeout_ms)
    }

    pub fn health_check_interval(&self) -> Duration {
        Duration::from_millis(self.health_check_interval_ms)
    }
}
