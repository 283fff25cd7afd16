//! Default values for [`ReconnectConfig`](super::ReconnectConfig)
//!
//! All durations are milliseconds.

// ===== RETRY BUDGET =====

/// Attempts allowed per episode before `should_reconnect` gives up
pub const DEFAULT_MAX_RETRIES: u32 = 10;

// ===== BACKOFF =====

/// Delay before the first retry
pub const DEFAULT_BASE_DELAY_MS: u64 = 1_000;

/// Upper bound on the un-jittered backoff delay
pub const DEFAULT_MAX_DELAY_MS: u64 = 30_000;

/// Fraction of the delay used as +/- jitter (10%)
pub const DEFAULT_JITTER_FACTOR: f64 = 0.1;

/// Growth factor per attempt
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

// ===== CIRCUIT BREAKER =====

/// Consecutive failures that trip the breaker
pub const DEFAULT_CIRCUIT_BREAKER_THRESHOLD: u32 = 5;

/// Cool-down before the breaker lets a probe through
pub const DEFAULT_CIRCUIT_BREAKER_TIMEOUT_MS: u64 = 60_000;

// ===== DATA INTEGRITY =====

/// Recently accepted sequence ids retained for duplicate detection
pub const DEFAULT_SEQUENCE_WINDOW_SIZE: usize = 1_000;

/// Heartbeat silence tolerated while connected
pub const DEFAULT_HEARTBEAT_TIMEOUT_MS: u64 = 30_000;

// ===== ADVISORY (not enforced by the core) =====

/// Dial timeout the transport should apply
pub const DEFAULT_CONNECTION_TIMEOUT_MS: u64 = 10_000;

/// How often the transport should call `check_heartbeat`
pub const DEFAULT_HEALTH_CHECK_INTERVAL_MS: u64 = 5_000;
