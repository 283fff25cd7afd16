//! Circuit breaker guarding reconnect attempts
//!
//! Trips after repeated connection failures so a dead endpoint is not
//! hammered, then lets a single probe through once the cool-down expires.
//! Implements the three-state circuit breaker:
//! Closed (normal) → Open (tripped) → HalfOpen (probing) → Closed | Open
//!
//! The breaker is owned by exactly one strategy and mutated under that
//! strategy's lock, so it holds plain fields rather than atomics.

use crate::core::clock::SharedClock;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Circuit breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Normal operation, attempts pass through
    Closed,
    /// Tripped, attempts are blocked
    Open,
    /// Cool-down elapsed, one probe is allowed
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::HalfOpen => "half_open",
        }
    }
}

/// Point-in-time breaker view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitBreakerSnapshot {
    pub state: CircuitState,
    pub failure_count: u32,
    pub threshold: u32,
}

/// Failure-counting breaker with a time-based reopen probe
#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    threshold: u32,
    timeout: Duration,
    state: CircuitState,
    failure_count: u32,
    /// Clock reading of the most recent failure
    last_failure_at: Option<Duration>,
    clock: SharedClock,
}

impl CircuitBreaker {
    /// Create a closed breaker
    ///
    /// `threshold` consecutive failures open it; after `timeout` the next
    /// [`can_attempt`](Self::can_attempt) moves it to half-open.
    pub fn new(threshold: u32, timeout: Duration, clock: SharedClock) -> Self {
        debug!(threshold, timeout_ms = timeout.as_millis() as u64, "Creating circuit breaker");
        Self {
            threshold,
            timeout,
            state: CircuitState::Closed,
            failure_count: 0,
            last_failure_at: None,
            clock,
        }
    }

    /// Check whether an attempt may proceed
    ///
    /// Open transitions to HalfOpen here once the cool-down has elapsed.
    pub fn can_attempt(&mut self) -> bool {
        match self.state {
            CircuitState::Closed => true,
            CircuitState::Open => {
                if self.cooldown_elapsed() {
                    self.transition_to_half_open();
                    true
                } else {
                    false
                }
            }
            CircuitState::HalfOpen => true,
        }
    }

    fn cooldown_elapsed(&self) -> bool {
        match self.last_failure_at {
            Some(at) => self.clock.now().saturating_sub(at) >= self.timeout,
            None => true,
        }
    }

    /// Record a successful connection; always closes the breaker
    pub fn record_success(&mut self) {
        if self.state != CircuitState::Closed {
            info!(
                previous = self.state.as_str(),
                "Circuit breaker transitioning to CLOSED"
            );
        }
        self.failure_count = 0;
        self.state = CircuitState::Closed;
    }

    /// Record a failed connection
    pub fn record_failure(&mut self) {
        self.failure_count = self.failure_count.saturating_add(1);
        self.last_failure_at = Some(self.clock.now());

        if self.failure_count >= self.threshold && self.state != CircuitState::Open {
            warn!(
                failures = self.failure_count,
                threshold = self.threshold,
                "Circuit breaker TRIPPED - transitioning to OPEN"
            );
            self.state = CircuitState::Open;
        }
    }

    fn transition_to_half_open(&mut self) {
        debug!("Circuit breaker transitioning to HALF-OPEN (probing)");
        self.state = CircuitState::HalfOpen;
    }

    pub fn state(&self) -> CircuitState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == CircuitState::Open
    }

    pub fn failure_count(&self) -> u32 {
        self.failure_count
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn snapshot(&self) -> CircuitBreakerSnapshot {
        CircuitBreakerSnapshot {
            state: self.state,
            failure_count: self.failure_count,
            threshold: self.threshold,
        }
    }

    /// Time left before a probe is allowed, `None` unless Open
    pub fn remaining_cooldown(&self) -> Option<Duration> {
        if self.state != CircuitState::Open {
            return None;
        }
        let elapsed = self
            .last_failure_at
            .map(|at| self.clock.now().saturating_sub(at))
            .unwrap_or(self.timeout);
        Some(self.timeout.saturating_sub(elapsed))
    }
}
