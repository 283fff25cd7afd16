//! Time sources for the resilience core
//!
//! Every timeout decision (breaker cool-down, heartbeat staleness, uptime)
//! reads time through a [`Clock`] so that the same code runs against the
//! wall clock in production and against a hand-advanced clock in tests and
//! simulations. Nothing here sleeps.

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Monotonic time source
///
/// `now()` returns the elapsed time since the clock's origin. Only
/// differences between two readings of the same clock are meaningful.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current time since the clock origin
    fn now(&self) -> Duration;
}

/// Wall-clock time backed by [`Instant`]
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Manually advanced clock
///
/// Clones share the same underlying time, so a test can hold one handle
/// and advance it while the strategy under test reads through another.
///
/// ```
/// use relink_core::core::clock::{Clock, ManualClock};
/// use std::time::Duration;
///
/// let clock = ManualClock::new();
/// let handle = clock.clone();
/// handle.advance(Duration::from_secs(5));
/// assert_eq!(clock.now(), Duration::from_secs(5));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<Mutex<Duration>>,
}

impl ManualClock {
    /// Create a clock starting at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now = now.saturating_add(by);
    }

    /// Move time forward by `ms` milliseconds
    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }

    /// Jump to an absolute time. Earlier values are ignored (time never goes back).
    pub fn set(&self, to: Duration) {
        let mut now = self.now.lock();
        if to > *now {
            *now = to;
        }
    }
}

impl Clock for ManualClock {
    #[inline]
    fn now(&self) -> Duration {
        *self.now.lock()
    }
}

/// Shared clock handle used throughout the crate
pub type SharedClock = Arc<dyn Clock>;

/// Default shared clock (wall clock)
pub fn system_clock() -> SharedClock {
    Arc::new(SystemClock::new())
}
