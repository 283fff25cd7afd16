//! Per-connection reconnect decision engine
//!
//! A [`ReconnectStrategy`] is driven by the transport layer: it reports
//! lifecycle events (attempt started, connected, failed, disconnected),
//! every inbound sequence id, and heartbeat pulses. In return it answers
//! one question, [`should_reconnect`](ReconnectStrategy::should_reconnect),
//! and hands out advisory backoff delays.
//!
//! The strategy never dials, sleeps or blocks on I/O. Each instance owns a
//! [`SequenceValidator`], a [`CircuitBreaker`] and its [`ConnectionMetrics`],
//! all behind one mutex so concurrent callers see fully applied transitions.
//!
//! Callbacks run synchronously before the triggering call returns, but
//! after the lock is released, so a callback may call back into the
//! strategy. A panicking callback is logged and swallowed.

use super::backoff;
use super::circuit_breaker::{CircuitBreaker, CircuitBreakerSnapshot, CircuitState};
use super::metrics::{AttemptRecord, ConnectionMetrics};
use super::sequence::{SequenceClass, SequenceStats, SequenceValidation, SequenceValidator};
use crate::config::ReconnectConfig;
use crate::core::clock::{system_clock, SharedClock};
use crate::core::types::{LifecycleState, ReconnectReason};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Called with the connection name after a successful connect
pub type ConnectCallback = Arc<dyn Fn(&str) + Send + Sync>;
/// Called with the connection name and the teardown reason
pub type DisconnectCallback = Arc<dyn Fn(&str, ReconnectReason) + Send + Sync>;
/// Called with the connection name when the breaker trips
pub type CircuitOpenCallback = Arc<dyn Fn(&str) + Send + Sync>;

#[derive(Clone, Default)]
struct Callbacks {
    on_connect: Option<ConnectCallback>,
    on_disconnect: Option<DisconnectCallback>,
    on_circuit_open: Option<CircuitOpenCallback>,
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_connect", &self.on_connect.is_some())
            .field("on_disconnect", &self.on_disconnect.is_some())
            .field("on_circuit_open", &self.on_circuit_open.is_some())
            .finish()
    }
}

/// Transition side effects, delivered once the lock is dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Notification {
    Connected,
    Disconnected(ReconnectReason),
    CircuitOpened,
}

/// Everything a status endpoint needs, captured under one lock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyStatus {
    pub name: String,
    pub state: LifecycleState,
    pub metrics: ConnectionMetrics,
    pub sequence: SequenceStats,
    pub circuit: CircuitBreakerSnapshot,
    /// Attempts in the current episode
    pub episode_attempts: usize,
}

#[derive(Debug)]
struct StrategyInner {
    state: LifecycleState,
    attempts: Vec<AttemptRecord>,
    metrics: ConnectionMetrics,
    connection_start_at: Option<Duration>,
    last_heartbeat_at: Option<Duration>,
    validator: SequenceValidator,
    breaker: CircuitBreaker,
    callbacks: Callbacks,
}

impl StrategyInner {
    fn new(config: &ReconnectConfig, clock: &SharedClock) -> Self {
        Self {
            state: LifecycleState::Disconnected,
            attempts: Vec::new(),
            metrics: ConnectionMetrics::default(),
            connection_start_at: None,
            last_heartbeat_at: None,
            validator: SequenceValidator::new(config.sequence_window_size),
            breaker: fresh_breaker(config, clock),
            callbacks: Callbacks::default(),
        }
    }

    fn disconnect(
        &mut self,
        name: &str,
        reason: ReconnectReason,
        now: Duration,
        events: &mut Vec<Notification>,
    ) -> bool {
        if self.state != LifecycleState::Connected {
            return false;
        }

        self.state = LifecycleState::Disconnected;
        let uptime = self
            .connection_start_at
            .take()
            .map(|start| now.saturating_sub(start))
            .unwrap_or_default();
        self.metrics.uptime_seconds = uptime.as_secs_f64();

        info!(
            connection = %name,
            %reason,
            uptime_secs = self.metrics.uptime_seconds,
            "Connection lost"
        );
        events.push(Notification::Disconnected(reason));
        true
    }

    fn metrics_at(&self, now: Duration) -> ConnectionMetrics {
        let mut metrics = self.metrics.clone();
        if self.state == LifecycleState::Connected {
            if let Some(start) = self.connection_start_at {
                metrics.uptime_seconds = now.saturating_sub(start).as_secs_f64();
            }
        }
        metrics
    }
}

fn fresh_breaker(config: &ReconnectConfig, clock: &SharedClock) -> CircuitBreaker {
    CircuitBreaker::new(
        config.circuit_breaker_threshold,
        config.circuit_breaker_timeout(),
        Arc::clone(clock),
    )
}

/// Reconnect policy and bookkeeping for one named connection
pub struct ReconnectStrategy {
    name: String,
    config: ReconnectConfig,
    clock: SharedClock,
    inner: Mutex<StrategyInner>,
}

impl fmt::Debug for ReconnectStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReconnectStrategy")
            .field("name", &self.name)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ReconnectStrategy {
    /// Create a strategy reading the wall clock
    pub fn new(name: impl Into<String>, config: ReconnectConfig) -> Self {
        Self::with_clock(name, config, system_clock())
    }

    /// Create a strategy reading time from `clock`
    pub fn with_clock(name: impl Into<String>, config: ReconnectConfig, clock: SharedClock) -> Self {
        let name = name.into();
        debug!(connection = %name, ?config, "Creating reconnect strategy");
        let inner = StrategyInner::new(&config, &clock);
        Self {
            name,
            config,
            clock,
            inner: Mutex::new(inner),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &ReconnectConfig {
        &self.config
    }

    /// Run `f` under the lock, then deliver whatever it queued
    fn transition<T>(&self, f: impl FnOnce(&mut StrategyInner, &mut Vec<Notification>) -> T) -> T {
        let mut events = Vec::new();
        let (result, callbacks) = {
            let mut inner = self.inner.lock();
            let result = f(&mut inner, &mut events);
            let callbacks = if events.is_empty() {
                None
            } else {
                Some(inner.callbacks.clone())
            };
            (result, callbacks)
        };

        if let Some(callbacks) = callbacks {
            for event in events {
                self.notify(&callbacks, event);
            }
        }
        result
    }

    fn notify(&self, callbacks: &Callbacks, event: Notification) {
        let name = self.name.as_str();
        let (hook, outcome) = match event {
            Notification::Connected => (
                "on_connect",
                callbacks
                    .on_connect
                    .as_ref()
                    .map(|cb| catch_unwind(AssertUnwindSafe(|| cb(name)))),
            ),
            Notification::Disconnected(reason) => (
                "on_disconnect",
                callbacks
                    .on_disconnect
                    .as_ref()
                    .map(|cb| catch_unwind(AssertUnwindSafe(|| cb(name, reason)))),
            ),
            Notification::CircuitOpened => (
                "on_circuit_open",
                callbacks
                    .on_circuit_open
                    .as_ref()
                    .map(|cb| catch_unwind(AssertUnwindSafe(|| cb(name)))),
            ),
        };

        if let Some(Err(payload)) = outcome {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "<no message>".to_string());
            error!(connection = %name, hook, %message, "Reconnect callback panicked; ignoring");
        }
    }

    // ------------------------------------------------------------------
    // Callback registration
    // ------------------------------------------------------------------

    /// Register the connect callback, replacing any previous one
    ///
    /// Callbacks from transitions racing on other threads may be delivered
    /// in a different order than the transitions committed.
    pub fn on_connect<F>(&self, f: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.inner.lock().callbacks.on_connect = Some(Arc::new(f));
    }

    /// Register the disconnect callback, replacing any previous one
    ///
    /// Callbacks from transitions racing on other threads may be delivered
    /// in a different order than the transitions committed.
    pub fn on_disconnect<F>(&self, f: F)
    where
        F: Fn(&str, ReconnectReason) + Send + Sync + 'static,
    {
        self.inner.lock().callbacks.on_disconnect = Some(Arc::new(f));
    }

    /// Register the circuit-open callback, replacing any previous one
    pub fn on_circuit_open<F>(&self, f: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.inner.lock().callbacks.on_circuit_open = Some(Arc::new(f));
    }

    // ------------------------------------------------------------------
    // Decisions
    // ------------------------------------------------------------------

    /// Jittered backoff delay for a zero-based attempt index (ms)
    pub fn calculate_delay(&self, attempt_index: u32) -> u64 {
        backoff::calculate_delay_thread_rng(&self.config, attempt_index)
    }

    /// Delay the next attempt of the current episode should wait (ms)
    pub fn next_delay(&self) -> u64 {
        let index = self.inner.lock().attempts.len();
        self.calculate_delay(u32::try_from(index).unwrap_or(u32::MAX))
    }

    /// The one gate a transport must consult before dialing
    ///
    /// False while the breaker blocks, once the episode has used
    /// `max_retries` attempts, or while already connected.
    pub fn should_reconnect(&self) -> bool {
        let mut inner = self.inner.lock();

        if !inner.breaker.can_attempt() {
            debug!(connection = %self.name, "Reconnect blocked by open circuit");
            return false;
        }
        if inner.attempts.len() >= self.config.max_retries as usize {
            debug!(
                connection = %self.name,
                attempts = inner.attempts.len(),
                max_retries = self.config.max_retries,
                "Reconnect budget exhausted for this episode"
            );
            return false;
        }
        inner.state != LifecycleState::Connected
    }

    // ------------------------------------------------------------------
    // Lifecycle events
    // ------------------------------------------------------------------

    /// Record that the transport is starting an attempt
    ///
    /// Returns the appended record, including the advisory delay the
    /// transport should wait before dialing.
    pub fn record_connection_attempt(&self, reason: ReconnectReason) -> AttemptRecord {
        let mut inner = self.inner.lock();

        let attempt_number = u32::try_from(inner.attempts.len() + 1).unwrap_or(u32::MAX);
        let delay_ms = self.calculate_delay(attempt_number - 1);
        let record = AttemptRecord::new(attempt_number, reason, delay_ms);

        inner.attempts.push(record.clone());
        inner.metrics.reconnect_attempts += 1;

        match inner.state {
            LifecycleState::Connected => {}
            _ if reason == ReconnectReason::Initial => inner.state = LifecycleState::Connecting,
            _ => inner.state = LifecycleState::Reconnecting,
        }

        debug!(
            connection = %self.name,
            attempt = attempt_number,
            %reason,
            delay_ms,
            "Connection attempt recorded"
        );
        record
    }

    /// Record a successful connect; closes the episode
    pub fn record_connection_success(&self) {
        let now = self.clock.now();
        self.transition(|inner, events| {
            inner.state = LifecycleState::Connected;
            inner.connection_start_at = Some(now);
            inner.last_heartbeat_at = Some(now);
            inner.metrics.successful_connections += 1;
            inner.metrics.total_connections += 1;

            let attempts = inner.attempts.len();
            if let Some(last) = inner.attempts.last_mut() {
                last.success = true;
            }
            inner.breaker.record_success();
            inner.attempts.clear();

            info!(connection = %self.name, attempts, "Connected");
            events.push(Notification::Connected);
        });
    }

    /// Record a failed connect
    pub fn record_connection_failure(&self, error_message: impl Into<String>) {
        let error_message = error_message.into();
        self.transition(|inner, events| {
            inner.state = LifecycleState::Failed;
            inner.metrics.failed_connections += 1;
            inner.metrics.total_connections += 1;

            if let Some(last) = inner.attempts.last_mut() {
                last.error_message = Some(error_message.clone());
            }

            let was_open = inner.breaker.is_open();
            inner.breaker.record_failure();

            warn!(
                connection = %self.name,
                error = %error_message,
                failures = inner.breaker.failure_count(),
                "Connection attempt failed"
            );

            if inner.breaker.is_open() {
                inner.state = LifecycleState::CircuitOpen;
                if !was_open {
                    events.push(Notification::CircuitOpened);
                }
            }
        });
    }

    /// Record that a live connection went away; no-op unless connected
    pub fn record_disconnection(&self, reason: ReconnectReason) {
        let now = self.clock.now();
        self.transition(|inner, events| {
            inner.disconnect(&self.name, reason, now, events);
        });
    }

    /// Tear down (if connected) and mark the connection as reconnecting
    pub fn force_reconnect(&self) {
        let now = self.clock.now();
        self.transition(|inner, events| {
            inner.disconnect(&self.name, ReconnectReason::Manual, now, events);
            inner.state = LifecycleState::Reconnecting;
            info!(connection = %self.name, "Forced reconnection");
        });
    }

    // ------------------------------------------------------------------
    // Data integrity
    // ------------------------------------------------------------------

    /// Classify an inbound sequence id
    ///
    /// A gap on a live connection forces a disconnect with
    /// [`ReconnectReason::SequenceGap`] so the transport redials and resyncs.
    /// Ids must be fed in the order the transport received them.
    pub fn validate_sequence_id(&self, id: i64) -> SequenceValidation {
        let now = self.clock.now();
        self.transition(|inner, events| {
            let result = inner.validator.validate(id);

            match result.class {
                SequenceClass::Gap { size } => {
                    warn!(
                        connection = %self.name,
                        sequence = id,
                        gap = size,
                        "Sequence gap detected"
                    );
                    if inner.state == LifecycleState::Connected {
                        inner.metrics.sequence_gaps += 1;
                        inner.disconnect(&self.name, ReconnectReason::SequenceGap, now, events);
                    }
                }
                SequenceClass::Duplicate | SequenceClass::OutOfOrder | SequenceClass::Invalid => {
                    debug!(
                        connection = %self.name,
                        sequence = id,
                        class = ?result.class,
                        "Sequence id rejected"
                    );
                }
                SequenceClass::Contiguous => {}
            }
            result
        })
    }

    /// Record a heartbeat pulse from the remote side
    pub fn update_heartbeat(&self) {
        let now = self.clock.now();
        self.inner.lock().last_heartbeat_at = Some(now);
    }

    /// Returns false (and counts a miss) if a live connection's heartbeat is stale
    ///
    /// The caller decides whether a miss warrants a disconnect.
    pub fn check_heartbeat(&self) -> bool {
        let now = self.clock.now();
        let mut inner = self.inner.lock();

        if inner.state != LifecycleState::Connected {
            return true;
        }

        let silence = inner
            .last_heartbeat_at
            .map(|at| now.saturating_sub(at))
            .unwrap_or_default();
        if silence > self.config.heartbeat_timeout() {
            inner.metrics.heartbeat_misses += 1;
            warn!(
                connection = %self.name,
                silence_ms = silence.as_millis() as u64,
                misses = inner.metrics.heartbeat_misses,
                "Heartbeat missed"
            );
            return false;
        }
        true
    }

    // ------------------------------------------------------------------
    // Snapshots
    // ------------------------------------------------------------------

    pub fn state(&self) -> LifecycleState {
        self.inner.lock().state
    }

    pub fn is_connected(&self) -> bool {
        self.state() == LifecycleState::Connected
    }

    /// Copy of the metrics with live uptime filled in
    pub fn metrics(&self) -> ConnectionMetrics {
        let now = self.clock.now();
        self.inner.lock().metrics_at(now)
    }

    pub fn sequence_stats(&self) -> SequenceStats {
        self.inner.lock().validator.stats()
    }

    pub fn circuit_breaker_state(&self) -> CircuitBreakerSnapshot {
        self.inner.lock().breaker.snapshot()
    }

    /// Copy of the current episode's attempts
    pub fn reconnect_attempts(&self) -> Vec<AttemptRecord> {
        self.inner.lock().attempts.clone()
    }

    /// Consistent snapshot of everything observable
    pub fn status(&self) -> StrategyStatus {
        let now = self.clock.now();
        let inner = self.inner.lock();
        StrategyStatus {
            name: self.name.clone(),
            state: inner.state,
            metrics: inner.metrics_at(now),
            sequence: inner.validator.stats(),
            circuit: inner.breaker.snapshot(),
            episode_attempts: inner.attempts.len(),
        }
    }

    /// Zero the metrics, drop attempt history, and replace the validator and breaker
    ///
    /// Lifecycle state and registered callbacks are kept.
    pub fn reset_metrics(&self) {
        let mut inner = self.inner.lock();
        inner.metrics = ConnectionMetrics::default();
        inner.attempts.clear();
        inner.validator = SequenceValidator::new(self.config.sequence_window_size);
        inner.breaker = fresh_breaker(&self.config, &self.clock);
        info!(connection = %self.name, "Reconnect metrics reset");
    }

    /// Current breaker state without triggering a HalfOpen probe transition
    pub fn circuit_state(&self) -> CircuitState {
        self.inner.lock().breaker.state()
    }
}
