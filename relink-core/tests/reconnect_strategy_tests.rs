//! Reconnect Strategy Tests
//!
//! Drives a ReconnectStrategy the way a transport would: attempts,
//! outcomes, disconnects, heartbeats. Verifies episodes, backoff delays,
//! metrics, and callback isolation.

use relink_core::core::{LifecycleState, ManualClock, ReconnectReason};
use relink_core::resilience::{ReconnectManager, ReconnectStrategy};
use relink_core::ReconnectConfig;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn with_clock(config: ReconnectConfig) -> (ReconnectStrategy, ManualClock) {
    let clock = ManualClock::new();
    let strategy = ReconnectStrategy::with_clock("feed", config, Arc::new(clock.clone()));
    (strategy, clock)
}

// ============================================================================
// EPISODES AND BACKOFF
// ============================================================================

/// Test: two_failures_then_success
///
/// maxRetries 3, base 1000ms, multiplier 2.0, cap 10s:
/// - attempt delays ≈ 1000ms and ≈ 2000ms (±10% jitter)
/// - metrics {total 3, successful 1, failed 2}
/// - final state Connected
#[test]
fn test_two_failures_then_success() {
    let config = ReconnectConfig {
        max_retries: 3,
        base_delay_ms: 1_000,
        backoff_multiplier: 2.0,
        max_delay_ms: 10_000,
        ..Default::default()
    };
    let (strategy, _) = with_clock(config);

    let first = strategy.record_connection_attempt(ReconnectReason::Initial);
    strategy.record_connection_failure("refused");
    let second = strategy.record_connection_attempt(ReconnectReason::Error);
    strategy.record_connection_failure("refused");

    assert_eq!(first.attempt_number, 1);
    assert_eq!(second.attempt_number, 2);
    assert!((900..=1_100).contains(&first.delay_ms), "got {}", first.delay_ms);
    assert!((1_800..=2_200).contains(&second.delay_ms), "got {}", second.delay_ms);

    assert!(strategy.should_reconnect());
    strategy.record_connection_attempt(ReconnectReason::Error);
    strategy.record_connection_success();

    let metrics = strategy.metrics();
    assert_eq!(metrics.total_connections, 3);
    assert_eq!(metrics.successful_connections, 1);
    assert_eq!(metrics.failed_connections, 2);
    assert_eq!(metrics.reconnect_attempts, 3);
    assert_eq!(strategy.state(), LifecycleState::Connected);
}

/// Test: success_ends_episode
///
/// After any success the attempt list is empty and numbering restarts.
#[test]
fn test_success_ends_episode() {
    let (strategy, _) = with_clock(ReconnectConfig::default());

    for _ in 0..4 {
        strategy.record_connection_attempt(ReconnectReason::Timeout);
        strategy.record_connection_failure("timeout");
    }
    assert_eq!(strategy.reconnect_attempts().len(), 4);

    strategy.record_connection_attempt(ReconnectReason::Timeout);
    strategy.record_connection_success();
    assert!(strategy.reconnect_attempts().is_empty());
    assert_eq!(strategy.state(), LifecycleState::Connected);

    strategy.record_disconnection(ReconnectReason::Disconnect);
    let next = strategy.record_connection_attempt(ReconnectReason::Disconnect);
    assert_eq!(next.attempt_number, 1);
}

/// Test: connected_never_reconnects
#[test]
fn test_connected_never_reconnects() {
    let (strategy, _) = with_clock(ReconnectConfig::default());
    strategy.record_connection_success();
    assert!(!strategy.should_reconnect());
}

/// Test: zero_retries_blocks_everything
#[test]
fn test_zero_retries_blocks_everything() {
    let config = ReconnectConfig {
        max_retries: 0,
        ..Default::default()
    };
    let (strategy, _) = with_clock(config);
    assert!(!strategy.should_reconnect());
}

/// Test: delays_are_capped
#[test]
fn test_delays_are_capped() {
    let config = ReconnectConfig {
        base_delay_ms: 1_000,
        max_delay_ms: 5_000,
        jitter_factor: 0.1,
        ..Default::default()
    };
    let (strategy, _) = with_clock(config);

    for n in 0..64 {
        let d = strategy.calculate_delay(n);
        assert!(d <= 5_500, "attempt {} delay {} above cap", n, d);
    }
}

/// Test: unvalidated_config_episode_is_total
///
/// Configs that `validate()` would reject can still be registered. A full
/// attempt/failure episode on them must not panic and must hand out
/// non-negative, capped delays.
#[test]
fn test_unvalidated_config_episode_is_total() {
    let manager = ReconnectManager::new();
    let configs = [
        ReconnectConfig {
            backoff_multiplier: -2.0,
            ..Default::default()
        },
        ReconnectConfig {
            backoff_multiplier: f64::NEG_INFINITY,
            jitter_factor: -3.0,
            ..Default::default()
        },
        ReconnectConfig {
            backoff_multiplier: f64::NAN,
            jitter_factor: f64::NAN,
            base_delay_ms: 50_000,
            max_delay_ms: 1_000,
            ..Default::default()
        },
    ];

    for (i, config) in configs.into_iter().enumerate() {
        let cap = config.max_delay_ms;
        let strategy = manager.add_strategy(format!("feed-{}", i), config);

        for n in 0..4 {
            let reason = if n == 0 {
                ReconnectReason::Initial
            } else {
                ReconnectReason::Error
            };
            let attempt = strategy.record_connection_attempt(reason);
            assert!(attempt.delay_ms <= cap + cap / 10, "delay {}", attempt.delay_ms);
            strategy.record_connection_failure("refused");
        }
        assert!(strategy.next_delay() <= cap + cap / 10);
        assert_eq!(strategy.metrics().failed_connections, 4);
    }
}

// ============================================================================
// DISCONNECTS
// ============================================================================

/// Test: disconnect_records_uptime_and_fires_callback
#[test]
fn test_disconnect_records_uptime_and_fires_callback() {
    let (strategy, clock) = with_clock(ReconnectConfig::default());
    let disconnects = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&disconnects);
    strategy.on_disconnect(move |name, reason| {
        assert_eq!(name, "feed");
        assert_eq!(reason, ReconnectReason::Timeout);
        counter.fetch_add(1, Ordering::SeqCst);
    });

    strategy.record_connection_success();
    clock.advance(Duration::from_secs(90));
    strategy.record_disconnection(ReconnectReason::Timeout);

    assert_eq!(strategy.state(), LifecycleState::Disconnected);
    assert_eq!(strategy.metrics().uptime_seconds, 90.0);
    assert_eq!(disconnects.load(Ordering::SeqCst), 1);

    // Second disconnect is a no-op
    strategy.record_disconnection(ReconnectReason::Timeout);
    assert_eq!(disconnects.load(Ordering::SeqCst), 1);
}

/// Test: force_reconnect_from_connected
#[test]
fn test_force_reconnect_from_connected() {
    let (strategy, _) = with_clock(ReconnectConfig::default());
    let reasons = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let sink = Arc::clone(&reasons);
    strategy.on_disconnect(move |_, reason| sink.lock().push(reason));

    strategy.record_connection_success();
    strategy.force_reconnect();

    assert_eq!(strategy.state(), LifecycleState::Reconnecting);
    assert_eq!(*reasons.lock(), vec![ReconnectReason::Manual]);
    assert!(strategy.should_reconnect());
}

/// Test: force_reconnect_when_idle
#[test]
fn test_force_reconnect_when_idle() {
    let (strategy, _) = with_clock(ReconnectConfig::default());
    let fired = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&fired);
    strategy.on_disconnect(move |_, _| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    strategy.force_reconnect();

    assert_eq!(strategy.state(), LifecycleState::Reconnecting);
    assert_eq!(fired.load(Ordering::SeqCst), 0);
}

// ============================================================================
// HEARTBEATS
// ============================================================================

/// Test: heartbeat_staleness
///
/// Verifies that:
/// - A fresh connection's heartbeat is healthy
/// - Silence longer than the timeout counts a miss per check
/// - A pulse restores health
#[test]
fn test_heartbeat_staleness() {
    let config = ReconnectConfig {
        heartbeat_timeout_ms: 30_000,
        ..Default::default()
    };
    let (strategy, clock) = with_clock(config);
    strategy.record_connection_success();

    clock.advance_ms(30_000);
    assert!(strategy.check_heartbeat(), "exactly at the timeout is not stale");

    clock.advance_ms(1);
    assert!(!strategy.check_heartbeat());
    assert!(!strategy.check_heartbeat());
    assert_eq!(strategy.metrics().heartbeat_misses, 2);

    strategy.update_heartbeat();
    assert!(strategy.check_heartbeat());
    assert_eq!(strategy.metrics().heartbeat_misses, 2);

    // Staleness never disconnects by itself
    assert!(strategy.is_connected());
}

/// Test: heartbeat_ignored_when_not_connected
#[test]
fn test_heartbeat_ignored_when_not_connected() {
    let config = ReconnectConfig {
        heartbeat_timeout_ms: 10,
        ..Default::default()
    };
    let (strategy, clock) = with_clock(config);

    clock.advance_ms(1_000);
    assert!(strategy.check_heartbeat());
    assert_eq!(strategy.metrics().heartbeat_misses, 0);
}

// ============================================================================
// CALLBACK ISOLATION
// ============================================================================

/// Test: panicking_callbacks_do_not_corrupt_state
///
/// A panic inside any callback is logged and swallowed; the transition
/// that triggered it has already been committed.
#[test]
fn test_panicking_callbacks_do_not_corrupt_state() {
    let config = ReconnectConfig {
        circuit_breaker_threshold: 1,
        ..Default::default()
    };
    let (strategy, _) = with_clock(config);
    strategy.on_connect(|_| panic!("connect hook exploded"));
    strategy.on_disconnect(|_, _| panic!("disconnect hook exploded"));
    strategy.on_circuit_open(|_| std::panic::panic_any(String::from("breaker hook exploded")));

    strategy.record_connection_success();
    assert_eq!(strategy.state(), LifecycleState::Connected);

    strategy.record_disconnection(ReconnectReason::Error);
    assert_eq!(strategy.state(), LifecycleState::Disconnected);

    strategy.record_connection_failure("down");
    assert_eq!(strategy.state(), LifecycleState::CircuitOpen);

    let metrics = strategy.metrics();
    assert_eq!(metrics.successful_connections, 1);
    assert_eq!(metrics.failed_connections, 1);
}

/// Test: callbacks_fire_in_order
#[test]
fn test_callbacks_fire_in_order() {
    let (strategy, _) = with_clock(ReconnectConfig::default());
    let log = Arc::new(parking_lot::Mutex::new(Vec::new()));

    let sink = Arc::clone(&log);
    strategy.on_connect(move |_| sink.lock().push("connect"));
    let sink = Arc::clone(&log);
    strategy.on_disconnect(move |_, _| sink.lock().push("disconnect"));

    strategy.record_connection_success();
    strategy.record_disconnection(ReconnectReason::Disconnect);
    strategy.record_connection_success();

    assert_eq!(*log.lock(), vec!["connect", "disconnect", "connect"]);
}

// ============================================================================
// SNAPSHOTS
// ============================================================================

/// Test: getters_return_copies
#[test]
fn test_getters_return_copies() {
    let (strategy, _) = with_clock(ReconnectConfig::default());
    strategy.record_connection_attempt(ReconnectReason::Initial);

    let mut attempts = strategy.reconnect_attempts();
    attempts.clear();
    let mut metrics = strategy.metrics();
    metrics.reconnect_attempts = 99;

    assert_eq!(strategy.reconnect_attempts().len(), 1);
    assert_eq!(strategy.metrics().reconnect_attempts, 1);
}

/// Test: reset_metrics_keeps_lifecycle
#[test]
fn test_reset_metrics_keeps_lifecycle() {
    let (strategy, _) = with_clock(ReconnectConfig::default());
    strategy.record_connection_attempt(ReconnectReason::Initial);
    strategy.record_connection_success();

    strategy.reset_metrics();

    let metrics = strategy.metrics();
    assert_eq!(metrics.total_connections, 0);
    assert_eq!(metrics.reconnect_attempts, 0);
    assert!(strategy.reconnect_attempts().is_empty());
    assert_eq!(strategy.state(), LifecycleState::Connected);
}
