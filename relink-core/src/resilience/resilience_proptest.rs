//! Property-based tests for sequence validation, backoff and the breaker
//!
//! These run thousands of randomized inputs through the pure pieces of the
//! reconnect logic.

#[cfg(test)]
mod tests {
    use super::super::backoff::{base_delay_ms, calculate_delay};
    use super::super::circuit_breaker::{CircuitBreaker, CircuitState};
    use super::super::sequence::{SequenceClass, SequenceValidator};
    use crate::config::ReconnectConfig;
    use crate::core::clock::ManualClock;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;
    use std::time::Duration;

    // ===== SEQUENCE PROPERTY TESTS =====

    /// Property: A contiguous run never reports a gap
    #[test]
    fn prop_contiguous_stream_has_no_gaps() {
        proptest!(|(start in 0i64..1_000_000, len in 1usize..500, window in 1usize..64)| {
            let mut validator = SequenceValidator::new(window);
            for id in start..start + len as i64 {
                let r = validator.validate(id);
                prop_assert!(r.valid);
                prop_assert_eq!(r.class, SequenceClass::Contiguous);
            }
            prop_assert_eq!(validator.gaps_detected(), 0);
            prop_assert!(validator.stats().window_occupancy <= window);
        });
    }

    /// Property: Every forward jump counts exactly one gap of the right size
    #[test]
    fn prop_each_jump_counts_once() {
        proptest!(|(steps in prop::collection::vec(1u64..1_000, 1..100))| {
            let mut validator = SequenceValidator::new(128);
            let mut id = 0u64;
            validator.validate(0);

            let mut expected_gaps = 0;
            for step in steps {
                id += step;
                let r = validator.validate(id as i64);
                prop_assert!(r.valid);
                if step > 1 {
                    expected_gaps += 1;
                    prop_assert_eq!(r.gap_size(), Some(step - 1));
                } else {
                    prop_assert_eq!(r.class, SequenceClass::Contiguous);
                }
            }
            prop_assert_eq!(validator.gaps_detected(), expected_gaps);
            prop_assert_eq!(validator.last_accepted(), Some(id));
        });
    }

    /// Property: Rejected ids never move the marker
    #[test]
    fn prop_rejections_leave_marker() {
        proptest!(|(ids in prop::collection::vec(-10i64..200, 1..300))| {
            let mut validator = SequenceValidator::new(16);
            for id in ids {
                let before = validator.last_accepted();
                let r = validator.validate(id);
                if r.valid {
                    let accepted = validator.last_accepted();
                    prop_assert_eq!(accepted, Some(id as u64));
                    prop_assert!(before.map_or(true, |b| (id as u64) > b));
                } else {
                    prop_assert_eq!(validator.last_accepted(), before);
                }
            }
        });
    }

    // ===== BACKOFF PROPERTY TESTS =====

    /// Property: Jittered delays stay within [0, max * (1 + jitter)]
    #[test]
    fn prop_delay_within_bounds() {
        proptest!(|(
            base in 0u64..10_000,
            max in 1u64..120_000,
            jitter in 0.0..=1.0f64,
            multiplier in 1.0..4.0f64,
            attempt in 0u32..100,
            seed in any::<u64>(),
        )| {
            let config = ReconnectConfig {
                base_delay_ms: base.min(max),
                max_delay_ms: max,
                jitter_factor: jitter,
                backoff_multiplier: multiplier,
                ..Default::default()
            };
            let mut rng = StdRng::seed_from_u64(seed);
            let delay = calculate_delay(&config, attempt, &mut rng);
            let ceiling = (max as f64 * (1.0 + jitter)).round() as u64;
            prop_assert!(delay <= ceiling, "delay {} above {}", delay, ceiling);
        });
    }

    /// Property: Any config, valid or not, yields a bounded delay without panicking
    ///
    /// `add_strategy` does not validate, so the delay math has to tolerate
    /// negative, infinite and NaN multipliers and jitter factors.
    #[test]
    fn prop_delay_total_over_any_config() {
        proptest!(|(
            base in any::<u64>(),
            max in any::<u64>(),
            jitter in any::<f64>(),
            multiplier in any::<f64>(),
            attempt in any::<u32>(),
            seed in any::<u64>(),
        )| {
            let config = ReconnectConfig {
                base_delay_ms: base,
                max_delay_ms: max,
                jitter_factor: jitter,
                backoff_multiplier: multiplier,
                ..Default::default()
            };
            let clamped_jitter = if jitter.is_nan() { 0.0 } else { jitter.clamp(0.0, 1.0) };

            let mut rng = StdRng::seed_from_u64(seed);
            let delay = calculate_delay(&config, attempt, &mut rng);
            let ceiling = max as f64 * (1.0 + clamped_jitter) + 1.0;
            prop_assert!(delay as f64 <= ceiling, "delay {} above {}", delay, ceiling);

            let raw = base_delay_ms(&config, attempt);
            prop_assert!(raw >= 0.0 && raw <= max as f64);
        });
    }

    /// Property: Without jitter delays never shrink as attempts grow
    #[test]
    fn prop_unjittered_delay_monotone() {
        proptest!(|(base in 1u64..5_000, multiplier in 1.0..3.0f64, attempt in 0u32..60)| {
            let config = ReconnectConfig {
                base_delay_ms: base,
                max_delay_ms: 60_000,
                backoff_multiplier: multiplier,
                jitter_factor: 0.0,
                ..Default::default()
            };
            let now = base_delay_ms(&config, attempt);
            let next = base_delay_ms(&config, attempt + 1);
            prop_assert!(next >= now);
            prop_assert!(next <= 60_000.0);
        });
    }

    // ===== BREAKER PROPERTY TESTS =====

    /// Property: The breaker opens exactly at the threshold
    #[test]
    fn prop_breaker_opens_at_threshold() {
        proptest!(|(threshold in 1u32..50, failures in 0u32..100)| {
            let clock = ManualClock::new();
            let mut breaker =
                CircuitBreaker::new(threshold, Duration::from_secs(60), Arc::new(clock));
            for _ in 0..failures {
                breaker.record_failure();
            }
            let expected = if failures >= threshold {
                CircuitState::Open
            } else {
                CircuitState::Closed
            };
            prop_assert_eq!(breaker.state(), expected);
        });
    }

    /// Property: A success anywhere resets the failure count
    #[test]
    fn prop_success_resets() {
        proptest!(|(threshold in 1u32..20, before in 0u32..40)| {
            let clock = ManualClock::new();
            let mut breaker =
                CircuitBreaker::new(threshold, Duration::from_millis(10), Arc::new(clock.clone()));
            for _ in 0..before {
                breaker.record_failure();
            }
            clock.advance_ms(10);
            breaker.can_attempt();
            breaker.record_success();

            prop_assert_eq!(breaker.failure_count(), 0);
            prop_assert_eq!(breaker.state(), CircuitState::Closed);
        });
    }
}
