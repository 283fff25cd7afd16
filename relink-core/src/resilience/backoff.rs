//! Exponential backoff for reconnect delays
//!
//! `delay(n) = min(base * multiplier^n, max)` with uniform jitter of
//! `±jitter_factor * delay` to keep many connections from retrying in
//! lockstep. The result is advisory: nothing here waits.

use crate::config::ReconnectConfig;
use rand::Rng;

/// Un-jittered delay for a zero-based attempt index, in milliseconds
pub fn base_delay_ms(config: &ReconnectConfig, attempt_index: u32) -> f64 {
    if config.base_delay_ms == 0 {
        return 0.0;
    }
    let exponent = i32::try_from(attempt_index).unwrap_or(i32::MAX);
    let grown = config.base_delay_ms as f64 * config.backoff_multiplier.powi(exponent);
    let cap = config.max_delay_ms as f64;

    // NaN from a non-finite multiplier collapses to the cap; a negative
    // multiplier can drive the product below zero
    if grown.is_nan() {
        cap
    } else {
        grown.clamp(0.0, cap)
    }
}

/// Jittered delay for a zero-based attempt index, in milliseconds
///
/// Always within `[0, max_delay_ms * (1 + jitter_factor)]`.
pub fn calculate_delay<R: Rng + ?Sized>(
    config: &ReconnectConfig,
    attempt_index: u32,
    rng: &mut R,
) -> u64 {
    let delay = base_delay_ms(config, attempt_index);
    let jitter_factor = sanitized_jitter(config.jitter_factor);

    if jitter_factor == 0.0 || delay == 0.0 {
        return delay.round() as u64;
    }

    let spread = (jitter_factor * delay).abs();
    let offset = rng.gen_range(-spread..=spread);
    (delay + offset).max(0.0).round() as u64
}

/// Jittered delay using the thread-local RNG
pub fn calculate_delay_thread_rng(config: &ReconnectConfig, attempt_index: u32) -> u64 {
    calculate_delay(config, attempt_index, &mut rand::thread_rng())
}

fn sanitized_jitter(factor: f64) -> f64 {
    if factor.is_nan() {
        0.0
    } else {
        factor.clamp(0.0, 1.0)
    }
}
