//! Connection resilience core
//!
//! Decides, per live connection, whether and when to reconnect:
//! - Sequence validation with gap / duplicate detection
//! - Circuit breaker over connection failures
//! - Jittered exponential backoff
//! - Per-connection strategy and a named registry of strategies

pub mod backoff;
pub mod circuit_breaker;
pub mod manager;
pub mod metrics;
pub mod reconnect;
pub mod sequence;

#[cfg(test)]
mod resilience_proptest;

pub use backoff::calculate_delay;
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerSnapshot, CircuitState};
pub use manager::{GlobalMetrics, ReconnectManager};
pub use metrics::{AttemptRecord, ConnectionMetrics};
pub use reconnect::{ReconnectStrategy, StrategyStatus};
pub use sequence::{SequenceClass, SequenceStats, SequenceValidation, SequenceValidator};
