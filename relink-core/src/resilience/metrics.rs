//! Per-connection counters and attempt history

use crate::core::types::ReconnectReason;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Cumulative statistics for one connection
///
/// Counters only grow until [`reset`](crate::resilience::ReconnectStrategy::reset_metrics).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionMetrics {
    /// Connection outcomes recorded (successes + failures)
    pub total_connections: u64,
    pub successful_connections: u64,
    pub failed_connections: u64,
    /// Attempts started via `record_connection_attempt`
    pub reconnect_attempts: u64,
    /// Gaps that tore down a live connection
    pub sequence_gaps: u64,
    pub heartbeat_misses: u64,
    /// Live uptime while connected, otherwise the length of the last session
    pub uptime_seconds: f64,
}

impl ConnectionMetrics {
    /// Fraction of recorded outcomes that succeeded
    pub fn success_rate(&self) -> f64 {
        self.successful_connections as f64 / self.total_connections.max(1) as f64
    }
}

/// One connection attempt within the current episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// 1-based position within the episode
    pub attempt_number: u32,
    pub timestamp: SystemTime,
    pub reason: ReconnectReason,
    /// Advisory wait before dialing
    pub delay_ms: u64,
    pub success: bool,
    pub error_message: Option<String>,
}

impl AttemptRecord {
    pub(crate) fn new(attempt_number: u32, reason: ReconnectReason, delay_ms: u64) -> Self {
        Self {
            attempt_number,
            timestamp: SystemTime::now(),
            reason,
            delay_ms,
            success: false,
            error_message: None,
        }
    }
}
