//! Shared vocabulary types for connection lifecycle tracking

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of one connection
///
/// ```text
///   Disconnected ──attempt──▶ Connecting ──success──▶ Connected
///        ▲                        │                      │
///        │                     failure              disconnect
///        │                        ▼                      ▼
///        └──────────────────── Failed ◀──failure── Reconnecting
///                                 │
///                          breaker trips
///                                 ▼
///                            CircuitOpen
/// ```
///
/// Only [`ReconnectStrategy`](crate::resilience::ReconnectStrategy) mutates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// No live connection and no attempt in flight
    Disconnected,
    /// First attempt of an episode is in flight
    Connecting,
    /// Connection is up
    Connected,
    /// A retry attempt is in flight
    Reconnecting,
    /// Last attempt failed
    Failed,
    /// Too many failures, breaker is blocking attempts
    CircuitOpen,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Reconnecting => "reconnecting",
            Self::Failed => "failed",
            Self::CircuitOpen => "circuit_open",
        }
    }

    /// Stable numeric code for gauges
    pub fn code(&self) -> i64 {
        match self {
            Self::Disconnected => 0,
            Self::Connecting => 1,
            Self::Connected => 2,
            Self::Reconnecting => 3,
            Self::Failed => 4,
            Self::CircuitOpen => 5,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a connection attempt was started or a connection was torn down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconnectReason {
    /// First connection of the process
    Initial,
    /// Remote side or transport closed the connection
    Disconnect,
    /// Dial or read timed out
    Timeout,
    /// Transport reported an error
    Error,
    /// Sequence discontinuity forced a resync
    SequenceGap,
    /// Heartbeat went stale
    HeartbeatMissed,
    /// Operator or caller asked for it
    Manual,
}

impl ReconnectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::Disconnect => "disconnect",
            Self::Timeout => "timeout",
            Self::Error => "error",
            Self::SequenceGap => "sequence_gap",
            Self::HeartbeatMissed => "heartbeat_missed",
            Self::Manual => "manual",
        }
    }
}

impl fmt::Display for ReconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
