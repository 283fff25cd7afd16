//! Relink Core - Connection Resilience for Streaming Market Data
//!
//! Decides, for every live connection to a streaming data source, whether
//! and when to reconnect after a failure, when to stop trying, and whether
//! the stream itself has lost integrity.
//!
//! ## Architecture
//! - **Pure decisions**: no sockets, no sleeps, no background tasks
//! - **One lock per connection**: every operation on a strategy is serialized
//! - **Injected time**: all timeouts read a [`Clock`](core::Clock)
//! - **Advisory output**: the transport layer dials and waits, we only advise
//!
//! ## Core Modules
//! - `resilience`: sequence validation, circuit breaker, backoff, strategy, manager
//! - `config`: reconnect policy, defaults and profiles
//! - `core`: clock, lifecycle types, error types
//! - `monitoring`: Prometheus export and HTTP status server
//! - `utils`: logging setup
//!
//! ## Usage
//!
//! ```
//! use relink_core::prelude::*;
//!
//! let manager = ReconnectManager::new();
//! let feed = manager.add_strategy("binance-ws", ReconnectConfig::default());
//!
//! if feed.should_reconnect() {
//!     let attempt = feed.record_connection_attempt(ReconnectReason::Initial);
//!     assert_eq!(attempt.attempt_number, 1);
//!     // transport waits attempt.delay_ms, dials, then reports back
//!     feed.record_connection_success();
//! }
//!
//! assert!(feed.validate_sequence_id(1).valid);
//! assert_eq!(manager.get_global_metrics().active_connections, 1);
//! ```

pub mod config;
pub mod core;
pub mod monitoring;
pub mod resilience;
pub mod utils;

pub use crate::config::ReconnectConfig;
pub use crate::core::{ConfigError, LifecycleState, ReconnectReason, RegistryError};
pub use crate::resilience::{GlobalMetrics, ReconnectManager, ReconnectStrategy};

pub use anyhow::{Error, Result};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::ReconnectConfig;
    pub use crate::core::{Clock, LifecycleState, ManualClock, ReconnectReason, SystemClock};
    pub use crate::resilience::{
        AttemptRecord, CircuitState, ConnectionMetrics, GlobalMetrics, ReconnectManager,
        ReconnectStrategy, SequenceClass, SequenceValidation,
    };
    pub use crate::{Error, Result};
}
