//! Core vocabulary shared by every resilience component
//!
//! - `clock`: injectable monotonic time source
//! - `errors`: error types for config loading and strict registry inserts
//! - `types`: lifecycle state and reconnect reason enums

pub mod clock;
pub mod errors;
pub mod types;

pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use errors::{ConfigError, RegistryError};
pub use types::{LifecycleState, ReconnectReason};
