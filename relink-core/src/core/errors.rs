//! Error types for the fallible edges of the crate
//!
//! The reconnect decision API itself never fails. These errors only come
//! out of configuration loading and the strict registry insert.

use thiserror::Error;

/// Invalid or unreadable reconnect configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A field holds a value outside its allowed range
    #[error("invalid value for `{field}`: {reason}")]
    InvalidField {
        /// Offending field name
        field: &'static str,
        /// Human readable constraint that was violated
        reason: String,
    },

    /// The document could not be parsed
    #[error("failed to parse reconnect config: {0}")]
    Parse(#[from] serde_json::Error),

    /// The file could not be read
    #[error("failed to read reconnect config: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

/// Errors from the strict registry operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A strategy with this name is already registered
    #[error("a reconnect strategy named `{0}` is already registered")]
    DuplicateName(String),
}
