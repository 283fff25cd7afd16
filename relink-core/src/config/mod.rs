pub mod constants;
pub mod profiles;
pub mod types;

pub use profiles::{ConfigProfile, ProfileName};
pub use types::ReconnectConfig;

use crate::core::errors::ConfigError;
use std::path::Path;

impl ReconnectConfig {
    /// Parse a JSON document and validate it
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let cfg: ReconnectConfig = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load configuration from a JSON file and validate it
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&raw)
    }
}
