//! Named configuration profiles
//!
//! - Development: fast retries, short breaker cool-down
//! - Staging: library defaults
//! - Production: slow backoff, tolerant breaker

use super::types::ReconnectConfig;

/// Configuration profile name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileName {
    /// Local testing against flaky endpoints
    Development,
    /// Pre-production
    Staging,
    /// Live feeds
    Production,
}

impl ProfileName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Staging => "staging",
            Self::Production => "production",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Some(Self::Development),
            "staging" | "stage" => Some(Self::Staging),
            "prod" | "production" => Some(Self::Production),
            _ => None,
        }
    }
}

/// Profile lookup
pub struct ConfigProfile;

impl ConfigProfile {
    pub fn load(profile: ProfileName) -> ReconnectConfig {
        match profile {
            ProfileName::Development => ReconnectConfig::aggressive(),
            ProfileName::Staging => ReconnectConfig::default(),
            ProfileName::Production => ReconnectConfig::conservative(),
        }
    }
}
