//! Common utilities for all binaries
//!
//! Shared initialization, CLI parsing, and setup code.

use anyhow::{anyhow, Context, Result};
use clap::Args;
use relink_core::config::{ConfigProfile, ProfileName};
use relink_core::{GlobalMetrics, ReconnectConfig};
use std::path::PathBuf;

/// Common CLI arguments for all binaries
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Reconnect policy file (JSON); overrides --profile
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Built-in policy: development, staging or production
    #[arg(long, default_value = "staging")]
    pub profile: String,

    /// Log level
    #[arg(short, long, default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,
}

/// Initialize tracing/logging
pub fn init_logging(args: &CommonArgs) -> Result<()> {
    relink_core::utils::init_logger(&args.log_level, args.json_logs)
}

/// Resolve the reconnect policy from a file or a named profile
pub fn load_config(args: &CommonArgs) -> Result<ReconnectConfig> {
    if let Some(path) = &args.config {
        let config = ReconnectConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?;
        tracing::info!("Loaded reconnect policy from {}", path.display());
        return Ok(config);
    }

    let profile = ProfileName::from_str(&args.profile)
        .ok_or_else(|| anyhow!("Unknown profile '{}'", args.profile))?;
    tracing::info!("Using {} reconnect profile", profile.as_str());
    Ok(ConfigProfile::load(profile))
}

/// Print final statistics
pub fn print_stats(global: &GlobalMetrics) {
    tracing::info!("=== Final Statistics ===");
    tracing::info!("Connections tracked: {}", global.total_strategies);
    tracing::info!("Active: {}", global.active_connections);
    tracing::info!("Circuit open: {}", global.circuit_open_connections);
    tracing::info!(
        "Outcomes: {} total, {} successful, {} failed",
        global.total_connections,
        global.successful_connections,
        global.failed_connections
    );
    tracing::info!("Reconnect attempts: {}", global.reconnect_attempts);
    tracing::info!("Sequence gaps: {}", global.sequence_gaps);
    tracing::info!("Heartbeat misses: {}", global.heartbeat_misses);
    tracing::info!("Success rate: {:.2}%", global.success_rate * 100.0);
}
