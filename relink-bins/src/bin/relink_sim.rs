//! Reconnect Simulator
//!
//! Drives a ReconnectManager against synthetic flaky feeds:
//! - Each connection runs on its own tokio task
//! - Dials fail with `--failure-rate`, live feeds skip ids with `--gap-rate`
//! - Advisory backoff delays are honored, scaled by `--delay-scale`
//!
//! Optionally serves `/metrics`, `/status` and `/health` while running.

use anyhow::Result;
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use relink_bins::common::{init_logging, load_config, print_stats, CommonArgs};
use relink_core::monitoring::{MetricsServer, MetricsServerConfig, MonitoringState};
use relink_core::prelude::*;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

#[derive(Parser, Debug)]
#[command(author, version, about = "Simulate reconnect behaviour over flaky feeds")]
struct SimArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Number of simulated connections
    #[arg(long, default_value_t = 4)]
    connections: usize,

    /// Ticks per connection before stopping
    #[arg(long, default_value_t = 1_000)]
    ticks: u64,

    /// Probability that a dial fails, or that a live feed drops
    #[arg(long, default_value_t = 0.2)]
    failure_rate: f64,

    /// Probability that a live message skips ahead in sequence
    #[arg(long, default_value_t = 0.01)]
    gap_rate: f64,

    /// Wall time per tick (ms)
    #[arg(long, default_value_t = 5)]
    tick_ms: u64,

    /// Multiplier applied to advisory backoff delays
    #[arg(long, default_value_t = 0.01)]
    delay_scale: f64,

    /// Serve metrics and status on this address
    #[arg(long)]
    metrics_addr: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = SimArgs::parse();
    init_logging(&args.common)?;

    let config = load_config(&args.common)?;
    config.validate()?;

    tracing::info!("=== Relink: Reconnect Simulator ===");
    tracing::info!(
        "{} connections, {} ticks, failure rate {:.2}, gap rate {:.3}",
        args.connections,
        args.ticks,
        args.failure_rate,
        args.gap_rate
    );

    let manager = Arc::new(ReconnectManager::new());

    if let Some(listen_addr) = args.metrics_addr {
        let state = Arc::new(MonitoringState::new(Arc::clone(&manager))?);
        let server = MetricsServer::new(
            MetricsServerConfig {
                listen_addr,
                ..Default::default()
            },
            state,
        );
        tokio::spawn(async move {
            if let Err(e) = server.serve().await {
                tracing::error!("Metrics server stopped: {:#}", e);
            }
        });
    }

    let feed = FeedProfile {
        ticks: args.ticks,
        failure_rate: args.failure_rate.clamp(0.0, 1.0),
        gap_rate: args.gap_rate.clamp(0.0, 1.0),
        tick: Duration::from_millis(args.tick_ms),
        delay_scale: args.delay_scale.max(0.0),
    };

    let mut tasks = JoinSet::new();
    for i in 0..args.connections {
        let strategy = manager.add_strategy(format!("sim-{}", i), config.clone());
        strategy.on_circuit_open(|name| tracing::warn!("Circuit opened for {}", name));
        tasks.spawn(run_connection(strategy, feed.clone()));
    }

    tokio::select! {
        _ = async { while tasks.join_next().await.is_some() {} } => {
            tracing::info!("All simulated connections finished");
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            tracing::info!("Received Ctrl-C, stopping simulation");
        }
    }

    print_stats(&manager.get_global_metrics());
    Ok(())
}

#[derive(Debug, Clone)]
struct FeedProfile {
    ticks: u64,
    failure_rate: f64,
    gap_rate: f64,
    tick: Duration,
    delay_scale: f64,
}

/// One synthetic transport consulting its strategy every tick
async fn run_connection(strategy: Arc<ReconnectStrategy>, feed: FeedProfile) {
    let mut rng = StdRng::from_entropy();
    let mut sequence: i64 = 0;
    let mut reason = ReconnectReason::Initial;

    for _ in 0..feed.ticks {
        if strategy.is_connected() {
            sequence += 1;
            if rng.gen_bool(feed.gap_rate) {
                sequence += rng.gen_range(1..20);
            }
            if strategy.validate_sequence_id(sequence).is_gap() && !strategy.is_connected() {
                reason = ReconnectReason::SequenceGap;
            } else if !strategy.check_heartbeat() {
                strategy.record_disconnection(ReconnectReason::HeartbeatMissed);
                reason = ReconnectReason::HeartbeatMissed;
            } else if rng.gen_bool(feed.failure_rate / 10.0) {
                strategy.record_disconnection(ReconnectReason::Disconnect);
                reason = ReconnectReason::Disconnect;
            } else {
                strategy.update_heartbeat();
            }
        } else if strategy.should_reconnect() {
            let attempt = strategy.record_connection_attempt(reason);
            let wait = Duration::from_secs_f64(attempt.delay_ms as f64 * feed.delay_scale / 1_000.0);
            tokio::time::sleep(wait).await;

            if rng.gen_bool(feed.failure_rate) {
                strategy.record_connection_failure("simulated dial failure");
                reason = ReconnectReason::Error;
            } else {
                strategy.record_connection_success();
            }
        } else if episode_exhausted(&strategy) {
            tracing::warn!(
                "{} exhausted its retry budget, giving up",
                strategy.name()
            );
            return;
        }

        tokio::time::sleep(feed.tick).await;
    }
}

/// The current episode has used every attempt the policy allows
fn episode_exhausted(strategy: &ReconnectStrategy) -> bool {
    strategy.reconnect_attempts().len() >= strategy.config().max_retries as usize
}
