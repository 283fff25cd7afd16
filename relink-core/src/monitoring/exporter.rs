//! Prometheus export of reconnect metrics
//!
//! The core exposes plain snapshots; this exporter copies them into gauge
//! families on demand (typically right before a scrape).

use crate::resilience::ReconnectManager;
use parking_lot::Mutex;
use prometheus::{Gauge, IntGauge, IntGaugeVec, Opts, Registry};
use std::collections::HashSet;
use tracing::info;

const LABEL: &[&str] = &["connection"];

/// Gauge families for every registered connection plus global totals
pub struct ReconnectMetricsExporter {
    /// Lifecycle state code (see `LifecycleState::code`)
    pub state: IntGaugeVec,
    pub total_connections: IntGaugeVec,
    pub successful_connections: IntGaugeVec,
    pub failed_connections: IntGaugeVec,
    pub reconnect_attempts: IntGaugeVec,
    pub sequence_gaps: IntGaugeVec,
    pub heartbeat_misses: IntGaugeVec,
    pub uptime_seconds: IntGaugeVec,
    pub circuit_failure_count: IntGaugeVec,
    pub active_connections: IntGauge,
    pub circuit_open_connections: IntGauge,
    pub success_rate: Gauge,
    exported: Mutex<HashSet<String>>,
}

impl ReconnectMetricsExporter {
    /// Register all families with `registry`
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let family = |name: &str, help: &str| -> Result<IntGaugeVec, prometheus::Error> {
            let gauge = IntGaugeVec::new(Opts::new(name, help).namespace("relink"), LABEL)?;
            registry.register(Box::new(gauge.clone()))?;
            Ok(gauge)
        };

        let state = family("connection_state", "Lifecycle state code per connection")?;
        let total_connections = family(
            "connection_total",
            "Connection outcomes recorded (successes + failures)",
        )?;
        let successful_connections =
            family("connection_successful", "Successful connections")?;
        let failed_connections = family("connection_failed", "Failed connection attempts")?;
        let reconnect_attempts =
            family("connection_reconnect_attempts", "Connection attempts started")?;
        let sequence_gaps = family(
            "connection_sequence_gaps",
            "Sequence gaps that tore down a live connection",
        )?;
        let heartbeat_misses = family("connection_heartbeat_misses", "Stale heartbeat checks")?;
        let uptime_seconds = family(
            "connection_uptime_seconds",
            "Current (or last) session uptime in seconds",
        )?;
        let circuit_failure_count = family(
            "circuit_failure_count",
            "Consecutive failures counted by the circuit breaker",
        )?;

        let active_connections = IntGauge::new(
            "relink_active_connections",
            "Connections currently connected",
        )?;
        registry.register(Box::new(active_connections.clone()))?;

        let circuit_open_connections = IntGauge::new(
            "relink_circuit_open_connections",
            "Connections blocked by an open circuit",
        )?;
        registry.register(Box::new(circuit_open_connections.clone()))?;

        let success_rate = Gauge::new(
            "relink_success_rate",
            "Successful connections over recorded outcomes (0.0 to 1.0)",
        )?;
        registry.register(Box::new(success_rate.clone()))?;

        info!("Reconnect metrics exporter registered");

        Ok(Self {
            state,
            total_connections,
            successful_connections,
            failed_connections,
            reconnect_attempts,
            sequence_gaps,
            heartbeat_misses,
            uptime_seconds,
            circuit_failure_count,
            active_connections,
            circuit_open_connections,
            success_rate,
            exported: Mutex::new(HashSet::new()),
        })
    }

    fn per_connection(&self) -> [&IntGaugeVec; 9] {
        [
            &self.state,
            &self.total_connections,
            &self.successful_connections,
            &self.failed_connections,
            &self.reconnect_attempts,
            &self.sequence_gaps,
            &self.heartbeat_misses,
            &self.uptime_seconds,
            &self.circuit_failure_count,
        ]
    }

    /// Copy a point-in-time snapshot of `manager` into the gauges
    pub fn update(&self, manager: &ReconnectManager) {
        let report = manager.status_report();

        for (name, status) in &report {
            let label = [name.as_str()];
            let m = &status.metrics;
            self.state.with_label_values(&label).set(status.state.code());
            self.total_connections
                .with_label_values(&label)
                .set(clamp(m.total_connections));
            self.successful_connections
                .with_label_values(&label)
                .set(clamp(m.successful_connections));
            self.failed_connections
                .with_label_values(&label)
                .set(clamp(m.failed_connections));
            self.reconnect_attempts
                .with_label_values(&label)
                .set(clamp(m.reconnect_attempts));
            self.sequence_gaps
                .with_label_values(&label)
                .set(clamp(m.sequence_gaps));
            self.heartbeat_misses
                .with_label_values(&label)
                .set(clamp(m.heartbeat_misses));
            self.uptime_seconds
                .with_label_values(&label)
                .set(m.uptime_seconds as i64);
            self.circuit_failure_count
                .with_label_values(&label)
                .set(i64::from(status.circuit.failure_count));
        }

        // Drop label sets of strategies that have been removed
        let current: HashSet<String> = report.keys().cloned().collect();
        let mut exported = self.exported.lock();
        for stale in exported.difference(&current) {
            for family in self.per_connection() {
                let _ = family.remove_label_values(&[stale.as_str()]);
            }
        }
        *exported = current;
        drop(exported);

        let global = manager.get_global_metrics();
        self.active_connections
            .set(global.active_connections as i64);
        self.circuit_open_connections
            .set(global.circuit_open_connections as i64);
        self.success_rate.set(global.success_rate);
    }
}

fn clamp(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
