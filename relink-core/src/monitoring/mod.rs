//! Monitoring and observability module
//!
//! Publishes reconnect snapshots as Prometheus metrics and serves them,
//! together with a JSON status report, over HTTP.

pub mod exporter;
pub mod server;

pub use exporter::ReconnectMetricsExporter;
pub use server::{handle_request, MetricsServer, MetricsServerConfig, MonitoringState};
