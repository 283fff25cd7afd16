//! HTTP server for reconnect observability
//!
//! Exposes:
//! - `/metrics`: Prometheus text format (refreshed from the manager per scrape)
//! - `/status`: JSON status report, one entry per connection
//! - `/health`: liveness probe

use super::exporter::ReconnectMetricsExporter;
use crate::resilience::ReconnectManager;
use anyhow::{Context, Result};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use prometheus::{Encoder, Registry, TextEncoder};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

/// Configuration for the metrics HTTP server
#[derive(Debug, Clone)]
pub struct MetricsServerConfig {
    /// Address to bind to (e.g., "0.0.0.0:9090")
    pub listen_addr: SocketAddr,
    /// Path to serve metrics (default: "/metrics")
    pub metrics_path: String,
}

impl Default for MetricsServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 9090)),
            metrics_path: "/metrics".to_string(),
        }
    }
}

/// What the server reads from on every request
pub struct MonitoringState {
    manager: Arc<ReconnectManager>,
    registry: Registry,
    exporter: ReconnectMetricsExporter,
}

impl MonitoringState {
    /// Build a fresh registry and exporter around `manager`
    pub fn new(manager: Arc<ReconnectManager>) -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        let exporter = ReconnectMetricsExporter::new(&registry)?;
        Ok(Self {
            manager,
            registry,
            exporter,
        })
    }

    pub fn manager(&self) -> &ReconnectManager {
        &self.manager
    }

    /// Refresh gauges and encode them in Prometheus text format
    pub fn render_metrics(&self) -> Result<String> {
        self.exporter.update(&self.manager);

        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();

        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .context("Failed to encode metrics")?;

        String::from_utf8(buffer).context("Invalid UTF-8 in metrics")
    }

    /// JSON status report plus global totals
    pub fn render_status(&self) -> Result<String> {
        let body = serde_json::json!({
            "global": self.manager.get_global_metrics(),
            "connections": self.manager.status_report(),
        });
        serde_json::to_string_pretty(&body).context("Failed to encode status report")
    }
}

/// HTTP server for metrics and status
pub struct MetricsServer {
    config: MetricsServerConfig,
    state: Arc<MonitoringState>,
}

impl MetricsServer {
    pub fn new(config: MetricsServerConfig, state: Arc<MonitoringState>) -> Self {
        Self { config, state }
    }

    /// Serve until the task is dropped
    ///
    /// Runs indefinitely; spawn it on its own tokio task.
    pub async fn serve(self) -> Result<()> {
        let listener = TcpListener::bind(&self.config.listen_addr)
            .await
            .context("Failed to bind metrics server")?;

        info!(
            "Metrics server listening on http://{}{}",
            self.config.listen_addr, self.config.metrics_path
        );

        loop {
            let (stream, remote_addr) = match listener.accept().await {
                Ok(conn) => conn,
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                    continue;
                }
            };

            let state = Arc::clone(&self.state);
            let metrics_path = self.config.metrics_path.clone();

            tokio::spawn(async move {
                let io = TokioIo::new(stream);

                let service = service_fn(move |req: Request<hyper::body::Incoming>| {
                    let state = Arc::clone(&state);
                    let metrics_path = metrics_path.clone();
                    async move { Ok::<_, Infallible>(handle_request(&req, &state, &metrics_path)) }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    debug!("Connection error from {}: {}", remote_addr, err);
                }
            });
        }
    }
}

/// Route one request; never fails, errors become 500 responses
pub fn handle_request<B>(
    req: &Request<B>,
    state: &MonitoringState,
    metrics_path: &str,
) -> Response<Full<Bytes>> {
    let path = req.uri().path();
    debug!("Monitoring request: {} {}", req.method(), path);

    if path == "/health" || path == "/healthz" {
        return respond(StatusCode::OK, "text/plain", "OK".to_string());
    }

    if path == metrics_path {
        return match state.render_metrics() {
            Ok(text) => respond(StatusCode::OK, "text/plain; version=0.0.4", text),
            Err(e) => {
                error!("Failed to encode metrics: {:#}", e);
                respond(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "text/plain",
                    format!("Error: {}", e),
                )
            }
        };
    }

    if path == "/status" {
        return match state.render_status() {
            Ok(json) => respond(StatusCode::OK, "application/json", json),
            Err(e) => {
                error!("Failed to encode status: {:#}", e);
                respond(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "text/plain",
                    format!("Error: {}", e),
                )
            }
        };
    }

    if path == "/" {
        let help_text = format!(
            "relink reconnect monitor\n\nEndpoints:\n  {} - Prometheus metrics\n  /status - JSON status\n  /health - Health check\n",
            metrics_path
        );
        return respond(StatusCode::OK, "text/plain", help_text);
    }

    warn!("Unknown monitoring endpoint requested: {}", path);
    respond(StatusCode::NOT_FOUND, "text/plain", "Not Found".to_string())
}

fn respond(status: StatusCode, content_type: &'static str, body: String) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}
