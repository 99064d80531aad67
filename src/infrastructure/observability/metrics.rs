//! Prometheus metrics infrastructure

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, response::IntoResponse, routing::get, Router};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use super::config::MetricsConfig;

/// Prometheus metrics handle for serving metrics endpoint
#[derive(Clone)]
pub struct PrometheusMetrics {
    handle: Arc<PrometheusHandle>,
}

impl std::fmt::Debug for PrometheusMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrometheusMetrics").finish_non_exhaustive()
    }
}

impl PrometheusMetrics {
    /// Get the metrics as a string for the /metrics endpoint
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Initialize Prometheus metrics
pub fn init_metrics(config: &MetricsConfig) -> Option<PrometheusMetrics> {
    if !config.enabled {
        tracing::info!("Prometheus metrics disabled");
        return None;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            gauge!("usage_dashboard_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);

            tracing::info!("Prometheus metrics initialized at {}", config.path);

            Some(PrometheusMetrics {
                handle: Arc::new(handle),
            })
        }
        Err(e) => {
            tracing::error!("Failed to initialize Prometheus metrics: {}", e);
            None
        }
    }
}

/// Create the metrics router
pub fn create_metrics_router(metrics: PrometheusMetrics, path: &str) -> Router {
    Router::new()
        .route(path, get(metrics_handler))
        .with_state(metrics)
}

async fn metrics_handler(State(metrics): State<PrometheusMetrics>) -> impl IntoResponse {
    metrics.render()
}

/// Record one upstream usage fetch; `outcome` is `ok` or an error kind
pub fn record_usage_fetch(outcome: &str, duration: Duration) {
    let labels = [("outcome", outcome.to_string())];

    counter!("usage_fetch_total", &labels).increment(1);
    histogram!("usage_fetch_duration_seconds").record(duration.as_secs_f64());
}

/// Parameters for snapshot metrics
#[derive(Debug, Clone, Copy)]
pub struct SnapshotMetricParams {
    pub credentials: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub duration: Duration,
}

/// Record a completed snapshot assembly
pub fn record_snapshot(params: SnapshotMetricParams) {
    gauge!("usage_snapshot_credentials").set(params.credentials as f64);
    gauge!("usage_snapshot_failed_credentials").set(params.failed as f64);
    counter!("usage_snapshots_total").increment(1);
    histogram!("usage_snapshot_duration_seconds").record(params.duration.as_secs_f64());

    if params.succeeded == 0 && params.credentials > 0 {
        counter!("usage_snapshots_all_failed_total").increment(1);
    }
}
