//! Prometheus metrics endpoint
//!
//! Exposes relay metrics in Prometheus format for monitoring.

use axum::response::IntoResponse;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;

use crate::relay::RouteMode;

/// Global Prometheus handle for metrics export
static PROMETHEUS_HANDLE: Lazy<PrometheusHandle> = Lazy::new(|| {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
});

/// Initialize metrics (call once at startup)
pub fn init_metrics() {
    // Force initialization of the lazy static
    let _ = &*PROMETHEUS_HANDLE;

    register_metrics();
}

fn register_metrics() {
    metrics::describe_counter!(
        "relay_requests_total",
        "Total number of relay calls by operation, route and outcome"
    );
    metrics::describe_counter!(
        "relay_stream_fallbacks_total",
        "Streaming calls that fell back from the direct path to the proxy"
    );
    metrics::describe_histogram!(
        "relay_request_duration_seconds",
        "Relay call duration in seconds"
    );
}

/// Prometheus metrics endpoint handler
pub async fn prometheus_metrics() -> impl IntoResponse {
    PROMETHEUS_HANDLE.render()
}

/// Record a finished relay call
pub fn record_relay(operation: &str, route: RouteMode, outcome: &str, duration_secs: f64) {
    metrics::counter!(
        "relay_requests_total",
        "operation" => operation.to_string(),
        "route" => route.as_str(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
    metrics::histogram!("relay_request_duration_seconds", "operation" => operation.to_string())
        .record(duration_secs);
}

/// Record a direct-to-proxy stream fallback
pub fn record_stream_fallback() {
    metrics::counter!("relay_stream_fallbacks_total").increment(1);
}
