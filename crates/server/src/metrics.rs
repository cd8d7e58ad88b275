//! Prometheus exporter
//!
//! Metric names recorded across the workspace:
//! - `dwani_utterances_total{branch}`
//! - `dwani_turn_latency_seconds{branch}`
//! - `dwani_tool_calls_total{tool,outcome}`
//! - `dwani_capability_failures_total{capability}`

use axum::http::StatusCode;
use axum::response::IntoResponse;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the global recorder once; later calls return the same handle
pub fn init_metrics() -> Option<PrometheusHandle> {
    HANDLE
        .get_or_try_init(|| PrometheusBuilder::new().install_recorder())
        .map_err(|e| tracing::warn!(error = %e, "Failed to install metrics recorder"))
        .ok()
        .cloned()
}

/// `GET /metrics` in the Prometheus text format
pub async fn metrics_handler() -> impl IntoResponse {
    match HANDLE.get() {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "metrics recorder not installed".to_string(),
        ),
    }
}
