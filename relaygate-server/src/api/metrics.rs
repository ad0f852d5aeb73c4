//! Metrics handlers

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use relaygate_core::metrics::prometheus;
use relaygate_types::models::{HealthReport, MetricsSnapshot};

use super::ApiResponse;
use crate::state::AppState;

pub async fn get_snapshot(State(state): State<AppState>) -> Json<ApiResponse<MetricsSnapshot>> {
    ApiResponse::ok(state.metrics().snapshot())
}

pub async fn get_health(State(state): State<AppState>) -> Json<ApiResponse<HealthReport>> {
    ApiResponse::ok(state.metrics().health())
}

pub async fn reset_metrics(State(state): State<AppState>) -> Json<ApiResponse<MetricsSnapshot>> {
    state.metrics().reset();
    tracing::info!("📊 Metrics reset by admin");
    ApiResponse::with_message(state.metrics().snapshot(), "metrics reset")
}

pub async fn get_prometheus(State(state): State<AppState>) -> impl IntoResponse {
    let snap = state.metrics().snapshot();
    prometheus::update_runtime_gauges(snap.active_requests, snap.memory_usage_bytes, snap.uptime_secs);
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        prometheus::render_metrics(),
    )
}
