#![allow(clippy::unwrap_used, reason = "test assertions")]

use axum::extract::State;
use axum::response::{IntoResponse, Json};
use relaygate_types::models::{CreateConfigRequest, TargetProtocol};

use super::metrics::{get_health, get_prometheus, get_snapshot, reset_metrics};
use crate::test_helpers::test_app_state;

#[tokio::test]
async fn test_snapshot_empty() {
    let (state, _tmp) = test_app_state();
    let Json(snap) = get_snapshot(State(state)).await;
    assert!(snap.success);
    assert_eq!(snap.data.total_requests, 0);
    assert_eq!(snap.data.history.requests.len(), 60);
}

#[tokio::test]
async fn test_reset_keeps_store_gauges() {
    let (state, _tmp) = test_app_state();
    state
        .store()
        .add(CreateConfigRequest {
            name: "Shop".to_string(),
            subdomain: "shop".to_string(),
            target_url: "shop.example.com".to_string(),
            protocol: TargetProtocol::Http,
            enabled: true,
            default_proxy: None,
            description: None,
        })
        .unwrap();
    state.metrics().record_request(120, true);
    state.metrics().record_request(80, false);

    let Json(after) = reset_metrics(State(state)).await;
    assert_eq!(after.data.total_requests, 0);
    assert_eq!(after.data.error_requests, 0);
    assert_eq!(after.data.total_configs, 1);
    assert_eq!(after.data.active_configs, 1);
}

#[tokio::test]
async fn test_health_on_fresh_state() {
    let (state, _tmp) = test_app_state();
    let Json(report) = get_health(State(state)).await;
    let names: Vec<_> = report.data.checks.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["success_rate", "response_time", "memory"]);
    // no traffic yet, so rate and latency cannot be degraded
    assert!(report.data.degraded_checks().all(|c| c.name == "memory"));
}

#[tokio::test]
async fn test_prometheus_is_text() {
    let (state, _tmp) = test_app_state();
    let response = get_prometheus(State(state)).await.into_response();
    let content_type = response.headers().get("content-type").unwrap().to_str().unwrap();
    assert!(content_type.starts_with("text/plain"));
}
