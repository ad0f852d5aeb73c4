//! Prometheus exposition for gateway traffic.
//!
//! - `relaygate_requests_total{outcome}` - Counter of forwarded requests
//! - `relaygate_request_duration_seconds` - Histogram of forward durations
//! - `relaygate_token_validations_total` - Counter of access-token checks
//! - `relaygate_configs{state}` / `relaygate_tokens{state}` - Current gauges
//! - `relaygate_active_requests` - In-flight forwards
//! - `relaygate_memory_bytes` - Resident memory of the process
//! - `relaygate_uptime_seconds` - Gauge of server uptime

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

static PROMETHEUS_HANDLE: OnceLock<Option<PrometheusHandle>> = OnceLock::new();

/// Buckets for reverse-proxy latency: most forwards land well under a second,
/// slow upstreams run up to the 30s default timeout.
const LATENCY_BUCKETS: &[f64] = &[0.005, 0.025, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0];

/// Install the global recorder once. Later calls return the same handle.
///
/// Returns `None` if another recorder was installed first; recording calls
/// are then no-ops for this exporter.
pub fn init_metrics() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE
        .get_or_init(|| {
            let builder = match PrometheusBuilder::new().set_buckets(LATENCY_BUCKETS) {
                Ok(b) => b,
                Err(e) => {
                    tracing::warn!("Prometheus buckets rejected: {}", e);
                    return None;
                },
            };
            let handle = match builder.install_recorder() {
                Ok(h) => h,
                Err(e) => {
                    tracing::warn!("Prometheus recorder not installed: {}", e);
                    return None;
                },
            };

            describe_counter!("relaygate_requests_total", "Total forwarded requests by outcome");
            describe_histogram!(
                "relaygate_request_duration_seconds",
                "Forward duration in seconds"
            );
            describe_counter!(
                "relaygate_token_validations_total",
                "Total access-token validations"
            );
            describe_gauge!("relaygate_configs", "Tenant configs by state");
            describe_gauge!("relaygate_tokens", "Access tokens by state");
            describe_gauge!("relaygate_active_requests", "Forwards currently in flight");
            describe_gauge!("relaygate_memory_bytes", "Resident memory of the gateway process");
            describe_gauge!("relaygate_uptime_seconds", "Server uptime in seconds");

            Some(handle)
        })
        .clone()
}

pub fn record_request(success: bool, duration_ms: u64) {
    let outcome = if success { "success" } else { "error" };
    counter!("relaygate_requests_total", "outcome" => outcome).increment(1);
    histogram!("relaygate_request_duration_seconds").record(duration_ms as f64 / 1000.0);
}

pub fn record_token_validation() {
    counter!("relaygate_token_validations_total").increment(1);
}

pub fn update_store_gauges(total_configs: u64, active_configs: u64, total_tokens: u64, active_tokens: u64) {
    gauge!("relaygate_configs", "state" => "total").set(total_configs as f64);
    gauge!("relaygate_configs", "state" => "active").set(active_configs as f64);
    gauge!("relaygate_tokens", "state" => "total").set(total_tokens as f64);
    gauge!("relaygate_tokens", "state" => "active").set(active_tokens as f64);
}

pub fn update_runtime_gauges(active_requests: u64, memory_bytes: u64, uptime_secs: u64) {
    gauge!("relaygate_active_requests").set(active_requests as f64);
    gauge!("relaygate_memory_bytes").set(memory_bytes as f64);
    gauge!("relaygate_uptime_seconds").set(uptime_secs as f64);
}

/// Render all metrics in Prometheus text format.
pub fn render_metrics() -> String {
    match PROMETHEUS_HANDLE.get() {
        Some(Some(handle)) => handle.render(),
        _ => String::from("# Metrics not initialized\n"),
    }
}
