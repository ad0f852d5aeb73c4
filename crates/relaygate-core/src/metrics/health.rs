//! Health derivation from a metrics snapshot.

use chrono::Utc;
use relaygate_types::models::{HealthCheck, HealthReport, HealthState, MetricsSnapshot};

pub const SUCCESS_RATE_THRESHOLD: f64 = 95.0;
/// The success-rate check only applies once traffic exceeds this.
pub const MIN_REQUESTS_FOR_RATE_CHECK: u64 = 100;
pub const AVG_RESPONSE_TIME_THRESHOLD_MS: f64 = 1000.0;
pub const MEMORY_THRESHOLD_BYTES: u64 = 500 * 1024 * 1024;

/// Degraded if any individual check is degraded; every check is reported.
pub fn evaluate_health(snapshot: &MetricsSnapshot) -> HealthReport {
    let rate_degraded = snapshot.total_requests > MIN_REQUESTS_FOR_RATE_CHECK
        && snapshot.success_rate < SUCCESS_RATE_THRESHOLD;
    let success_rate = HealthCheck {
        name: "success_rate".to_string(),
        status: state(rate_degraded),
        message: if rate_degraded {
            format!(
                "success rate {:.2}% is below {:.0}%",
                snapshot.success_rate, SUCCESS_RATE_THRESHOLD
            )
        } else {
            format!("success rate {:.2}%", snapshot.success_rate)
        },
        value: snapshot.success_rate,
    };

    let latency_degraded = snapshot.avg_response_time_ms > AVG_RESPONSE_TIME_THRESHOLD_MS;
    let response_time = HealthCheck {
        name: "response_time".to_string(),
        status: state(latency_degraded),
        message: if latency_degraded {
            format!(
                "average response time {:.0}ms exceeds {:.0}ms",
                snapshot.avg_response_time_ms, AVG_RESPONSE_TIME_THRESHOLD_MS
            )
        } else {
            format!("average response time {:.0}ms", snapshot.avg_response_time_ms)
        },
        value: snapshot.avg_response_time_ms,
    };

    let memory_mb = snapshot.memory_usage_bytes as f64 / (1024.0 * 1024.0);
    let memory_degraded = snapshot.memory_usage_bytes > MEMORY_THRESHOLD_BYTES;
    let memory = HealthCheck {
        name: "memory".to_string(),
        status: state(memory_degraded),
        message: if memory_degraded {
            format!("memory usage {memory_mb:.1}MB exceeds 500MB")
        } else {
            format!("memory usage {memory_mb:.1}MB")
        },
        value: memory_mb,
    };

    let checks = vec![success_rate, response_time, memory];
    let status = state(checks.iter().any(|c| c.status == HealthState::Degraded));
    HealthReport { status, checks, timestamp: Utc::now() }
}

fn state(degraded: bool) -> HealthState {
    if degraded {
        HealthState::Degraded
    } else {
        HealthState::Healthy
    }
}
