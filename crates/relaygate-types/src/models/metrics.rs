//! Metrics and health views.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Three 60-slot rings indexed by elapsed minutes modulo 60.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricsHistory {
    pub requests: Vec<u64>,
    pub avg_response_time: Vec<f64>,
    pub errors: Vec<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub success_requests: u64,
    pub error_requests: u64,
    /// Percentage, two decimals
    pub success_rate: f64,
    pub avg_response_time_ms: f64,
    pub min_response_time_ms: u64,
    pub max_response_time_ms: u64,
    pub token_validations: u64,
    pub total_tokens: u64,
    pub active_tokens: u64,
    pub total_configs: u64,
    pub active_configs: u64,
    pub memory_usage_bytes: u64,
    pub active_requests: u64,
    pub uptime_secs: u64,
    pub history: MetricsHistory,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Healthy,
    Degraded,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthState,
    pub message: String,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthReport {
    pub status: HealthState,
    pub checks: Vec<HealthCheck>,
    pub timestamp: DateTime<Utc>,
}

impl HealthReport {
    pub fn degraded_checks(&self) -> impl Iterator<Item = &HealthCheck> {
        self.checks.iter().filter(|c| c.status == HealthState::Degraded)
    }
}
