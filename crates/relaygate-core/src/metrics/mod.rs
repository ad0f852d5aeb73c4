//! Concurrent metrics: lock-free counters, 60-minute history, derived health.

mod active_request_guard;
mod collector;
mod health;
mod history;
pub mod prometheus;
mod resources;

pub use active_request_guard::ActiveRequestGuard;
pub use collector::{GaugeSource, MetricsCollector};
pub use health::{
    evaluate_health, AVG_RESPONSE_TIME_THRESHOLD_MS, MEMORY_THRESHOLD_BYTES,
    MIN_REQUESTS_FOR_RATE_CHECK, SUCCESS_RATE_THRESHOLD,
};
pub use history::{HistoryRing, HISTORY_SLOTS};
pub use resources::{ResourceSampler, ResourceUsage};
