//! Process-wide request metrics, owned by whoever builds the gateway.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use relaygate_types::models::{HealthReport, MetricsSnapshot};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::active_request_guard::ActiveRequestGuard;
use super::health::evaluate_health;
use super::history::HistoryRing;
use super::prometheus;
use super::resources::{ResourceSampler, ResourceUsage};

/// Recomputes the config/token gauges, which drift without a mutation as
/// tokens pass their expiry.
pub trait GaugeSource: Send + Sync {
    fn refresh_gauges(&self);
}

/// Counters are plain atomics; only the resource reading and the history ring
/// sit behind narrow mutexes, both written from the background tick.
pub struct MetricsCollector {
    total_requests: AtomicU64,
    success_requests: AtomicU64,
    error_requests: AtomicU64,
    token_validations: AtomicU64,
    response_time_sum_ms: AtomicU64,
    /// `u64::MAX` until the first request
    min_response_time_ms: AtomicU64,
    max_response_time_ms: AtomicU64,

    // Current-state gauges; survive reset()
    total_tokens: AtomicU64,
    active_tokens: AtomicU64,
    total_configs: AtomicU64,
    active_configs: AtomicU64,
    active_requests: Arc<AtomicU64>,
    gauge_source: RwLock<Option<Weak<dyn GaugeSource>>>,

    resources: Mutex<ResourceUsage>,
    sampler: Mutex<ResourceSampler>,
    history: Mutex<HistoryRing>,

    started_at: Instant,
    tick_interval: Duration,
    shutdown_tx: watch::Sender<bool>,
}

impl MetricsCollector {
    pub fn new(tick_interval: Duration) -> Arc<Self> {
        let (shutdown_tx, _) = watch::channel(false);
        Arc::new(Self {
            total_requests: AtomicU64::new(0),
            success_requests: AtomicU64::new(0),
            error_requests: AtomicU64::new(0),
            token_validations: AtomicU64::new(0),
            response_time_sum_ms: AtomicU64::new(0),
            min_response_time_ms: AtomicU64::new(u64::MAX),
            max_response_time_ms: AtomicU64::new(0),
            total_tokens: AtomicU64::new(0),
            active_tokens: AtomicU64::new(0),
            total_configs: AtomicU64::new(0),
            active_configs: AtomicU64::new(0),
            active_requests: Arc::new(AtomicU64::new(0)),
            gauge_source: RwLock::new(None),
            resources: Mutex::new(ResourceUsage::default()),
            sampler: Mutex::new(ResourceSampler::new()),
            history: Mutex::new(HistoryRing::default()),
            started_at: Instant::now(),
            tick_interval,
            shutdown_tx,
        })
    }

    /// Record one completed forward.
    pub fn record_request(&self, elapsed_ms: u64, success: bool) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        if success {
            self.success_requests.fetch_add(1, Ordering::Relaxed);
        } else {
            self.error_requests.fetch_add(1, Ordering::Relaxed);
        }
        self.response_time_sum_ms.fetch_add(elapsed_ms, Ordering::Relaxed);
        self.min_response_time_ms.fetch_min(elapsed_ms, Ordering::Relaxed);
        self.max_response_time_ms.fetch_max(elapsed_ms, Ordering::Relaxed);
        prometheus::record_request(success, elapsed_ms);
    }

    pub fn record_token_validation(&self) {
        self.token_validations.fetch_add(1, Ordering::Relaxed);
        prometheus::record_token_validation();
    }

    pub fn set_store_gauges(&self, total_configs: u64, active_configs: u64, total_tokens: u64, active_tokens: u64) {
        self.total_configs.store(total_configs, Ordering::Relaxed);
        self.active_configs.store(active_configs, Ordering::Relaxed);
        self.total_tokens.store(total_tokens, Ordering::Relaxed);
        self.active_tokens.store(active_tokens, Ordering::Relaxed);
        prometheus::update_store_gauges(total_configs, active_configs, total_tokens, active_tokens);
    }

    /// Refresh store gauges from `source` on every tick and snapshot. Held
    /// weakly; the store already owns this collector.
    pub fn attach_gauge_source(&self, source: Weak<dyn GaugeSource>) {
        *self.gauge_source.write() = Some(source);
    }

    fn refresh_gauges(&self) {
        let source = self.gauge_source.read().as_ref().and_then(Weak::upgrade);
        if let Some(source) = source {
            source.refresh_gauges();
        }
    }

    /// In-flight gauge held for the lifetime of the returned guard.
    pub fn track_request(&self) -> ActiveRequestGuard {
        ActiveRequestGuard::new(Arc::clone(&self.active_requests))
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Derived fields are computed here from the raw counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        self.refresh_gauges();
        let total = self.total_requests.load(Ordering::Relaxed);
        let success = self.success_requests.load(Ordering::Relaxed);
        let errors = self.error_requests.load(Ordering::Relaxed);
        let sum = self.response_time_sum_ms.load(Ordering::Relaxed);
        let min = self.min_response_time_ms.load(Ordering::Relaxed);

        MetricsSnapshot {
            total_requests: total,
            success_requests: success,
            error_requests: errors,
            success_rate: success_rate(success, total),
            avg_response_time_ms: average(sum, total),
            min_response_time_ms: if min == u64::MAX { 0 } else { min },
            max_response_time_ms: self.max_response_time_ms.load(Ordering::Relaxed),
            token_validations: self.token_validations.load(Ordering::Relaxed),
            total_tokens: self.total_tokens.load(Ordering::Relaxed),
            active_tokens: self.active_tokens.load(Ordering::Relaxed),
            total_configs: self.total_configs.load(Ordering::Relaxed),
            active_configs: self.active_configs.load(Ordering::Relaxed),
            memory_usage_bytes: self.resources.lock().memory_bytes,
            active_requests: self.active_requests.load(Ordering::Relaxed),
            uptime_secs: self.uptime().as_secs(),
            history: self.history.lock().to_view(),
            timestamp: Utc::now(),
        }
    }

    pub fn health(&self) -> HealthReport {
        evaluate_health(&self.snapshot())
    }

    /// Zero cumulative counters and history. Gauges describing present
    /// configuration and in-flight work are left alone.
    pub fn reset(&self) {
        self.total_requests.store(0, Ordering::Relaxed);
        self.success_requests.store(0, Ordering::Relaxed);
        self.error_requests.store(0, Ordering::Relaxed);
        self.token_validations.store(0, Ordering::Relaxed);
        self.response_time_sum_ms.store(0, Ordering::Relaxed);
        self.min_response_time_ms.store(u64::MAX, Ordering::Relaxed);
        self.max_response_time_ms.store(0, Ordering::Relaxed);
        self.history.lock().clear();
        tracing::info!("Metrics reset");
    }

    /// Refresh resource readings and store gauges, then rotate the history slot if the elapsed
    /// minute changed since the last rotation.
    pub fn tick(&self) {
        let usage = self.sampler.lock().sample();
        *self.resources.lock() = usage;
        self.refresh_gauges();

        let minute = self.uptime().as_secs() / 60;
        self.rotate_history(minute);

        prometheus::update_runtime_gauges(
            self.active_requests.load(Ordering::Relaxed),
            usage.memory_bytes,
            self.uptime().as_secs(),
        );
    }

    pub(crate) fn rotate_history(&self, minute: u64) -> bool {
        let total = self.total_requests.load(Ordering::Relaxed);
        let errors = self.error_requests.load(Ordering::Relaxed);
        let avg = average(self.response_time_sum_ms.load(Ordering::Relaxed), total);
        self.history.lock().rotate(minute, total, errors, avg)
    }

    /// Start the background tick. Stopped by [`MetricsCollector::stop`].
    pub fn start(self: &Arc<Self>) -> JoinHandle<()> {
        let collector = Arc::clone(self);
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let interval = self.tick_interval;

        tokio::spawn(async move {
            tracing::debug!(interval_secs = interval.as_secs(), "Metrics tick started");
            collector.tick();
            loop {
                if *shutdown_rx.borrow() {
                    break;
                }
                tokio::select! {
                    () = tokio::time::sleep(interval) => {
                        collector.tick();
                    }
                    _ = shutdown_rx.changed() => {
                        tracing::info!("Metrics tick shutting down");
                        break;
                    }
                }
            }
        })
    }

    pub fn stop(&self) {
        self.shutdown_tx.send_replace(true);
    }
}

fn success_rate(success: u64, total: u64) -> f64 {
    if total == 0 {
        return 100.0;
    }
    round2(success as f64 * 100.0 / total as f64)
}

fn average(sum: u64, count: u64) -> f64 {
    if count == 0 {
        0.0
    } else {
        sum as f64 / count as f64
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
#[path = "collector_tests.rs"]
mod tests;
