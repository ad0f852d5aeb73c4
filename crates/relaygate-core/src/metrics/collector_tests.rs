#![allow(clippy::unwrap_used, reason = "test assertions")]

use super::*;
use relaygate_types::models::HealthState;

fn collector() -> Arc<MetricsCollector> {
    MetricsCollector::new(Duration::from_secs(30))
}

#[test]
fn test_snapshot_derives_rates() {
    let m = collector();
    m.record_request(100, true);
    m.record_request(200, true);
    m.record_request(150, false);

    let s = m.snapshot();
    assert_eq!(s.total_requests, 3);
    assert_eq!(s.success_requests, 2);
    assert_eq!(s.error_requests, 1);
    assert_eq!(s.min_response_time_ms, 100);
    assert_eq!(s.max_response_time_ms, 200);
    assert_eq!(s.avg_response_time_ms, 150.0);
    assert_eq!(s.success_rate, 66.67);
}

#[test]
fn test_empty_snapshot() {
    let s = collector().snapshot();
    assert_eq!(s.total_requests, 0);
    assert_eq!(s.min_response_time_ms, 0);
    assert_eq!(s.avg_response_time_ms, 0.0);
    assert_eq!(s.success_rate, 100.0);
    assert_eq!(s.history.requests.len(), 60);
}

#[test]
fn test_reset_keeps_gauges() {
    let m = collector();
    m.set_store_gauges(4, 3, 10, 7);
    m.record_request(50, true);
    m.record_token_validation();
    m.rotate_history(0);
    let _inflight = m.track_request();

    m.reset();
    let s = m.snapshot();
    assert_eq!(s.total_requests, 0);
    assert_eq!(s.token_validations, 0);
    assert_eq!(s.max_response_time_ms, 0);
    assert!(s.history.requests.iter().all(|v| *v == 0));
    assert_eq!((s.total_configs, s.active_configs), (4, 3));
    assert_eq!((s.total_tokens, s.active_tokens), (10, 7));
    assert_eq!(s.active_requests, 1);
}

#[test]
fn test_history_rotation_records_cumulative() {
    let m = collector();
    m.record_request(10, true);
    m.record_request(30, false);
    assert!(m.rotate_history(2));
    assert!(!m.rotate_history(2));
    m.record_request(20, true);
    assert!(m.rotate_history(3));

    let h = m.snapshot().history;
    assert_eq!(h.requests[2], 2);
    assert_eq!(h.errors[2], 1);
    assert_eq!(h.avg_response_time[2], 20.0);
    assert_eq!(h.requests[3], 3);
}

#[test]
fn test_concurrent_recording_is_lossless() {
    let m = collector();
    let threads: Vec<_> = (0..8)
        .map(|t| {
            let m = Arc::clone(&m);
            std::thread::spawn(move || {
                for i in 0..1000 {
                    m.record_request(t * 1000 + i, i % 10 != 0);
                }
            })
        })
        .collect();
    for t in threads {
        t.join().unwrap();
    }

    let s = m.snapshot();
    assert_eq!(s.total_requests, 8000);
    assert_eq!(s.error_requests, 800);
    assert_eq!(s.min_response_time_ms, 0);
    assert_eq!(s.max_response_time_ms, 7999);
}

#[test]
fn test_health_degrades_on_slow_average() {
    let m = collector();
    m.record_request(1500, true);
    let report = m.health();
    assert_eq!(report.status, HealthState::Degraded);
    assert!(report.degraded_checks().any(|c| c.name == "response_time"));
}

#[tokio::test]
async fn test_background_tick_stops() {
    let m = MetricsCollector::new(Duration::from_millis(10));
    let handle = m.start();
    tokio::time::sleep(Duration::from_millis(30)).await;
    m.stop();
    tokio::time::timeout(Duration::from_secs(2), handle).await.unwrap().unwrap();
    assert_eq!(m.snapshot().history.requests.len(), 60);
}
