//! RAII guard for cancellation-safe in-flight request counting.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Increments the in-flight gauge on creation, decrements on drop.
///
/// A forward abandoned mid-flight (client hang-up, timeout) still drops the
/// guard, so the gauge never leaks.
pub struct ActiveRequestGuard {
    active_requests: Arc<AtomicU64>,
}

impl ActiveRequestGuard {
    pub fn new(active_requests: Arc<AtomicU64>) -> Self {
        active_requests.fetch_add(1, Ordering::SeqCst);
        Self { active_requests }
    }
}

impl Drop for ActiveRequestGuard {
    fn drop(&mut self) {
        let _ = self.active_requests.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |v| {
            if v > 0 {
                Some(v - 1)
            } else {
                None
            }
        });
    }
}
