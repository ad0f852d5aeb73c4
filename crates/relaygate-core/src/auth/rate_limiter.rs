use dashmap::DashMap;
use std::net::IpAddr;
use std::time::{Duration, Instant};

const MAX_FAILED_ATTEMPTS: u32 = 5;
const BLOCK_DURATION: Duration = Duration::from_secs(15 * 60);
const CLEANUP_THRESHOLD: usize = 1000;

struct FailedAttempt {
    count: u32,
    blocked_until: Option<Instant>,
}

/// Blocks a client IP after repeated admin-key failures.
pub struct AuthFailureTracker {
    attempts: DashMap<IpAddr, FailedAttempt>,
    max_attempts: u32,
    block_duration: Duration,
}

impl Default for AuthFailureTracker {
    fn default() -> Self {
        Self::new(MAX_FAILED_ATTEMPTS, BLOCK_DURATION)
    }
}

impl AuthFailureTracker {
    pub fn new(max_attempts: u32, block_duration: Duration) -> Self {
        Self { attempts: DashMap::new(), max_attempts, block_duration }
    }

    pub fn is_blocked(&self, ip: IpAddr) -> bool {
        self.attempts
            .get(&ip)
            .and_then(|entry| entry.blocked_until)
            .is_some_and(|until| Instant::now() < until)
    }

    /// Returns true when this failure triggered a block.
    pub fn record_failure(&self, ip: IpAddr) -> bool {
        self.cleanup_if_needed();

        let now = Instant::now();
        let mut entry =
            self.attempts.entry(ip).or_insert(FailedAttempt { count: 0, blocked_until: None });

        if entry.blocked_until.is_some_and(|t| now >= t) {
            entry.count = 0;
            entry.blocked_until = None;
        }

        entry.count = entry.count.saturating_add(1);

        if entry.count >= self.max_attempts {
            entry.blocked_until = now.checked_add(self.block_duration);
            tracing::warn!(
                "IP {} blocked for {}s after {} failed admin auth attempts",
                ip,
                self.block_duration.as_secs(),
                entry.count
            );
            return true;
        }

        false
    }

    pub fn clear(&self, ip: IpAddr) {
        self.attempts.remove(&ip);
    }

    fn cleanup_if_needed(&self) {
        if self.attempts.len() > CLEANUP_THRESHOLD {
            let now = Instant::now();
            self.attempts.retain(|_, v| v.blocked_until.map_or(v.count > 0, |t| now < t));
        }
    }
}
