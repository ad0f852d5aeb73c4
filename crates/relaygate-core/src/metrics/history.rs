//! 60-slot per-minute ring buffer.

use relaygate_types::models::MetricsHistory;

pub const HISTORY_SLOTS: usize = 60;

/// Slot `minute % 60` holds the cumulative request/error counts and the
/// average response time observed when that minute was rotated in.
#[derive(Debug, Clone)]
pub struct HistoryRing {
    requests: [u64; HISTORY_SLOTS],
    avg_response_time: [f64; HISTORY_SLOTS],
    errors: [u64; HISTORY_SLOTS],
    last_minute: Option<u64>,
}

impl Default for HistoryRing {
    fn default() -> Self {
        Self {
            requests: [0; HISTORY_SLOTS],
            avg_response_time: [0.0; HISTORY_SLOTS],
            errors: [0; HISTORY_SLOTS],
            last_minute: None,
        }
    }
}

impl HistoryRing {
    /// Writes the slot for `minute` unless that minute was already recorded.
    /// Returns whether a slot was written.
    pub fn rotate(&mut self, minute: u64, requests: u64, errors: u64, avg_ms: f64) -> bool {
        if self.last_minute == Some(minute) {
            return false;
        }
        let slot = (minute % HISTORY_SLOTS as u64) as usize;
        self.requests[slot] = requests;
        self.errors[slot] = errors;
        self.avg_response_time[slot] = avg_ms;
        self.last_minute = Some(minute);
        true
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn last_minute(&self) -> Option<u64> {
        self.last_minute
    }

    pub fn to_view(&self) -> MetricsHistory {
        MetricsHistory {
            requests: self.requests.to_vec(),
            avg_response_time: self.avg_response_time.to_vec(),
            errors: self.errors.to_vec(),
        }
    }
}
