//! Progressive backoff for the error policy.
//!
//! Each resource maintains its own error count independently; the count
//! resets after a pass completes without returning an error to the queue.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Backoff duration for the given consecutive error count.
/// Fibonacci progression in seconds, capped at 60s. The work queue's own
/// coalescing sits on top of this.
pub fn progressive_backoff(error_count: u32) -> Duration {
    let fib_sequence = [1, 1, 2, 3, 5, 8, 13, 21, 34, 55];
    let index = std::cmp::min(error_count as usize, fib_sequence.len() - 1);
    std::cmp::min(
        Duration::from_secs(fib_sequence[index]),
        Duration::from_secs(60),
    )
}

/// Per-key consecutive error counts.
#[derive(Default)]
pub struct BackoffTracker {
    counts: Mutex<HashMap<String, u32>>,
}

impl BackoffTracker {
    /// Record an error for `key` and return the backoff to apply.
    pub fn record_error(&self, key: &str) -> Duration {
        let mut counts = self.counts.lock().unwrap_or_else(|e| e.into_inner());
        let count = counts.entry(key.to_string()).or_insert(0);
        let backoff = progressive_backoff(*count);
        *count = count.saturating_add(1);
        backoff
    }

    /// Clear the error count after a pass that did not error.
    pub fn clear(&self, key: &str) {
        let mut counts = self.counts.lock().unwrap_or_else(|e| e.into_inner());
        counts.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_and_caps() {
        assert_eq!(progressive_backoff(0), Duration::from_secs(1));
        assert_eq!(progressive_backoff(1), Duration::from_secs(1));
        assert_eq!(progressive_backoff(2), Duration::from_secs(2));
        assert_eq!(progressive_backoff(5), Duration::from_secs(8));
        assert_eq!(progressive_backoff(9), Duration::from_secs(55));
        assert_eq!(progressive_backoff(100), Duration::from_secs(55));
    }

    #[test]
    fn tracker_counts_per_key_and_resets() {
        let tracker = BackoffTracker::default();

        assert_eq!(tracker.record_error("default/app"), Duration::from_secs(1));
        assert_eq!(tracker.record_error("default/app"), Duration::from_secs(1));
        assert_eq!(tracker.record_error("default/app"), Duration::from_secs(2));

        // Distinct keys are independent.
        assert_eq!(tracker.record_error("default/other"), Duration::from_secs(1));

        tracker.clear("default/app");
        assert_eq!(tracker.record_error("default/app"), Duration::from_secs(1));
    }
}
