//! # State Tracker
//!
//! Shared pending-work aggregate. Endpoints notify it as inbound packets are
//! enqueued and drained; the scheduler reads it to decide whether the sender
//! still has work outstanding. Written from network threads and the pipeline
//! thread concurrently — atomics only, no locks on the hot path.

use std::sync::atomic::{AtomicU64, Ordering};

/// Capability interface through which an endpoint reports inbound activity.
///
/// Injected at endpoint construction, so endpoints stay testable against a
/// recording double.
pub trait ActivityTracker: Send + Sync {
    /// `count` packets were enqueued and await a pull.
    fn notify_pending(&self, count: usize);
    /// `count` packets were drained out of a queue.
    fn notify_drained(&self, count: usize);
}

/// Cross-endpoint pending-work aggregate read by the scheduler.
#[derive(Debug, Default)]
pub struct StateTracker {
    pending_inbound: AtomicU64,
}

impl StateTracker {
    pub fn new() -> Self {
        StateTracker::default()
    }

    /// Inbound packets enqueued but not yet pulled, across all endpoints.
    pub fn pending_inbound(&self) -> u64 {
        self.pending_inbound.load(Ordering::Acquire)
    }

    /// Whether any endpoint has inbound work outstanding.
    pub fn has_pending_inbound(&self) -> bool {
        self.pending_inbound() > 0
    }
}

impl ActivityTracker for StateTracker {
    fn notify_pending(&self, count: usize) {
        self.pending_inbound
            .fetch_add(count as u64, Ordering::AcqRel);
    }

    fn notify_drained(&self, count: usize) {
        // Saturating: a drain can never owe more than was announced.
        let _ = self
            .pending_inbound
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |v| {
                Some(v.saturating_sub(count as u64))
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_count_follows_notifications() {
        let tracker = StateTracker::new();
        assert!(!tracker.has_pending_inbound());

        tracker.notify_pending(3);
        tracker.notify_pending(2);
        assert_eq!(tracker.pending_inbound(), 5);
        assert!(tracker.has_pending_inbound());

        tracker.notify_drained(5);
        assert_eq!(tracker.pending_inbound(), 0);
    }

    #[test]
    fn drain_saturates_at_zero() {
        let tracker = StateTracker::new();
        tracker.notify_pending(1);
        tracker.notify_drained(10);
        assert_eq!(tracker.pending_inbound(), 0);
    }
}
