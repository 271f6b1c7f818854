//! Batcher counters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

#[derive(Debug, Default)]
pub(crate) struct BatcherStats {
    batches_enqueued: AtomicU64,
    batches_processed: AtomicU64,
    batches_failed: AtomicU64,
    batches_drained: AtomicU64,
    elements_processed: AtomicU64,
    enqueue_wait_nanos: AtomicU64,
}

impl BatcherStats {
    pub(crate) fn record_enqueued(&self, waited: Duration) {
        self.batches_enqueued.fetch_add(1, Ordering::Relaxed);
        let nanos = u64::try_from(waited.as_nanos()).unwrap_or(u64::MAX);
        self.enqueue_wait_nanos.fetch_add(nanos, Ordering::Relaxed);
    }

    pub(crate) fn record_processed(&self, elements: usize, drained: bool) {
        self.batches_processed.fetch_add(1, Ordering::Relaxed);
        self.elements_processed
            .fetch_add(elements as u64, Ordering::Relaxed);
        if drained {
            self.batches_drained.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_failed(&self) {
        self.batches_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> BatcherSnapshot {
        BatcherSnapshot {
            batches_enqueued: self.batches_enqueued.load(Ordering::Relaxed),
            batches_processed: self.batches_processed.load(Ordering::Relaxed),
            batches_failed: self.batches_failed.load(Ordering::Relaxed),
            batches_drained: self.batches_drained.load(Ordering::Relaxed),
            elements_processed: self.elements_processed.load(Ordering::Relaxed),
            enqueue_wait: Duration::from_nanos(self.enqueue_wait_nanos.load(Ordering::Relaxed)),
        }
    }
}

/// Point-in-time copy of a batcher's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatcherSnapshot {
    /// Batches handed to the queue by adders.
    pub batches_enqueued: u64,
    /// Batches the consumer accepted, by workers or during stop.
    pub batches_processed: u64,
    /// Batches whose consumer call returned an error or panicked.
    pub batches_failed: u64,
    /// Of `batches_processed`, those processed by the stopping thread.
    pub batches_drained: u64,
    pub elements_processed: u64,
    /// Total time producers spent blocked on a full queue.
    pub enqueue_wait: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_records() {
        let stats = BatcherStats::default();
        stats.record_enqueued(Duration::from_millis(3));
        stats.record_enqueued(Duration::from_millis(2));
        stats.record_processed(10, false);
        stats.record_processed(4, true);
        stats.record_failed();

        let snap = stats.snapshot();
        assert_eq!(snap.batches_enqueued, 2);
        assert_eq!(snap.batches_processed, 2);
        assert_eq!(snap.batches_drained, 1);
        assert_eq!(snap.batches_failed, 1);
        assert_eq!(snap.elements_processed, 14);
        assert_eq!(snap.enqueue_wait, Duration::from_millis(5));
    }
}
