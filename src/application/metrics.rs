//! Observability metrics for rate limiting.
//!
//! Provides metrics about rate limiting behavior for monitoring and debugging.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Metrics tracking rate limiting statistics.
///
/// All metrics use atomic operations for thread-safe updates and reads.
/// Clones share the same counters.
#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug, Default)]
struct MetricsInner {
    /// Total number of events passed to the sink
    events_allowed: AtomicU64,
    /// Total number of events withheld from the sink
    events_suppressed: AtomicU64,
    /// Total number of suppression summaries emitted
    summaries_emitted: AtomicU64,
    /// Total number of pattern cache overflows
    cache_overflows: AtomicU64,
}

impl Metrics {
    /// Create a new metrics tracker.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner::default()),
        }
    }

    pub(crate) fn record_allowed(&self) {
        self.inner.events_allowed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_suppressed(&self) {
        self.inner.events_suppressed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_summary(&self) {
        self.inner.summaries_emitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_overflow(&self) {
        self.inner.cache_overflows.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the total number of events allowed.
    pub fn events_allowed(&self) -> u64 {
        self.inner.events_allowed.load(Ordering::Relaxed)
    }

    /// Get the total number of events suppressed.
    pub fn events_suppressed(&self) -> u64 {
        self.inner.events_suppressed.load(Ordering::Relaxed)
    }

    /// Get the total number of suppression summaries emitted.
    pub fn summaries_emitted(&self) -> u64 {
        self.inner.summaries_emitted.load(Ordering::Relaxed)
    }

    /// Get the number of times the pattern cache overflowed.
    pub fn cache_overflows(&self) -> u64 {
        self.inner.cache_overflows.load(Ordering::Relaxed)
    }

    /// Get a snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            events_allowed: self.events_allowed(),
            events_suppressed: self.events_suppressed(),
            summaries_emitted: self.summaries_emitted(),
            cache_overflows: self.cache_overflows(),
        }
    }

    /// Reset all metrics to zero.
    pub fn reset(&self) {
        self.inner.events_allowed.store(0, Ordering::Relaxed);
        self.inner.events_suppressed.store(0, Ordering::Relaxed);
        self.inner.summaries_emitted.store(0, Ordering::Relaxed);
        self.inner.cache_overflows.store(0, Ordering::Relaxed);
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time snapshot of metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Total number of events passed to the sink
    pub events_allowed: u64,
    /// Total number of events withheld from the sink
    pub events_suppressed: u64,
    /// Total number of suppression summaries emitted
    pub summaries_emitted: u64,
    /// Total number of pattern cache overflows
    pub cache_overflows: u64,
}

impl MetricsSnapshot {
    /// Calculate the suppression rate (0.0 to 1.0).
    ///
    /// Returns 0.0 if no events have been processed.
    pub fn suppression_rate(&self) -> f64 {
        let total = self.total_events();
        if total == 0 {
            0.0
        } else {
            self.events_suppressed as f64 / total as f64
        }
    }

    /// Get the total number of events processed (allowed + suppressed).
    pub fn total_events(&self) -> u64 {
        self.events_allowed.saturating_add(self.events_suppressed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_initial_state() {
        let metrics = Metrics::new();
        assert_eq!(metrics.snapshot(), MetricsSnapshot {
            events_allowed: 0,
            events_suppressed: 0,
            summaries_emitted: 0,
            cache_overflows: 0,
        });
    }

    #[test]
    fn test_record_counts() {
        let metrics = Metrics::new();
        metrics.record_allowed();
        metrics.record_allowed();
        metrics.record_suppressed();
        metrics.record_summary();
        metrics.record_overflow();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.events_allowed, 2);
        assert_eq!(snapshot.events_suppressed, 1);
        assert_eq!(snapshot.summaries_emitted, 1);
        assert_eq!(snapshot.cache_overflows, 1);
        assert_eq!(snapshot.total_events(), 3);
    }

    #[test]
    fn test_snapshot_suppression_rate() {
        let metrics = Metrics::new();
        assert_eq!(metrics.snapshot().suppression_rate(), 0.0);

        metrics.record_allowed();
        metrics.record_suppressed();
        metrics.record_suppressed();
        metrics.record_suppressed();
        assert!((metrics.snapshot().suppression_rate() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_reset() {
        let metrics = Metrics::new();
        metrics.record_allowed();
        metrics.record_overflow();

        metrics.reset();
        assert_eq!(metrics.events_allowed(), 0);
        assert_eq!(metrics.cache_overflows(), 0);
    }

    #[test]
    fn test_clones_share_counters() {
        let metrics1 = Metrics::new();
        metrics1.record_allowed();

        let metrics2 = metrics1.clone();
        metrics2.record_allowed();

        assert_eq!(metrics1.events_allowed(), 2);
        assert_eq!(metrics2.events_allowed(), 2);
    }

    #[test]
    fn test_concurrent_updates() {
        use std::thread;

        let metrics = Metrics::new();
        let mut handles = vec![];

        for _ in 0..10 {
            let m = metrics.clone();
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    m.record_allowed();
                    m.record_suppressed();
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(metrics.events_allowed(), 1000);
        assert_eq!(metrics.events_suppressed(), 1000);
    }
}
