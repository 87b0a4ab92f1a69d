//! Mock counter metric for testing.

use crate::application::ports::CounterMetric;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Counter metric that keeps its counts in memory.
#[derive(Debug, Clone, Default)]
pub struct MockCounterMetric {
    counts: Arc<Mutex<HashMap<String, u64>>>,
}

impl MockCounterMetric {
    /// Create a counter metric with no counts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of counter `name` (0 if never incremented).
    pub fn get(&self, name: &str) -> u64 {
        self.counts
            .lock()
            .expect("MockCounterMetric mutex poisoned - a test thread panicked while holding the lock")
            .get(name)
            .copied()
            .unwrap_or(0)
    }
}

impl CounterMetric for MockCounterMetric {
    fn increment(&self, name: &str) {
        *self
            .counts
            .lock()
            .expect("MockCounterMetric mutex poisoned - a test thread panicked while holding the lock")
            .entry(name.to_string())
            .or_insert(0) += 1;
    }
}
