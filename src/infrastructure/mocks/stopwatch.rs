//! Mock stopwatch for testing.

use crate::application::ports::Stopwatch;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Mock stopwatch for testing.
///
/// Reads zero until moved with [`advance`](Self::advance) or
/// [`set`](Self::set), which makes suppression summaries deterministic.
///
/// `MockStopwatch` is thread-safe and can be cloned to share across threads.
/// All clones share the same reading, so advancing one clone affects all.
#[derive(Debug, Clone, Default)]
pub struct MockStopwatch {
    elapsed: Arc<Mutex<Duration>>,
}

impl MockStopwatch {
    /// Create a mock stopwatch reading zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock stopwatch with a fixed initial reading.
    pub fn at(elapsed: Duration) -> Self {
        Self {
            elapsed: Arc::new(Mutex::new(elapsed)),
        }
    }

    /// Advance the stopwatch by a duration.
    pub fn advance(&self, duration: Duration) {
        let mut elapsed = self
            .elapsed
            .lock()
            .expect("MockStopwatch mutex poisoned - a test thread panicked while holding the lock");
        *elapsed += duration;
    }

    /// Set the stopwatch to a specific reading.
    pub fn set(&self, elapsed: Duration) {
        *self
            .elapsed
            .lock()
            .expect("MockStopwatch mutex poisoned - a test thread panicked while holding the lock") =
            elapsed;
    }
}

impl Stopwatch for MockStopwatch {
    fn elapsed(&self) -> Duration {
        *self
            .elapsed
            .lock()
            .expect("MockStopwatch mutex poisoned - a test thread panicked while holding the lock")
    }
}
