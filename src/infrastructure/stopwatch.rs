//! Stopwatch adapters for elapsed-time measurement.
//!
//! Provides SystemStopwatch implementation for production use.
//!
//! # Testing
//!
//! See `MockStopwatch` (in `crate::infrastructure::mocks`) for a controllable
//! test stopwatch. Available with the `test-helpers` feature or in test builds:
//!
//! ```toml
//! [dev-dependencies]
//! rate-limited-log = { version = "*", features = ["test-helpers"] }
//! ```

use crate::application::ports::Stopwatch;
use std::time::{Duration, Instant};

/// Stopwatch backed by the monotonic system clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemStopwatch {
    started: Instant,
}

impl SystemStopwatch {
    /// Start a stopwatch now.
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

impl Default for SystemStopwatch {
    fn default() -> Self {
        Self::start()
    }
}

impl Stopwatch for SystemStopwatch {
    fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_stopwatch() {
        let stopwatch = SystemStopwatch::start();
        let t1 = stopwatch.elapsed();
        std::thread::sleep(Duration::from_millis(10));
        let t2 = stopwatch.elapsed();

        assert!(t2 > t1);
        assert!(t2 >= Duration::from_millis(10));
    }
}
