//! Mock log sink for testing.

use crate::application::ports::LogSink;
use crate::domain::level::Level;
use std::sync::{Arc, Mutex};

/// Sink that records every line it receives.
#[derive(Debug, Clone, Default)]
pub struct MockSink {
    captured: Arc<Mutex<Vec<CapturedLine>>>,
}

/// A line delivered to [`MockSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct CapturedLine {
    pub level: Level,
    pub message: String,
}

impl MockSink {
    /// Create an empty mock sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// All captured lines, in delivery order.
    pub fn captured(&self) -> Vec<CapturedLine> {
        self.lines().clone()
    }

    /// Messages of all captured lines, in delivery order.
    pub fn messages(&self) -> Vec<String> {
        self.lines().iter().map(|l| l.message.clone()).collect()
    }

    /// Messages of captured suppression summaries, in delivery order.
    pub fn summaries(&self) -> Vec<String> {
        self.lines()
            .iter()
            .filter(|l| l.message.starts_with("(suppressed "))
            .map(|l| l.message.clone())
            .collect()
    }

    /// Number of captured lines.
    pub fn count(&self) -> usize {
        self.lines().len()
    }

    /// Forget all captured lines.
    pub fn clear(&self) {
        self.lines().clear();
    }

    fn lines(&self) -> std::sync::MutexGuard<'_, Vec<CapturedLine>> {
        self.captured
            .lock()
            .expect("MockSink mutex poisoned - a test thread panicked while holding the lock")
    }
}

impl LogSink for MockSink {
    fn log(&self, level: Level, message: &str) {
        self.lines().push(CapturedLine {
            level,
            message: message.to_string(),
        });
    }
}
