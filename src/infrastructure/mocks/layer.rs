//! Mock tracing layer for testing.

use std::sync::{Arc, Mutex};
use tracing::Level;
use tracing_subscriber::Layer;

/// Layer that records every `tracing` event it sees.
///
/// Used to observe what [`TracingSink`](crate::TracingSink) and the crate's
/// own diagnostics write.
#[derive(Debug, Clone)]
pub struct MockCaptureLayer {
    captured: Arc<Mutex<Vec<CapturedEvent>>>,
}

/// Captured event information.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct CapturedEvent {
    pub level: Level,
    pub target: String,
    pub message: String,
}

impl MockCaptureLayer {
    /// Create a new mock capture layer.
    pub fn new() -> Self {
        Self {
            captured: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Get all captured events.
    pub fn get_captured(&self) -> Vec<CapturedEvent> {
        self.events().clone()
    }

    /// Get the count of captured events.
    pub fn count(&self) -> usize {
        self.events().len()
    }

    /// Messages of captured events with the given target.
    pub fn messages_for(&self, target: &str) -> Vec<String> {
        self.events()
            .iter()
            .filter(|e| e.target == target)
            .map(|e| e.message.clone())
            .collect()
    }

    /// Clear all captured events.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// use rate_limited_log::infrastructure::mocks::MockCaptureLayer;
    /// use tracing::info;
    /// use tracing_subscriber::layer::SubscriberExt;
    ///
    /// let capture = MockCaptureLayer::new();
    /// let subscriber = tracing_subscriber::registry().with(capture.clone());
    ///
    /// tracing::subscriber::with_default(subscriber, || {
    ///     info!("test message");
    ///     assert_eq!(capture.count(), 1);
    ///
    ///     capture.clear();
    ///     assert_eq!(capture.count(), 0);
    /// });
    /// ```
    pub fn clear(&self) {
        self.events().clear();
    }

    fn events(&self) -> std::sync::MutexGuard<'_, Vec<CapturedEvent>> {
        self.captured.lock().expect(
            "MockCaptureLayer mutex poisoned - a test thread panicked while holding the lock",
        )
    }
}

impl Default for MockCaptureLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Layer<S> for MockCaptureLayer
where
    S: tracing::Subscriber,
{
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = MessageVisitor {
            message: String::new(),
        };
        event.record(&mut visitor);

        self.events().push(CapturedEvent {
            level: *event.metadata().level(),
            target: event.metadata().target().to_string(),
            message: visitor.message,
        });
    }
}

struct MessageVisitor {
    message: String,
}

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        }
    }
}
