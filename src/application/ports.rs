//! Ports (interfaces) for the application layer.
//!
//! In hexagonal architecture, ports define the interfaces that the application
//! layer needs. Infrastructure adapters implement these ports.

use crate::domain::level::Level;
use crate::domain::template::format_template;
use std::fmt::{Debug, Display};
use std::time::Duration;

/// Port for measuring elapsed time.
///
/// This abstraction allows the application layer to work with time
/// without depending on system clock implementation details.
/// Infrastructure provides concrete implementations (SystemStopwatch, MockStopwatch).
pub trait Stopwatch: Send + Sync + Debug {
    /// Monotonic time elapsed since the stopwatch started.
    fn elapsed(&self) -> Duration;
}

/// Port for the log destination sitting behind the rate limiter.
///
/// Delivery failures are the sink's own concern; the rate limiter never
/// inspects them.
pub trait LogSink: Send + Sync + Debug {
    /// Deliver an already formatted message.
    fn log(&self, level: Level, message: &str);

    /// Deliver a message template with its positional arguments.
    ///
    /// The default renders `{}` placeholders with [`format_template`]. Sinks
    /// with their own formatter can override this.
    fn log_template(&self, level: Level, template: &str, args: &[&dyn Display]) {
        self.log(level, &format_template(template, args));
    }
}

/// Port for an external counter metric.
///
/// Absence of a counter metric is a legal configuration with no side effects.
pub trait CounterMetric: Send + Sync + Debug {
    /// Increment the counter called `name` by one.
    fn increment(&self, name: &str);
}
