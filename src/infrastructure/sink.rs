//! Default log sink writing through `tracing`.

use crate::application::ports::LogSink;
use crate::domain::level::Level;

/// Target used for every event emitted by [`TracingSink`].
pub const LOG_TARGET: &str = "rate_limited_log";

/// Sink that forwards each line to the `tracing` macro of the same level.
///
/// Events carry the target [`LOG_TARGET`], so they can be filtered like any
/// other `tracing` output:
///
/// ```rust,no_run
/// use tracing_subscriber::filter::Targets;
/// use tracing_subscriber::prelude::*;
///
/// tracing_subscriber::registry()
///     .with(tracing_subscriber::fmt::layer())
///     .with(Targets::new().with_target(rate_limited_log::LOG_TARGET, tracing::Level::INFO))
///     .init();
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TracingSink {
    /// Create a new tracing sink.
    pub fn new() -> Self {
        Self
    }
}

impl LogSink for TracingSink {
    fn log(&self, level: Level, message: &str) {
        match level {
            Level::Trace => tracing::trace!(target: LOG_TARGET, "{}", message),
            Level::Debug => tracing::debug!(target: LOG_TARGET, "{}", message),
            Level::Info => tracing::info!(target: LOG_TARGET, "{}", message),
            Level::Warn => tracing::warn!(target: LOG_TARGET, "{}", message),
            Level::Error => tracing::error!(target: LOG_TARGET, "{}", message),
        }
    }
}
