//! Severity levels understood by the rate limiter.

use std::fmt;

/// Log severity, from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Level {
    /// All levels, in ascending severity.
    pub const ALL: [Level; 5] = [
        Level::Trace,
        Level::Debug,
        Level::Info,
        Level::Warn,
        Level::Error,
    ];

    /// Lowercase name of the level (e.g. `"warn"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
        }
    }

    /// Name of the counter metric bumped for every attempt at this level.
    ///
    /// ```
    /// use rate_limited_log::Level;
    ///
    /// assert_eq!(Level::Info.metric_name(), "info_rate_limited_log_count");
    /// ```
    pub fn metric_name(&self) -> &'static str {
        match self {
            Level::Trace => "trace_rate_limited_log_count",
            Level::Debug => "debug_rate_limited_log_count",
            Level::Info => "info_rate_limited_log_count",
            Level::Warn => "warn_rate_limited_log_count",
            Level::Error => "error_rate_limited_log_count",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Level> for tracing::Level {
    fn from(level: Level) -> Self {
        match level {
            Level::Trace => tracing::Level::TRACE,
            Level::Debug => tracing::Level::DEBUG,
            Level::Info => tracing::Level::INFO,
            Level::Warn => tracing::Level::WARN,
            Level::Error => tracing::Level::ERROR,
        }
    }
}
