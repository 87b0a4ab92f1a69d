//! Public logging facade.
//!
//! [`RateLimitedLog`] is the entry point: it routes each call through its
//! pattern cache to the pattern's counter and on to the configured sink.

use crate::application::cache::{PatternCache, DEFAULT_MAX_PATTERNS};
use crate::application::metrics::Metrics;
use crate::application::pattern::{LogContext, RateLimitedPattern};
use crate::application::ports::{CounterMetric, LogSink, Stopwatch};
use crate::application::registry::Registry;
use crate::application::scheduler::SchedulerError;
use crate::domain::level::Level;
use crate::domain::rate::{RateAndPeriod, RateError};
use crate::infrastructure::sink::TracingSink;
use crate::infrastructure::stopwatch::SystemStopwatch;

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

/// Error returned when building a RateLimitedLog fails.
#[derive(Debug)]
pub enum BuildError {
    /// The rate or period is invalid
    Rate(RateError),
    /// Maximum patterns must be greater than zero
    ZeroMaxPatterns,
    /// The reset scheduler could not be started
    Scheduler(SchedulerError),
}

impl std::fmt::Display for BuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildError::Rate(e) => write!(f, "invalid rate: {}", e),
            BuildError::ZeroMaxPatterns => write!(f, "max_patterns must be greater than 0"),
            BuildError::Scheduler(e) => write!(f, "registry unavailable: {}", e),
        }
    }
}

impl std::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BuildError::Rate(e) => Some(e),
            BuildError::ZeroMaxPatterns => None,
            BuildError::Scheduler(e) => Some(e),
        }
    }
}

impl From<RateError> for BuildError {
    fn from(e: RateError) -> Self {
        BuildError::Rate(e)
    }
}

impl From<SchedulerError> for BuildError {
    fn from(e: SchedulerError) -> Self {
        BuildError::Scheduler(e)
    }
}

/// Builder for constructing a `RateLimitedLog`.
#[derive(Debug)]
pub struct RateLimitedLogBuilder {
    max_rate: u32,
    period: Duration,
    sink: Option<Arc<dyn LogSink>>,
    stopwatch: Option<Arc<dyn Stopwatch>>,
    counter_metric: Option<Arc<dyn CounterMetric>>,
    registry: Option<Arc<Registry>>,
    max_patterns: usize,
}

impl RateLimitedLogBuilder {
    /// Set the sink receiving allowed lines and suppression summaries.
    ///
    /// Default: [`TracingSink`]
    pub fn with_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Set a custom stopwatch (mainly for testing).
    ///
    /// Default: a [`SystemStopwatch`] started by `build()`
    pub fn with_stopwatch(mut self, stopwatch: Arc<dyn Stopwatch>) -> Self {
        self.stopwatch = Some(stopwatch);
        self
    }

    /// Set an external counter bumped once per logging call.
    ///
    /// The counter is named after the call's level, e.g.
    /// `"warn_rate_limited_log_count"`, and counts suppressed calls too.
    pub fn with_metrics(mut self, counter: Arc<dyn CounterMetric>) -> Self {
        self.counter_metric = Some(counter);
        self
    }

    /// Use `registry` instead of the process-wide one.
    pub fn with_registry(mut self, registry: Arc<Registry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Set the maximum number of distinct patterns.
    ///
    /// Going over the limit logs a warning, flushes the registry and clears
    /// the cache.
    ///
    /// Default: 1000 patterns
    ///
    /// The value will be validated when `build()` is called.
    pub fn with_max_patterns(mut self, max_patterns: usize) -> Self {
        self.max_patterns = max_patterns;
        self
    }

    /// Build the facade.
    ///
    /// # Errors
    /// Returns `BuildError` if the configuration is invalid or the global
    /// registry cannot start its scheduler.
    pub fn build(self) -> Result<RateLimitedLog, BuildError> {
        let rate = RateAndPeriod::new(self.max_rate, self.period)?;

        if self.max_patterns == 0 {
            return Err(BuildError::ZeroMaxPatterns);
        }

        let registry = match self.registry {
            Some(registry) => registry,
            None => Registry::global()?,
        };

        let context = Arc::new(LogContext {
            sink: self.sink.unwrap_or_else(|| Arc::new(TracingSink::new())),
            stopwatch: self
                .stopwatch
                .unwrap_or_else(|| Arc::new(SystemStopwatch::start())),
            metrics: Metrics::new(),
            counter_metric: self.counter_metric,
        });

        Ok(RateLimitedLog {
            cache: Arc::new(PatternCache::new(
                rate,
                self.max_patterns,
                context,
                registry,
            )),
        })
    }
}

/// A log front-end that limits each message pattern to `max_rate` lines per
/// period.
///
/// Templates use `{}` placeholders filled from `args`. They must be the
/// un-interpolated message, since every distinct template is its own pattern.
///
/// ```rust,no_run
/// use rate_limited_log::RateLimitedLog;
/// use std::time::Duration;
///
/// let log = RateLimitedLog::builder(10, Duration::from_secs(60)).build().unwrap();
///
/// for attempt in 0..1_000 {
///     // At most 10 of these reach the sink each minute; the rest are
///     // reported in one summary line when the minute is up.
///     log.warn("retrying connection, attempt {}", &[&attempt]);
/// }
/// ```
///
/// Clones share the same patterns and metrics.
#[derive(Debug, Clone)]
pub struct RateLimitedLog {
    cache: Arc<PatternCache>,
}

impl RateLimitedLog {
    /// Create a builder allowing `max_rate` lines per `period` for each pattern.
    ///
    /// Defaults:
    /// - Sink: [`TracingSink`]
    /// - Stopwatch: [`SystemStopwatch`]
    /// - External counter metric: none
    /// - Registry: [`Registry::global`]
    /// - Max patterns: 1000
    pub fn builder(max_rate: u32, period: Duration) -> RateLimitedLogBuilder {
        RateLimitedLogBuilder {
            max_rate,
            period,
            sink: None,
            stopwatch: None,
            counter_metric: None,
            registry: None,
            max_patterns: DEFAULT_MAX_PATTERNS,
        }
    }

    /// Log `template` at trace level.
    pub fn trace(&self, template: &str, args: &[&dyn Display]) {
        self.log(Level::Trace, template, args);
    }

    /// Log `template` at debug level.
    pub fn debug(&self, template: &str, args: &[&dyn Display]) {
        self.log(Level::Debug, template, args);
    }

    /// Log `template` at info level.
    pub fn info(&self, template: &str, args: &[&dyn Display]) {
        self.log(Level::Info, template, args);
    }

    /// Log `template` at warn level.
    pub fn warn(&self, template: &str, args: &[&dyn Display]) {
        self.log(Level::Warn, template, args);
    }

    /// Log `template` at error level.
    pub fn error(&self, template: &str, args: &[&dyn Display]) {
        self.log(Level::Error, template, args);
    }

    /// Log `template` at `level`.
    ///
    /// All levels logged through the facade share one pattern per template.
    pub fn log(&self, level: Level, template: &str, args: &[&dyn Display]) {
        self.cache.get(template, None).log(level, args);
    }

    /// Handle for `template`, shared by every level.
    ///
    /// The handle is the same pattern the facade's own logging methods use.
    pub fn get(&self, template: &str) -> Arc<RateLimitedPattern> {
        self.cache.get(template, None)
    }

    /// Handle for `template` limited separately at `level`.
    ///
    /// Its summaries are emitted at `level`.
    pub fn get_with_level(&self, template: &str, level: Level) -> Arc<RateLimitedPattern> {
        self.cache.get(template, Some(level))
    }

    /// Get a reference to the metrics.
    pub fn metrics(&self) -> &Metrics {
        &self.cache.context().metrics
    }

    /// Number of patterns currently cached.
    pub fn pattern_count(&self) -> usize {
        self.cache.len()
    }

    /// The rate applied to every pattern.
    pub fn rate(&self) -> &RateAndPeriod {
        self.cache.rate()
    }

    /// The registry driving this facade's resets.
    pub fn registry(&self) -> &Arc<Registry> {
        self.cache.registry()
    }
}
