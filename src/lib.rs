//! # rate-limited-log
//!
//! Per-pattern rate limiting in front of a log sink.
//!
//! Each message template gets its own counter. Within each period at most
//! `max_rate` lines per template reach the sink; the rest are counted, and
//! when the period ends a single summary line reports how many were dropped:
//!
//! ```text
//! (suppressed 9950 logs similar to 'retrying connection, attempt {}' in 1.2s)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rate_limited_log::RateLimitedLog;
//! use std::time::Duration;
//!
//! // Flush pending summaries when main returns.
//! let _flush = rate_limited_log::flush_on_exit().unwrap();
//!
//! // At most 10 lines per template per minute, written through `tracing`.
//! let log = RateLimitedLog::builder(10, Duration::from_secs(60))
//!     .build()
//!     .unwrap();
//!
//! for id in 0..10_000 {
//!     log.warn("cache miss for key {}", &[&id]);
//! }
//! ```
//!
//! ## Patterns
//!
//! Events are grouped by their **template**, not the rendered message. Pass
//! the template with `{}` placeholders and the values separately:
//!
//! ```rust,no_run
//! # use rate_limited_log::RateLimitedLog;
//! # use std::time::Duration;
//! # let log = RateLimitedLog::builder(10, Duration::from_secs(60)).build().unwrap();
//! # let user = 42;
//! log.info("user {} logged in", &[&user]);                 // one pattern
//! log.info(&format!("user {} logged in", user), &[]);      // one pattern per user!
//! ```
//!
//! Each facade caches at most 1000 patterns by default. Going over the limit
//! is treated as a bug in the caller: a warning is logged, pending summaries
//! are flushed and the cache starts over.
//!
//! Calls through the facade share one pattern per template across all
//! levels. To limit a level on its own, take a level-bound handle:
//!
//! ```rust,no_run
//! # use rate_limited_log::{Level, RateLimitedLog};
//! # use std::time::Duration;
//! # let log = RateLimitedLog::builder(10, Duration::from_secs(60)).build().unwrap();
//! let slow_query = log.get_with_level("slow query took {}ms", Level::Warn);
//! slow_query.emit(&[&1200]);
//! ```
//!
//! ## Periods and Summaries
//!
//! Patterns are reset by a background thread (`rate-limited-log-registry`)
//! shared by every facade using the global [`Registry`]. Each distinct
//! period gets one recurring reset job, first firing one period after the
//! first pattern with that period is created.
//!
//! The call that reaches `max_rate` is always logged. Under heavy
//! contention a few calls beyond it may also be logged before the limit is
//! recorded; the hot path takes no lock.
//!
//! ## Custom Sinks and Metrics
//!
//! ```rust,no_run
//! use rate_limited_log::{CounterMetric, Level, LogSink, RateLimitedLog};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[derive(Debug)]
//! struct Stderr;
//!
//! impl LogSink for Stderr {
//!     fn log(&self, level: Level, message: &str) {
//!         eprintln!("[{}] {}", level, message);
//!     }
//! }
//!
//! #[derive(Debug)]
//! struct Statsd;
//!
//! impl CounterMetric for Statsd {
//!     fn increment(&self, name: &str) {
//!         // e.g. "warn_rate_limited_log_count"
//!         let _ = name;
//!     }
//! }
//!
//! let log = RateLimitedLog::builder(100, Duration::from_secs(1))
//!     .with_sink(Arc::new(Stderr))
//!     .with_metrics(Arc::new(Statsd))
//!     .build()
//!     .unwrap();
//! ```
//!
//! ## Observability
//!
//! ```rust,no_run
//! # use rate_limited_log::RateLimitedLog;
//! # use std::time::Duration;
//! # let log = RateLimitedLog::builder(10, Duration::from_secs(60)).build().unwrap();
//! let snapshot = log.metrics().snapshot();
//! println!("Events allowed: {}", snapshot.events_allowed);
//! println!("Events suppressed: {}", snapshot.events_suppressed);
//! println!("Suppression rate: {:.2}%", snapshot.suppression_rate() * 100.0);
//! println!("Patterns cached: {}", log.pattern_count());
//! ```

// Domain layer - pure values
pub mod domain;

// Application layer - orchestration
pub mod application;

// Infrastructure layer - external adapters
pub mod infrastructure;

// Re-export commonly used types for convenience
pub use domain::{
    key::PatternKey,
    level::Level,
    rate::{RateAndPeriod, RateError},
    summary::SuppressionSummary,
    template::format_template,
};

pub use application::{
    cache::{PatternCache, DEFAULT_MAX_PATTERNS},
    metrics::{Metrics, MetricsSnapshot},
    pattern::{LimitDecision, RateLimitedPattern},
    ports::{CounterMetric, LogSink, Stopwatch},
    registry::{FlushGuard, Registry},
    scheduler::SchedulerError,
};

pub use infrastructure::{
    rate_limited_log::{BuildError, RateLimitedLog, RateLimitedLogBuilder},
    sink::{TracingSink, LOG_TARGET},
    stopwatch::SystemStopwatch,
    storage::ShardedStorage,
};

/// Flush the global registry when the returned guard is dropped.
///
/// Keep the guard alive for the whole of `main` so suppression summaries
/// still pending at exit are written out.
///
/// # Errors
/// Returns `SchedulerError` if the global registry cannot be started.
pub fn flush_on_exit() -> Result<FlushGuard, SchedulerError> {
    Ok(Registry::global()?.flush_on_drop())
}
