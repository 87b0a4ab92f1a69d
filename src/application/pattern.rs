//! Per-pattern rate limiting state.
//!
//! A [`RateLimitedPattern`] counts the events logged for one template during
//! the current period, decides whether each event reaches the sink, and at the
//! end of the period reports how many events it withheld.
//!
//! ## Hot path
//!
//! Logging an event under the limit is one atomic increment and one load. The
//! unit's lock is only taken once per period, by the call that crosses the
//! limit, and by the periodic reset.

use crate::application::metrics::Metrics;
use crate::application::ports::{CounterMetric, LogSink, Stopwatch};
use crate::application::registry::Registry;
use crate::domain::key::PatternKey;
use crate::domain::level::Level;
use crate::domain::rate::RateAndPeriod;
use crate::domain::summary::SuppressionSummary;
use parking_lot::Mutex;
use std::fmt::{self, Display};
use std::hash::{Hash, Hasher};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

/// Marks `first_exceeded_at` as unset.
const NOT_EXCEEDED: u64 = 0;

/// Marks a pattern that has never joined its registry.
const NEVER_REGISTERED: u64 = u64::MAX;

static NEXT_PATTERN_ID: AtomicU64 = AtomicU64::new(1);

/// Decision about how to handle an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitDecision {
    /// Pass the event to the sink
    Allow,
    /// Withhold the event
    Suppress,
}

/// Collaborators shared by every pattern of one facade.
#[derive(Debug)]
pub(crate) struct LogContext {
    pub(crate) sink: Arc<dyn LogSink>,
    pub(crate) stopwatch: Arc<dyn Stopwatch>,
    pub(crate) metrics: Metrics,
    pub(crate) counter_metric: Option<Arc<dyn CounterMetric>>,
}

/// Rate limiting state for a single log pattern.
///
/// Handles are obtained from
/// [`RateLimitedLog::get`](crate::RateLimitedLog::get) and can be kept in a
/// local or static to skip the cache lookup on every call:
///
/// ```rust,no_run
/// use rate_limited_log::RateLimitedLog;
/// use std::time::Duration;
///
/// let log = RateLimitedLog::builder(5, Duration::from_secs(1)).build().unwrap();
/// let handle = log.get("cache miss for {}");
///
/// for id in 0..100 {
///     handle.info(&[&id]);
/// }
/// ```
///
/// Two patterns are equal when their keys are equal.
pub struct RateLimitedPattern {
    id: u64,
    key: PatternKey,
    rate: Arc<RateAndPeriod>,
    context: Arc<LogContext>,
    count: AtomicU64,
    /// Stopwatch millis at which the limit was crossed, `NOT_EXCEEDED` if not
    first_exceeded_at: AtomicU64,
    lock: Mutex<()>,
    registry: Weak<Registry>,
    registry_epoch: Arc<AtomicU64>,
    registered_epoch: AtomicU64,
}

impl RateLimitedPattern {
    pub(crate) fn new(
        key: PatternKey,
        rate: Arc<RateAndPeriod>,
        context: Arc<LogContext>,
        registry: &Arc<Registry>,
    ) -> Self {
        Self {
            id: NEXT_PATTERN_ID.fetch_add(1, Ordering::Relaxed),
            key,
            rate,
            context,
            count: AtomicU64::new(0),
            first_exceeded_at: AtomicU64::new(NOT_EXCEEDED),
            lock: Mutex::new(()),
            registry: Arc::downgrade(registry),
            registry_epoch: registry.epoch_counter(),
            registered_epoch: AtomicU64::new(NEVER_REGISTERED),
        }
    }

    /// The key this pattern limits.
    pub fn key(&self) -> &PatternKey {
        &self.key
    }

    /// The rate applied to this pattern.
    pub fn rate(&self) -> &RateAndPeriod {
        &self.rate
    }

    /// Events counted in the current period.
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Acquire)
    }

    /// Whether the limit has been reached in the current period.
    pub fn is_limited(&self) -> bool {
        self.first_exceeded_at.load(Ordering::Acquire) != NOT_EXCEEDED
    }

    /// Log at trace level.
    pub fn trace(self: &Arc<Self>, args: &[&dyn Display]) {
        self.log(Level::Trace, args);
    }

    /// Log at debug level.
    pub fn debug(self: &Arc<Self>, args: &[&dyn Display]) {
        self.log(Level::Debug, args);
    }

    /// Log at info level.
    pub fn info(self: &Arc<Self>, args: &[&dyn Display]) {
        self.log(Level::Info, args);
    }

    /// Log at warn level.
    pub fn warn(self: &Arc<Self>, args: &[&dyn Display]) {
        self.log(Level::Warn, args);
    }

    /// Log at error level.
    pub fn error(self: &Arc<Self>, args: &[&dyn Display]) {
        self.log(Level::Error, args);
    }

    /// Log at the level the key is bound to, or `Info` for unbound keys.
    pub fn emit(self: &Arc<Self>, args: &[&dyn Display]) {
        self.log(self.key.level().unwrap_or(Level::Info), args);
    }

    /// Count one event at `level` and forward it to the sink if the limit allows.
    ///
    /// The counter metric for `level` is incremented whether or not the
    /// event is suppressed.
    pub fn log(self: &Arc<Self>, level: Level, args: &[&dyn Display]) {
        self.ensure_registered();

        match self.attempt() {
            LimitDecision::Allow => {
                self.context.metrics.record_allowed();
                self.context
                    .sink
                    .log_template(level, self.key.template(), args);
            }
            LimitDecision::Suppress => self.context.metrics.record_suppressed(),
        }

        if let Some(counter) = &self.context.counter_metric {
            counter.increment(level.metric_name());
        }
    }

    /// Count one event and decide whether it may be logged.
    ///
    /// The call that brings the count to the maximum is still allowed and
    /// records the instant the limit was reached. Concurrent callers arriving
    /// in that window may also be allowed, so a period can let slightly more
    /// than the maximum through.
    pub fn attempt(&self) -> LimitDecision {
        let n = self.count.fetch_add(1, Ordering::AcqRel).saturating_add(1);

        if n < u64::from(self.rate.max_rate()) {
            return LimitDecision::Allow;
        }

        if self.first_exceeded_at.load(Ordering::Acquire) == NOT_EXCEEDED {
            self.mark_exceeded();
            return LimitDecision::Allow;
        }

        LimitDecision::Suppress
    }

    fn mark_exceeded(&self) {
        let _guard = self.lock.lock();
        // A reset that ran while this caller waited already started a new period.
        if self.count.load(Ordering::Acquire) < u64::from(self.rate.max_rate()) {
            return;
        }
        let now = self.elapsed_millis();
        // First writer wins.
        let _ = self.first_exceeded_at.compare_exchange(
            NOT_EXCEEDED,
            now,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    /// End the current period.
    ///
    /// Clears the count and the exceeded mark. If events were withheld, a
    /// summary is sent to the sink at the key's level (or `Info`) and
    /// returned.
    pub(crate) fn periodic_reset(&self) -> Option<SuppressionSummary> {
        let (exceeded_at, count) = {
            let _guard = self.lock.lock();
            let exceeded_at = self.first_exceeded_at.swap(NOT_EXCEEDED, Ordering::AcqRel);
            let count = self.count.swap(0, Ordering::AcqRel);
            (exceeded_at, count)
        };

        if exceeded_at == NOT_EXCEEDED {
            return None;
        }

        // Reaching the maximum exactly suppresses nothing.
        let suppressed = count.saturating_sub(u64::from(self.rate.max_rate()));
        if suppressed == 0 {
            return None;
        }

        let elapsed =
            Duration::from_millis(self.elapsed_millis().saturating_sub(exceeded_at));
        let summary = SuppressionSummary::new(self.key.clone(), suppressed, elapsed);

        self.context
            .sink
            .log(summary.level(), &summary.format_message());
        self.context.metrics.record_summary();

        Some(summary)
    }

    /// Report a panic raised while resetting this pattern.
    ///
    /// Goes to the pattern's sink at `Warn`; if the sink panics as well the
    /// failure is reported through `tracing`.
    pub(crate) fn report_reset_failure(&self, reason: &str) {
        let message = format!(
            "failed to reset rate-limited log '{}': {}",
            self.key.template(),
            reason
        );
        let sink = &self.context.sink;

        if panic::catch_unwind(AssertUnwindSafe(|| sink.log(Level::Warn, &message))).is_err() {
            tracing::warn!(pattern = %self.key, reason, "rate-limited log reset failed");
        }
    }

    /// Stopwatch reading in millis, never 0 so it cannot collide with `NOT_EXCEEDED`.
    fn elapsed_millis(&self) -> u64 {
        let millis = self.context.stopwatch.elapsed().as_millis();
        u64::try_from(millis).unwrap_or(u64::MAX).max(1)
    }

    /// Rejoin the registry after a flush dropped this pattern.
    fn ensure_registered(self: &Arc<Self>) {
        let current = self.registry_epoch.load(Ordering::Acquire);
        if self.registered_epoch.load(Ordering::Acquire) == current {
            return;
        }
        if let Some(registry) = self.registry.upgrade() {
            registry.register(self);
        }
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn mark_registered(&self, epoch: u64) {
        self.registered_epoch.store(epoch, Ordering::Release);
    }
}

impl fmt::Debug for RateLimitedPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimitedPattern")
            .field("key", &self.key)
            .field("rate", &self.rate)
            .field("count", &self.count())
            .field("limited", &self.is_limited())
            .finish()
    }
}

impl PartialEq for RateLimitedPattern {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for RateLimitedPattern {}

impl Hash for RateLimitedPattern {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::mocks::{MockCounterMetric, MockSink, MockStopwatch};

    struct Fixture {
        registry: Arc<Registry>,
        sink: MockSink,
        stopwatch: MockStopwatch,
        counter: MockCounterMetric,
        context: Arc<LogContext>,
    }

    impl Fixture {
        fn new() -> Self {
            let sink = MockSink::new();
            let stopwatch = MockStopwatch::new();
            let counter = MockCounterMetric::new();
            let context = Arc::new(LogContext {
                sink: Arc::new(sink.clone()),
                stopwatch: Arc::new(stopwatch.clone()),
                metrics: Metrics::new(),
                counter_metric: Some(Arc::new(counter.clone())),
            });
            Self {
                registry: Arc::new(Registry::new().unwrap()),
                sink,
                stopwatch,
                counter,
                context,
            }
        }

        fn pattern(&self, key: PatternKey, max_rate: u32) -> Arc<RateLimitedPattern> {
            let rate = Arc::new(RateAndPeriod::new(max_rate, Duration::from_secs(3600)).unwrap());
            Arc::new(RateLimitedPattern::new(
                key,
                rate,
                Arc::clone(&self.context),
                &self.registry,
            ))
        }
    }

    #[test]
    fn test_allows_up_to_max_then_suppresses() {
        let fx = Fixture::new();
        let pattern = fx.pattern(PatternKey::new("x"), 3);

        assert_eq!(pattern.attempt(), LimitDecision::Allow);
        assert_eq!(pattern.attempt(), LimitDecision::Allow);
        assert!(!pattern.is_limited());
        assert_eq!(pattern.attempt(), LimitDecision::Allow);
        assert!(pattern.is_limited());
        assert_eq!(pattern.attempt(), LimitDecision::Suppress);
        assert_eq!(pattern.count(), 4);
    }

    #[test]
    fn test_max_rate_one() {
        let fx = Fixture::new();
        let pattern = fx.pattern(PatternKey::new("x"), 1);

        assert_eq!(pattern.attempt(), LimitDecision::Allow);
        assert_eq!(pattern.attempt(), LimitDecision::Suppress);
    }

    #[test]
    fn test_reset_without_exceeding_is_silent() {
        let fx = Fixture::new();
        let pattern = fx.pattern(PatternKey::new("x"), 3);

        pattern.attempt();
        pattern.attempt();

        assert_eq!(pattern.periodic_reset(), None);
        assert_eq!(pattern.count(), 0);
        assert_eq!(fx.sink.count(), 0);
    }

    #[test]
    fn test_reset_at_exactly_max_is_silent() {
        let fx = Fixture::new();
        let pattern = fx.pattern(PatternKey::new("x"), 3);

        for _ in 0..3 {
            pattern.attempt();
        }
        assert!(pattern.is_limited());

        assert_eq!(pattern.periodic_reset(), None);
        assert!(!pattern.is_limited());
        assert_eq!(fx.sink.count(), 0);
    }

    #[test]
    fn test_reset_reports_suppressed_events() {
        let fx = Fixture::new();
        let pattern = fx.pattern(PatternKey::new("rateLimited {}"), 1);

        fx.stopwatch.set(Duration::from_millis(100));
        for _ in 0..5 {
            pattern.attempt();
        }
        fx.stopwatch.set(Duration::from_millis(699));

        let summary = pattern.periodic_reset().unwrap();
        assert_eq!(summary.suppressed, 4);
        assert_eq!(summary.elapsed, Duration::from_millis(599));

        let lines = fx.sink.messages();
        assert_eq!(
            lines,
            vec!["(suppressed 4 logs similar to 'rateLimited {}' in 599ms)".to_string()]
        );
        assert_eq!(fx.sink.captured()[0].level, Level::Info);
        assert_eq!(fx.context.metrics.summaries_emitted(), 1);
    }

    #[test]
    fn test_summary_uses_bound_level() {
        let fx = Fixture::new();
        let pattern = fx.pattern(PatternKey::with_level("x", Level::Error), 1);

        pattern.attempt();
        pattern.attempt();
        pattern.periodic_reset();

        assert_eq!(fx.sink.captured()[0].level, Level::Error);
    }

    #[test]
    fn test_zero_stopwatch_still_marks_exceeded() {
        let fx = Fixture::new();
        let pattern = fx.pattern(PatternKey::new("x"), 1);

        // Stopwatch reads zero; the mark must still be distinguishable from unset.
        pattern.attempt();
        assert!(pattern.is_limited());
        pattern.attempt();

        let summary = pattern.periodic_reset().unwrap();
        assert_eq!(summary.suppressed, 1);
        assert_eq!(summary.elapsed, Duration::ZERO);
    }

    #[test]
    fn test_new_period_starts_fresh() {
        let fx = Fixture::new();
        let pattern = fx.pattern(PatternKey::new("x"), 2);

        for _ in 0..10 {
            pattern.attempt();
        }
        pattern.periodic_reset();

        assert_eq!(pattern.attempt(), LimitDecision::Allow);
        assert_eq!(pattern.attempt(), LimitDecision::Allow);
        assert_eq!(pattern.attempt(), LimitDecision::Suppress);
    }

    #[test]
    fn test_mark_delayed_past_reset_does_not_leak_into_next_period() {
        use std::thread;

        let fx = Fixture::new();
        let pattern = fx.pattern(PatternKey::new("x"), 3);
        pattern.attempt();
        pattern.attempt();

        // The third caller reaches the limit but waits on the lock while the period ends.
        let guard = pattern.lock.lock();
        let caller = {
            let pattern = Arc::clone(&pattern);
            thread::spawn(move || pattern.attempt())
        };
        while pattern.count() < 3 {
            thread::yield_now();
        }
        pattern.first_exceeded_at.swap(NOT_EXCEEDED, Ordering::AcqRel);
        pattern.count.swap(0, Ordering::AcqRel);
        drop(guard);

        assert_eq!(caller.join().unwrap(), LimitDecision::Allow);
        assert!(!pattern.is_limited());

        let decisions: Vec<_> = (0..3).map(|_| pattern.attempt()).collect();
        assert_eq!(decisions, vec![LimitDecision::Allow; 3]);
        assert_eq!(pattern.attempt(), LimitDecision::Suppress);

        let summary = pattern.periodic_reset().unwrap();
        assert_eq!(summary.suppressed, 1);
    }

    #[test]
    fn test_log_forwards_and_counts() {
        let fx = Fixture::new();
        let pattern = fx.pattern(PatternKey::new("saw {}"), 1);

        pattern.warn(&[&1]);
        pattern.warn(&[&2]);
        pattern.error(&[&3]);

        assert_eq!(fx.sink.messages(), vec!["saw 1".to_string()]);
        assert_eq!(fx.counter.get("warn_rate_limited_log_count"), 2);
        assert_eq!(fx.counter.get("error_rate_limited_log_count"), 1);
        assert_eq!(fx.context.metrics.events_allowed(), 1);
        assert_eq!(fx.context.metrics.events_suppressed(), 2);
    }

    #[test]
    fn test_emit_uses_bound_level() {
        let fx = Fixture::new();
        let bound = fx.pattern(PatternKey::with_level("a", Level::Debug), 10);
        let unbound = fx.pattern(PatternKey::new("b"), 10);

        bound.emit(&[]);
        unbound.emit(&[]);

        let levels: Vec<Level> = fx.sink.captured().iter().map(|c| c.level).collect();
        assert_eq!(levels, vec![Level::Debug, Level::Info]);
    }

    #[test]
    fn test_log_registers_with_registry() {
        let fx = Fixture::new();
        let pattern = fx.pattern(PatternKey::new("x"), 10);
        let period = pattern.rate().period();

        assert_eq!(fx.registry.member_count(period), 0);
        pattern.info(&[]);
        assert_eq!(fx.registry.member_count(period), 1);
    }

    #[test]
    fn test_equality_by_key() {
        let fx = Fixture::new();
        let a = fx.pattern(PatternKey::new("x"), 1);
        let b = fx.pattern(PatternKey::new("x"), 99);
        let c = fx.pattern(PatternKey::with_level("x", Level::Info), 1);

        assert_eq!(*a, *b);
        assert_ne!(*a, *c);
    }

    #[test]
    fn test_concurrent_attempts_allow_at_least_max() {
        use std::thread;

        let fx = Fixture::new();
        let pattern = fx.pattern(PatternKey::new("x"), 50);
        let mut handles = vec![];

        for _ in 0..10 {
            let pattern = Arc::clone(&pattern);
            handles.push(thread::spawn(move || {
                (0..100)
                    .filter(|_| pattern.attempt() == LimitDecision::Allow)
                    .count()
            }));
        }

        let allowed: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert!(allowed >= 50);
        assert_eq!(pattern.count(), 1000);

        let summary = pattern.periodic_reset().unwrap();
        assert_eq!(summary.suppressed, 950);
    }

    #[test]
    fn test_reset_failure_falls_back_when_sink_panics() {
        #[derive(Debug)]
        struct PanickingSink;
        impl LogSink for PanickingSink {
            fn log(&self, _level: Level, _message: &str) {
                panic!("sink down");
            }
        }

        let context = Arc::new(LogContext {
            sink: Arc::new(PanickingSink),
            stopwatch: Arc::new(MockStopwatch::new()),
            metrics: Metrics::new(),
            counter_metric: None,
        });
        let registry = Arc::new(Registry::new().unwrap());
        let rate = Arc::new(RateAndPeriod::new(1, Duration::from_secs(60)).unwrap());
        let pattern = RateLimitedPattern::new(PatternKey::new("x"), rate, context, &registry);

        // Must not propagate the sink's panic.
        pattern.report_reset_failure("boom");
    }
}
