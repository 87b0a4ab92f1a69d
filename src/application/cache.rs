//! Cache of rate-limited patterns for one facade.
//!
//! Looks patterns up by template (and optional level) and creates them on
//! first use. Lookups borrow the caller's `&str`; nothing is allocated unless
//! the pattern is new.
//!
//! The cache holds at most `capacity` patterns. Going over that almost always
//! means interpolated messages are being passed as templates, so instead of
//! evicting, the cache warns, flushes the registry and starts over.

use crate::application::pattern::{LogContext, RateLimitedPattern};
use crate::application::registry::Registry;
use crate::domain::key::PatternKey;
use crate::domain::level::Level;
use crate::domain::rate::RateAndPeriod;
use crate::infrastructure::storage::ShardedStorage;
use parking_lot::Mutex;
use std::sync::Arc;

/// Default maximum number of distinct patterns per facade.
pub const DEFAULT_MAX_PATTERNS: usize = 1000;

/// Warning logged when the cache runs out of capacity.
pub const OVERFLOW_WARNING: &str =
    "out of capacity in rate-limited log pattern cache; accidentally using interpolated strings as patterns?";

/// One shelf for unbound keys plus one per level.
const SHELVES: usize = Level::ALL.len() + 1;

type Shelf = ShardedStorage<Arc<str>, Arc<RateLimitedPattern>>;

/// Pattern lookup and creation.
#[derive(Debug)]
pub struct PatternCache {
    shelves: [Shelf; SHELVES],
    overflow_lock: Mutex<()>,
    capacity: usize,
    rate: Arc<RateAndPeriod>,
    context: Arc<LogContext>,
    registry: Arc<Registry>,
}

impl PatternCache {
    pub(crate) fn new(
        rate: RateAndPeriod,
        capacity: usize,
        context: Arc<LogContext>,
        registry: Arc<Registry>,
    ) -> Self {
        Self {
            shelves: std::array::from_fn(|_| Shelf::new()),
            overflow_lock: Mutex::new(()),
            capacity,
            rate: Arc::new(rate),
            context,
            registry,
        }
    }

    /// Get the pattern for `template` and `level`, creating it if needed.
    ///
    /// Concurrent first calls for the same key all receive the same pattern.
    pub fn get(&self, template: &str, level: Option<Level>) -> Arc<RateLimitedPattern> {
        let shelf = &self.shelves[shelf_index(level)];

        if let Some(existing) = shelf.get(template) {
            return existing;
        }

        if self.len() > self.capacity {
            self.out_of_capacity();
        }

        let key = match level {
            Some(level) => PatternKey::with_level(template, level),
            None => PatternKey::new(template),
        };
        let candidate = Arc::new(RateLimitedPattern::new(
            key,
            Arc::clone(&self.rate),
            Arc::clone(&self.context),
            &self.registry,
        ));

        let (pattern, inserted) =
            shelf.insert_if_absent(Arc::clone(candidate.key().shared_template()), candidate);
        if inserted {
            self.registry.register(&pattern);
        }
        pattern
    }

    /// Warn, flush every pattern's pending summary and empty the cache.
    fn out_of_capacity(&self) {
        let _guard = self.overflow_lock.lock();

        // Another caller may have recovered while we waited.
        if self.len() <= self.capacity {
            return;
        }

        tracing::debug!(
            patterns = self.len(),
            capacity = self.capacity,
            "rate-limited log pattern cache overflowed"
        );
        self.context.sink.log(Level::Warn, OVERFLOW_WARNING);
        self.registry.flush();
        for shelf in &self.shelves {
            shelf.clear();
        }
        self.context.metrics.record_overflow();
    }

    /// Number of cached patterns.
    pub fn len(&self) -> usize {
        self.shelves.iter().map(Shelf::len).sum()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.shelves.iter().all(Shelf::is_empty)
    }

    /// Maximum number of patterns before the cache is reset.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The rate shared by every pattern in this cache.
    pub fn rate(&self) -> &RateAndPeriod {
        &self.rate
    }

    pub(crate) fn context(&self) -> &LogContext {
        &self.context
    }

    pub(crate) fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }
}

fn shelf_index(level: Option<Level>) -> usize {
    match level {
        None => 0,
        Some(level) => level as usize + 1,
    }
}
