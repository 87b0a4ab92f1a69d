//! Central registry of rate-limited patterns.
//!
//! The registry groups patterns by period and runs one recurring reset job
//! per distinct period. Every facade created with the default configuration
//! shares the process-wide instance returned by [`Registry::global`].
//!
//! ## Flushing
//!
//! [`Registry::flush`] ends the current period of every registered pattern
//! immediately, emitting any pending suppression summaries, and empties the
//! registry. Patterns that are still in use rejoin on their next logging
//! call, so a flush never leaves a live pattern without periodic resets.

use crate::application::pattern::RateLimitedPattern;
use crate::application::scheduler::{ResetScheduler, SchedulerError};
use crate::infrastructure::storage::ShardedStorage;
use parking_lot::Mutex;
use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::task::JoinHandle;

type Members = ShardedStorage<u64, Arc<RateLimitedPattern>>;

static GLOBAL: OnceLock<Arc<Registry>> = OnceLock::new();

/// Patterns sharing one period, plus the job resetting them.
struct PeriodSlot {
    members: Arc<Members>,
    task: Option<JoinHandle<()>>,
}

/// Registry of patterns, grouped by period.
///
/// Membership is per pattern instance, not per [`PatternKey`](crate::PatternKey):
/// two facades logging the same template each get their own resets.
pub struct Registry {
    periods: Mutex<HashMap<Duration, PeriodSlot>>,
    /// Bumped on every flush; patterns registered under an older value rejoin.
    epoch: Arc<AtomicU64>,
    closed: AtomicBool,
    scheduler: ResetScheduler,
}

impl Registry {
    /// Create a standalone registry with its own scheduler thread.
    ///
    /// Most callers want [`Registry::global`]; a private registry is useful
    /// for isolating tests or components with their own lifecycle.
    pub fn new() -> Result<Self, SchedulerError> {
        Ok(Self {
            periods: Mutex::new(HashMap::new()),
            epoch: Arc::new(AtomicU64::new(0)),
            closed: AtomicBool::new(false),
            scheduler: ResetScheduler::start()?,
        })
    }

    /// The process-wide registry, created on first use.
    ///
    /// The global registry is never dropped; use [`crate::flush_on_exit`] to
    /// emit pending summaries when the program ends.
    pub fn global() -> Result<Arc<Registry>, SchedulerError> {
        if let Some(existing) = GLOBAL.get() {
            return Ok(Arc::clone(existing));
        }
        let fresh = Arc::new(Registry::new()?);
        // A losing initializer's registry is dropped here, stopping its thread.
        Ok(Arc::clone(GLOBAL.get_or_init(move || fresh)))
    }

    /// Add `pattern` to the set for its period, scheduling that period's
    /// reset job if it is the first one.
    ///
    /// Registering a pattern that is already a member is a no-op.
    pub fn register(&self, pattern: &Arc<RateLimitedPattern>) {
        let period = pattern.rate().period();
        let mut periods = self.periods.lock();
        let epoch = self.epoch.load(Ordering::Acquire);

        let slot = periods.entry(period).or_insert_with(|| {
            let members = Arc::new(Members::new());
            let task = if self.closed.load(Ordering::Acquire) {
                None
            } else {
                let job_members = Arc::clone(&members);
                tracing::debug!(?period, "scheduling rate-limited log resets");
                Some(
                    self.scheduler
                        .schedule_every(period, move || reset_all(&job_members.values())),
                )
            };
            PeriodSlot { members, task }
        });

        slot.members
            .insert_if_absent(pattern.id(), Arc::clone(pattern));
        pattern.mark_registered(epoch);
    }

    /// Reset every registered pattern now and empty the registry.
    ///
    /// Pending suppression summaries are emitted before this returns. Reset
    /// jobs stay scheduled and pick up patterns as they rejoin.
    pub fn flush(&self) {
        let drained: Vec<Arc<RateLimitedPattern>> = {
            let periods = self.periods.lock();
            self.epoch.fetch_add(1, Ordering::AcqRel);
            periods
                .values()
                .flat_map(|slot| slot.members.drain())
                .collect()
        };

        tracing::debug!(patterns = drained.len(), "flushing rate-limited log registry");
        reset_all(&drained);
    }

    /// Flush, then stop the scheduler thread.
    ///
    /// After shutdown, patterns still register but are only reset by
    /// explicit flushes. Idempotent.
    pub fn shutdown(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        self.flush();

        for slot in self.periods.lock().values_mut() {
            if let Some(task) = slot.task.take() {
                task.abort();
            }
        }
        self.scheduler.shutdown();
    }

    /// Returns a guard that flushes this registry when dropped.
    pub fn flush_on_drop(self: &Arc<Self>) -> FlushGuard {
        FlushGuard {
            registry: Arc::clone(self),
        }
    }

    /// Number of distinct periods with a reset job.
    pub fn period_count(&self) -> usize {
        self.periods.lock().len()
    }

    /// Number of patterns registered for `period`.
    pub fn member_count(&self, period: Duration) -> usize {
        self.periods
            .lock()
            .get(&period)
            .map_or(0, |slot| slot.members.len())
    }

    /// Number of flushes performed so far.
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }

    /// Whether [`shutdown`](Self::shutdown) has been called.
    pub fn is_shut_down(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub(crate) fn epoch_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.epoch)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("periods", &self.period_count())
            .field("epoch", &self.epoch())
            .field("closed", &self.is_shut_down())
            .finish()
    }
}

impl Drop for Registry {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Flushes a registry when dropped.
///
/// Hold one in `main` so pending summaries are emitted on the way out:
///
/// ```rust,no_run
/// fn main() {
///     let _flush = rate_limited_log::flush_on_exit().unwrap();
///     // ... application code ...
/// }
/// ```
#[must_use = "the registry is flushed when the guard is dropped"]
#[derive(Debug)]
pub struct FlushGuard {
    registry: Arc<Registry>,
}

impl Drop for FlushGuard {
    fn drop(&mut self) {
        self.registry.flush();
    }
}

/// Reset each pattern, isolating panics so one failure cannot stop the rest.
fn reset_all(patterns: &[Arc<RateLimitedPattern>]) {
    for pattern in patterns {
        let result = panic::catch_unwind(AssertUnwindSafe(|| pattern.periodic_reset()));
        if let Err(payload) = result {
            pattern.report_reset_failure(&panic_reason(payload.as_ref()));
        }
    }
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
