//! Background scheduling of periodic resets.
//!
//! All recurring work runs on one dedicated thread driving a single-threaded
//! tokio runtime, so the scheduler works whether or not the host application
//! uses tokio itself.

use parking_lot::Mutex;
use std::io;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tokio::runtime::{Builder, Handle};
use tokio::sync::oneshot;
use tokio::task::JoinHandle as TaskHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Name of the scheduler thread.
pub const SCHEDULER_THREAD_NAME: &str = "rate-limited-log-registry";

/// Error returned when the reset scheduler cannot be started.
#[derive(Debug)]
pub enum SchedulerError {
    /// The tokio runtime could not be built
    Runtime(io::Error),
    /// The scheduler thread could not be spawned
    Thread(io::Error),
}

impl std::fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchedulerError::Runtime(e) => write!(f, "failed to build scheduler runtime: {}", e),
            SchedulerError::Thread(e) => write!(f, "failed to spawn scheduler thread: {}", e),
        }
    }
}

impl std::error::Error for SchedulerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SchedulerError::Runtime(e) | SchedulerError::Thread(e) => Some(e),
        }
    }
}

/// Runs fixed-delay jobs on a dedicated background thread.
#[derive(Debug)]
pub(crate) struct ResetScheduler {
    handle: Handle,
    shutdown_tx: Mutex<Option<oneshot::Sender<()>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl ResetScheduler {
    /// Start the scheduler thread.
    pub(crate) fn start() -> Result<Self, SchedulerError> {
        let runtime = Builder::new_current_thread()
            .enable_time()
            .build()
            .map_err(SchedulerError::Runtime)?;
        let handle = runtime.handle().clone();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let worker = thread::Builder::new()
            .name(SCHEDULER_THREAD_NAME.to_string())
            .spawn(move || {
                // Resolves on an explicit shutdown or when the sender is dropped.
                runtime.block_on(async {
                    let _ = shutdown_rx.await;
                });
                tracing::debug!("reset scheduler stopped");
            })
            .map_err(SchedulerError::Thread)?;

        Ok(Self {
            handle,
            shutdown_tx: Mutex::new(Some(shutdown_tx)),
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Run `job` every `period`, starting one period from now.
    ///
    /// Ticks missed while a job overruns are skipped rather than bunched up.
    pub(crate) fn schedule_every<F>(&self, period: Duration, mut job: F) -> TaskHandle<()>
    where
        F: FnMut() + Send + 'static,
    {
        self.handle.spawn(async move {
            let Some(start) = Instant::now().checked_add(period) else {
                // Period too long to ever elapse.
                return;
            };
            let mut ticker = interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                job();
            }
        })
    }

    /// Stop the scheduler thread, cancelling every scheduled job.
    ///
    /// Idempotent. Joins the thread unless called from the thread itself.
    pub(crate) fn shutdown(&self) {
        if let Some(tx) = self.shutdown_tx.lock().take() {
            let _ = tx.send(());
        }

        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            if worker.thread().id() == thread::current().id() {
                return;
            }
            if worker.join().is_err() {
                tracing::warn!("reset scheduler thread panicked");
            }
        }
    }

    #[cfg(test)]
    fn is_running(&self) -> bool {
        self.shutdown_tx.lock().is_some()
    }
}

impl Drop for ResetScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_job_runs_periodically() {
        let scheduler = ResetScheduler::start().unwrap();
        let runs = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&runs);
        scheduler.schedule_every(Duration::from_millis(20), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        std::thread::sleep(Duration::from_millis(110));
        let observed = runs.load(Ordering::SeqCst);
        assert!(observed >= 2, "expected at least 2 runs, got {}", observed);
    }

    #[test]
    fn test_first_run_waits_one_period() {
        let scheduler = ResetScheduler::start().unwrap();
        let runs = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&runs);
        scheduler.schedule_every(Duration::from_millis(300), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_shutdown_stops_jobs() {
        let scheduler = ResetScheduler::start().unwrap();
        let runs = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&runs);
        scheduler.schedule_every(Duration::from_millis(10), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        std::thread::sleep(Duration::from_millis(50));
        scheduler.shutdown();
        assert!(!scheduler.is_running());

        let after_shutdown = runs.load(Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(runs.load(Ordering::SeqCst), after_shutdown);
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let scheduler = ResetScheduler::start().unwrap();
        scheduler.shutdown();
        scheduler.shutdown();
    }

    #[test]
    fn test_aborted_job_stops() {
        let scheduler = ResetScheduler::start().unwrap();
        let runs = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&runs);
        let task = scheduler.schedule_every(Duration::from_millis(10), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        task.abort();

        std::thread::sleep(Duration::from_millis(60));
        assert!(runs.load(Ordering::SeqCst) <= 1);
    }

    #[test]
    fn test_error_display() {
        let err = SchedulerError::Thread(io::Error::new(io::ErrorKind::Other, "no threads"));
        assert_eq!(err.to_string(), "failed to spawn scheduler thread: no threads");
        assert!(std::error::Error::source(&err).is_some());
    }
}
