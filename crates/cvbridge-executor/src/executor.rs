//! Work queue, pump loop and blocking submission

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread::{self, ThreadId};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use tracing::{debug, error, info, warn};

use crate::config::ExecutorConfig;
use crate::error::ExecutorError;

/// A deferred call relayed to the pinned thread
type Job = Box<dyn FnOnce() + Send + 'static>;

/// Outcome of a work item as seen by its submitter
type Outcome<R> = thread::Result<R>;

/// State shared between the submitting side and the pump
struct Shared {
    config: ExecutorConfig,
    /// Set once, by the first thread that enters the pump
    pinned: OnceLock<ThreadId>,
    /// True while `Pump::drive` is looping
    running: AtomicBool,
    submitted: AtomicU64,
    completed: AtomicU64,
    panicked: AtomicU64,
}

/// Counters describing executor activity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutorStats {
    /// Work items accepted by `run`
    pub submitted: u64,
    /// Work items that returned normally
    pub completed: u64,
    /// Work items that panicked
    pub panicked: u64,
    /// Work items waiting in the queue
    pub queued: usize,
}

/// Submitting side of the executor.
///
/// Cheap to clone; every clone feeds the same queue. The pump loop ends once
/// all clones have been dropped.
#[derive(Clone)]
pub struct Executor {
    queue: Sender<Job>,
    shared: Arc<Shared>,
}

/// Consuming side of the executor.
///
/// Exactly one exists per executor. The thread that first enters it becomes
/// the pinned thread for the lifetime of the executor.
pub struct Pump {
    queue: Receiver<Job>,
    shared: Arc<Shared>,
}

impl Executor {
    /// Create an executor and its pump.
    ///
    /// Nothing runs until some thread calls [`Pump::drive`] or [`Pump::poll`].
    pub fn new(config: ExecutorConfig) -> (Executor, Pump) {
        let (tx, rx) = match config.queue_capacity {
            Some(capacity) => crossbeam_channel::bounded(capacity),
            None => crossbeam_channel::unbounded(),
        };

        let shared = Arc::new(Shared {
            config,
            pinned: OnceLock::new(),
            running: AtomicBool::new(false),
            submitted: AtomicU64::new(0),
            completed: AtomicU64::new(0),
            panicked: AtomicU64::new(0),
        });

        (
            Executor {
                queue: tx,
                shared: Arc::clone(&shared),
            },
            Pump { queue: rx, shared },
        )
    }

    /// Run `work` on the pinned thread and wait for its result.
    ///
    /// Items run one at a time in the order the pump dequeues them. A panic
    /// inside `work` is caught on the pinned thread and returned as
    /// [`ExecutorError::Panicked`]; the pump keeps serving.
    ///
    /// Called from the pinned thread itself, `work` runs inline.
    ///
    /// Blocks indefinitely if no thread ever drives the pump.
    pub fn run<F, R>(&self, work: F) -> Result<R, ExecutorError>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        self.shared.submitted.fetch_add(1, Ordering::Relaxed);

        if self.is_pinned_thread() {
            return self.shared.finish(panic::catch_unwind(AssertUnwindSafe(work)));
        }

        let (done_tx, done_rx) = crossbeam_channel::bounded::<Outcome<R>>(1);
        let job: Job = Box::new(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(work));
            // The receiver only goes away if the submitter itself unwound.
            let _ = done_tx.send(outcome);
        });

        self.queue.send(job).map_err(|_| ExecutorError::Stopped)?;
        let outcome = self.wait(&done_rx)?;
        self.shared.finish(outcome)
    }

    /// True when called from the pinned thread
    pub fn is_pinned_thread(&self) -> bool {
        self.shared.pinned.get() == Some(&thread::current().id())
    }

    /// The pinned thread, once some thread has entered the pump
    pub fn pinned_thread(&self) -> Option<ThreadId> {
        self.shared.pinned.get().copied()
    }

    /// True while a thread is inside [`Pump::drive`]
    pub fn is_pump_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Snapshot of the activity counters
    pub fn stats(&self) -> ExecutorStats {
        ExecutorStats {
            submitted: self.shared.submitted.load(Ordering::Relaxed),
            completed: self.shared.completed.load(Ordering::Relaxed),
            panicked: self.shared.panicked.load(Ordering::Relaxed),
            queued: self.queue.len(),
        }
    }

    /// Label from the configuration
    pub fn name(&self) -> &str {
        &self.shared.config.name
    }

    fn wait<R>(&self, done: &Receiver<Outcome<R>>) -> Result<Outcome<R>, ExecutorError> {
        if let Some(limit) = self.shared.config.stall_warning() {
            match done.recv_timeout(limit) {
                Ok(outcome) => return Ok(outcome),
                Err(RecvTimeoutError::Disconnected) => return Err(ExecutorError::Stopped),
                Err(RecvTimeoutError::Timeout) => {
                    if self.shared.pinned.get().is_none() {
                        warn!(
                            executor = %self.shared.config.name,
                            waited_ms = limit.as_millis() as u64,
                            "no thread has entered the pump; caller blocks until Pump::drive is called"
                        );
                    } else {
                        warn!(
                            executor = %self.shared.config.name,
                            waited_ms = limit.as_millis() as u64,
                            queued = self.queue.len(),
                            "work item has not completed; the pinned thread may be hung or not polling"
                        );
                    }
                }
            }
        }

        done.recv().map_err(|_| ExecutorError::Stopped)
    }
}

impl fmt::Debug for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor")
            .field("name", &self.shared.config.name)
            .field("pinned", &self.shared.pinned.get())
            .field("stats", &self.stats())
            .finish()
    }
}

impl Shared {
    fn finish<R>(&self, outcome: Outcome<R>) -> Result<R, ExecutorError> {
        match outcome {
            Ok(value) => {
                self.completed.fetch_add(1, Ordering::Relaxed);
                Ok(value)
            }
            Err(payload) => {
                self.panicked.fetch_add(1, Ordering::Relaxed);
                let message = panic_message(payload.as_ref());
                error!(executor = %self.config.name, %message, "work item panicked");
                Err(ExecutorError::Panicked { message })
            }
        }
    }
}

impl Pump {
    /// Become the pinned thread and execute work items until every
    /// [`Executor`] clone has been dropped.
    ///
    /// In a long-lived process this is the program's main loop and does not
    /// return.
    pub fn drive(self) -> Result<(), ExecutorError> {
        self.pin()?;

        self.shared.running.store(true, Ordering::Release);
        info!(executor = %self.shared.config.name, "pump started");

        for job in self.queue.iter() {
            job();
        }

        self.shared.running.store(false, Ordering::Release);
        info!(executor = %self.shared.config.name, "pump stopped, all executors dropped");
        Ok(())
    }

    /// Execute every work item currently queued without blocking.
    ///
    /// For hosts that own their event loop and call this from it. Returns
    /// the number of items executed.
    pub fn poll(&self) -> Result<usize, ExecutorError> {
        self.pin()?;

        let mut drained = 0;
        while let Ok(job) = self.queue.try_recv() {
            job();
            drained += 1;
        }
        if drained > 0 {
            debug!(executor = %self.shared.config.name, drained, "pump polled");
        }
        Ok(drained)
    }

    /// Work items waiting in the queue
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    fn pin(&self) -> Result<(), ExecutorError> {
        let current = thread::current();

        if self.shared.config.require_main_thread && current.name() != Some("main") {
            return Err(ExecutorError::NotMainThread {
                thread: current.name().unwrap_or("<unnamed>").to_string(),
            });
        }

        let pinned = *self.shared.pinned.get_or_init(|| current.id());
        if pinned != current.id() {
            return Err(ExecutorError::WrongThread);
        }
        Ok(())
    }
}

impl fmt::Debug for Pump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pump")
            .field("name", &self.shared.config.name)
            .field("pending", &self.queue.len())
            .finish()
    }
}

/// Best-effort text of a panic payload
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_config() -> ExecutorConfig {
        ExecutorConfig {
            stall_warning_ms: 0,
            ..Default::default()
        }
    }

    #[test]
    fn test_poll_drains_queue_on_current_thread() {
        let (executor, pump) = Executor::new(quiet_config());
        let caller = {
            let executor = executor.clone();
            thread::spawn(move || executor.run(|| thread::current().id()).unwrap())
        };

        // Spin until the item is queued, then drain it here.
        while pump.pending() == 0 {
            thread::yield_now();
        }
        assert_eq!(pump.poll().unwrap(), 1);

        let ran_on = caller.join().unwrap();
        assert_eq!(ran_on, thread::current().id());
        assert_eq!(executor.pinned_thread(), Some(thread::current().id()));
    }

    #[test]
    fn test_poll_from_other_thread_is_rejected() {
        let (_executor, pump) = Executor::new(quiet_config());
        assert_eq!(pump.poll().unwrap(), 0);

        let pump = Arc::new(pump);
        let other = {
            let pump = Arc::clone(&pump);
            thread::spawn(move || pump.poll())
        };
        assert_eq!(other.join().unwrap(), Err(ExecutorError::WrongThread));
    }

    #[test]
    fn test_require_main_thread() {
        let config = ExecutorConfig {
            require_main_thread: true,
            ..quiet_config()
        };
        let (_executor, pump) = Executor::new(config);

        let result = thread::Builder::new()
            .name("worker".to_string())
            .spawn(move || pump.drive())
            .unwrap()
            .join()
            .unwrap();
        assert_eq!(
            result,
            Err(ExecutorError::NotMainThread {
                thread: "worker".to_string()
            })
        );
    }

    #[test]
    fn test_run_after_pump_dropped_is_stopped() {
        let (executor, pump) = Executor::new(quiet_config());
        drop(pump);
        assert_eq!(executor.run(|| 1), Err(ExecutorError::Stopped));
    }

    #[test]
    fn test_drive_returns_when_executors_dropped() {
        let (executor, pump) = Executor::new(quiet_config());
        let driver = thread::spawn(move || pump.drive());

        assert_eq!(executor.run(|| "done").unwrap(), "done");
        drop(executor);

        assert_eq!(driver.join().unwrap(), Ok(()));
    }

    #[test]
    fn test_stats_count_outcomes() {
        let (executor, pump) = Executor::new(quiet_config());
        let driver = thread::spawn(move || pump.drive());

        executor.run(|| ()).unwrap();
        executor.run(|| ()).unwrap();
        let _ = executor.run(|| panic!("boom"));

        let stats = executor.stats();
        assert_eq!(stats.submitted, 3);
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.panicked, 1);
        assert_eq!(stats.queued, 0);

        drop(executor);
        driver.join().unwrap().unwrap();
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("static str");
        assert_eq!(panic_message(payload.as_ref()), "static str");

        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");

        let payload: Box<dyn Any + Send> = Box::new(7u32);
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }
}
