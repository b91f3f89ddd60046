//! One-shot timer scheduling.
//!
//! A single named thread keeps a deadline-ordered queue of pending callbacks
//! and runs each one when its deadline passes. Callbacks must be short and
//! non-blocking: a slow callback delays every other timer in the process.
//!
//! A delay too large to represent as a deadline never fires, but its
//! callback is held until cancelled or the scheduler shuts down.

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use log::{debug, error, info, trace};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::sync::AtomicSequence;

/// Identifier of a scheduled callback.
pub type TimerId = u64;

type Callback = Box<dyn FnOnce() + Send + 'static>;

/// Error when scheduling a callback
#[derive(Error, Debug)]
pub enum SchedulerError {
    /// The scheduler has been shut down
    #[error("timer scheduler is shut down")]
    ShutDown,

    /// The scheduling thread could not be spawned
    #[error("failed to spawn scheduler thread: {0}")]
    SpawnFailed(String),
}

/// Configuration for the timer scheduler
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Name of the scheduling thread
    pub thread_name: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            thread_name: "courier-timers".to_string(),
        }
    }
}

/// Counters describing scheduler activity
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Callbacks accepted for scheduling
    pub scheduled: usize,

    /// Callbacks that ran
    pub fired: usize,

    /// Cancellation requests received
    pub cancelled: usize,

    /// Callbacks that panicked
    pub panicked: usize,

    /// Callbacks currently waiting to fire
    pub pending: usize,
}

enum Command {
    Schedule {
        id: TimerId,
        deadline: Option<Instant>,
        callback: Callback,
    },
    Cancel(TimerId),
    Shutdown,
}

#[derive(Default)]
struct Counters {
    scheduled: AtomicUsize,
    fired: AtomicUsize,
    cancelled: AtomicUsize,
    panicked: AtomicUsize,
    pending: AtomicUsize,
}

struct Inner {
    commands: Sender<Command>,
    ids: AtomicSequence,
    counters: Arc<Counters>,
    is_shut_down: AtomicBool,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        // The worker exits once the command channel disconnects.
        let _ = self.commands.send(Command::Shutdown);
    }
}

/// Handle to the shared scheduling thread. Cheap to clone.
#[derive(Clone)]
pub struct TimerScheduler {
    inner: Arc<Inner>,
}

impl TimerScheduler {
    /// Start a scheduler with the default configuration.
    pub fn new() -> Result<Self, SchedulerError> {
        Self::with_config(SchedulerConfig::default())
    }

    /// Start a scheduler with the specified configuration.
    pub fn with_config(config: SchedulerConfig) -> Result<Self, SchedulerError> {
        let (commands, receiver) = unbounded();
        let counters = Arc::new(Counters::default());

        let worker_counters = Arc::clone(&counters);
        let worker = thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || Self::worker_loop(receiver, worker_counters))
            .map_err(|e| SchedulerError::SpawnFailed(e.to_string()))?;

        info!("Started timer scheduler thread '{}'", config.thread_name);

        Ok(Self {
            inner: Arc::new(Inner {
                commands,
                ids: AtomicSequence::default(),
                counters,
                is_shut_down: AtomicBool::new(false),
                worker: Mutex::new(Some(worker)),
            }),
        })
    }

    fn worker_loop(receiver: Receiver<Command>, counters: Arc<Counters>) {
        let mut queue = TimerQueue::default();

        loop {
            let command = match queue.next_deadline() {
                Some(deadline) => match receiver.recv_deadline(deadline) {
                    Ok(command) => Some(command),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => break,
                },
                None => match receiver.recv() {
                    Ok(command) => Some(command),
                    Err(_) => break,
                },
            };

            match command {
                Some(Command::Schedule {
                    id,
                    deadline,
                    callback,
                }) => queue.insert(id, deadline, callback),
                Some(Command::Cancel(id)) => {
                    if queue.remove(id) {
                        trace!("Cancelled timer {}", id);
                    }
                }
                Some(Command::Shutdown) => break,
                None => {}
            }

            let now = Instant::now();
            while let Some((id, callback)) = queue.pop_due(now) {
                trace!("Firing timer {}", id);
                let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(callback));
                counters.fired.fetch_add(1, Ordering::Relaxed);

                if let Err(e) = result {
                    counters.panicked.fetch_add(1, Ordering::Relaxed);
                    error!(
                        "Timer {} callback panicked: {:?}",
                        id,
                        e.downcast_ref::<&str>().unwrap_or(&"<unknown panic>")
                    );
                }
            }

            counters.pending.store(queue.len(), Ordering::Relaxed);
        }

        counters.pending.store(0, Ordering::Relaxed);
        debug!(
            "Timer scheduler exiting with {} pending callbacks discarded",
            queue.len()
        );
    }

    /// Run `callback` on the scheduling thread once `delay` has elapsed.
    pub fn schedule<F>(&self, delay: Duration, callback: F) -> Result<TimerId, SchedulerError>
    where
        F: FnOnce() + Send + 'static,
    {
        if self.inner.is_shut_down.load(Ordering::Acquire) {
            return Err(SchedulerError::ShutDown);
        }

        let id = self.inner.ids.next();
        let deadline = Instant::now().checked_add(delay);
        if deadline.is_none() {
            debug!("Timer {} delay {:?} is unbounded, it will never fire", id, delay);
        }
        let command = Command::Schedule {
            id,
            deadline,
            callback: Box::new(callback),
        };

        self.inner
            .commands
            .send(command)
            .map_err(|_| SchedulerError::ShutDown)?;
        self.inner.counters.scheduled.fetch_add(1, Ordering::Relaxed);

        trace!("Scheduled timer {} in {:?}", id, delay);
        Ok(id)
    }

    /// Cancel a scheduled callback. Unknown or already fired ids are ignored.
    pub fn cancel(&self, id: TimerId) {
        if self.inner.commands.send(Command::Cancel(id)).is_ok() {
            self.inner.counters.cancelled.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Snapshot of the activity counters.
    pub fn stats(&self) -> SchedulerStats {
        let counters = &self.inner.counters;
        SchedulerStats {
            scheduled: counters.scheduled.load(Ordering::Relaxed),
            fired: counters.fired.load(Ordering::Relaxed),
            cancelled: counters.cancelled.load(Ordering::Relaxed),
            panicked: counters.panicked.load(Ordering::Relaxed),
            pending: counters.pending.load(Ordering::Relaxed),
        }
    }

    /// Whether [`TimerScheduler::shutdown`] has been called.
    pub fn is_shut_down(&self) -> bool {
        self.inner.is_shut_down.load(Ordering::Acquire)
    }

    /// Stop the scheduling thread and wait for it to exit.
    ///
    /// Pending callbacks are discarded. Calling this from a timer callback
    /// does not wait, since the scheduling thread cannot join itself.
    pub fn shutdown(&self) {
        if self.inner.is_shut_down.swap(true, Ordering::AcqRel) {
            return;
        }

        info!("Shutting down timer scheduler");
        let _ = self.inner.commands.send(Command::Shutdown);

        let worker = self.inner.worker.lock().take();
        if let Some(worker) = worker {
            if worker.thread().id() == thread::current().id() {
                return;
            }
            if worker.join().is_err() {
                error!("Timer scheduler thread panicked during shutdown");
            }
        }
    }
}

/// Pending callbacks ordered by deadline, indexed by id so cancellation
/// removes the entry outright.
#[derive(Default)]
struct TimerQueue {
    armed: BTreeMap<(Instant, TimerId), Callback>,
    dormant: HashMap<TimerId, Callback>,
    deadlines: HashMap<TimerId, Instant>,
}

impl TimerQueue {
    fn insert(&mut self, id: TimerId, deadline: Option<Instant>, callback: Callback) {
        match deadline {
            Some(deadline) => {
                self.deadlines.insert(id, deadline);
                self.armed.insert((deadline, id), callback);
            }
            None => {
                self.dormant.insert(id, callback);
            }
        }
    }

    fn remove(&mut self, id: TimerId) -> bool {
        match self.deadlines.remove(&id) {
            Some(deadline) => self.armed.remove(&(deadline, id)).is_some(),
            None => self.dormant.remove(&id).is_some(),
        }
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.armed.keys().next().map(|(deadline, _)| *deadline)
    }

    fn pop_due(&mut self, now: Instant) -> Option<(TimerId, Callback)> {
        let entry = self.armed.first_entry()?;
        if entry.key().0 > now {
            return None;
        }
        let ((_, id), callback) = entry.remove_entry();
        self.deadlines.remove(&id);
        Some((id, callback))
    }

    fn len(&self) -> usize {
        self.armed.len() + self.dormant.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;

    #[test]
    fn test_callback_fires_after_delay() {
        let scheduler = TimerScheduler::new().unwrap();
        let (tx, rx) = bounded(1);
        let start = Instant::now();

        scheduler
            .schedule(Duration::from_millis(30), move || {
                let _ = tx.send(Instant::now());
            })
            .unwrap();

        let fired_at = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert!(fired_at.duration_since(start) >= Duration::from_millis(30));
        scheduler.shutdown();
    }

    #[test]
    fn test_callbacks_fire_in_deadline_order() {
        let scheduler = TimerScheduler::new().unwrap();
        let (tx, rx) = unbounded();

        for (delay, label) in [(60, "late"), (10, "early"), (30, "middle")] {
            let tx = tx.clone();
            scheduler
                .schedule(Duration::from_millis(delay), move || {
                    let _ = tx.send(label);
                })
                .unwrap();
        }

        let order: Vec<_> = (0..3)
            .map(|_| rx.recv_timeout(Duration::from_secs(2)).unwrap())
            .collect();
        assert_eq!(order, vec!["early", "middle", "late"]);
    }

    #[test]
    fn test_cancelled_callback_never_fires() {
        let scheduler = TimerScheduler::new().unwrap();
        let (tx, rx) = bounded::<()>(1);

        let id = scheduler
            .schedule(Duration::from_millis(20), move || {
                let _ = tx.send(());
            })
            .unwrap();
        scheduler.cancel(id);

        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
        assert_eq!(scheduler.stats().fired, 0);
        assert_eq!(scheduler.stats().cancelled, 1);
    }

    #[test]
    fn test_panicking_callback_does_not_stop_scheduler() {
        let scheduler = TimerScheduler::new().unwrap();
        let (tx, rx) = bounded(1);

        scheduler
            .schedule(Duration::from_millis(1), || panic!("timer boom"))
            .unwrap();
        scheduler
            .schedule(Duration::from_millis(20), move || {
                let _ = tx.send(());
            })
            .unwrap();

        rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(scheduler.stats().panicked, 1);
    }

    fn wait_for_pending(scheduler: &TimerScheduler, expected: usize) {
        let deadline = Instant::now() + Duration::from_secs(2);
        while scheduler.stats().pending != expected {
            assert!(Instant::now() < deadline, "pending never reached {}", expected);
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_unrepresentable_delay_never_fires_and_cancels() {
        let scheduler = TimerScheduler::new().unwrap();
        let (tx, rx) = bounded::<()>(1);

        let id = scheduler
            .schedule(Duration::MAX, move || {
                let _ = tx.send(());
            })
            .unwrap();
        wait_for_pending(&scheduler, 1);
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());

        scheduler.cancel(id);
        wait_for_pending(&scheduler, 0);
        // The dropped callback disconnects the channel.
        assert!(matches!(
            rx.recv_timeout(Duration::from_secs(1)),
            Err(RecvTimeoutError::Disconnected)
        ));
        assert_eq!(scheduler.stats().fired, 0);
    }

    #[test]
    fn test_rearmed_timers_do_not_accumulate() {
        let scheduler = TimerScheduler::new().unwrap();

        let mut id = scheduler.schedule(Duration::from_secs(3600), || {}).unwrap();
        for _ in 0..500 {
            scheduler.cancel(id);
            id = scheduler.schedule(Duration::from_secs(3600), || {}).unwrap();
        }

        // Commands are handled in order, so once this fires every cancel has run.
        let (tx, rx) = bounded(1);
        scheduler
            .schedule(Duration::ZERO, move || {
                let _ = tx.send(());
            })
            .unwrap();
        rx.recv_timeout(Duration::from_secs(2)).unwrap();

        wait_for_pending(&scheduler, 1);
        scheduler.cancel(id);
        wait_for_pending(&scheduler, 0);
    }

    #[test]
    fn test_schedule_after_shutdown_fails() {
        let scheduler = TimerScheduler::new().unwrap();
        scheduler.shutdown();
        assert!(scheduler.is_shut_down());

        let result = scheduler.schedule(Duration::from_millis(1), || {});
        assert!(matches!(result, Err(SchedulerError::ShutDown)));
    }
}
