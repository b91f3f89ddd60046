//! Named one-shot timers owned by an actor.
//!
//! A timer never touches actor state directly. When it fires it enqueues
//! `[name, value]` into the owning actor's mailbox with the owner as sender,
//! so timer ticks are handled on the actor's thread like any other message.
//!
//! Firing and killing decide under the same lock: a timer that has been
//! killed, or replaced by a later `set`, never delivers.

use courier_core::Value;
use log::{debug, trace, warn};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use super::envelope::Envelope;
use super::mailbox::{Mailbox, MailboxError};
use crate::scheduler::{SchedulerError, TimerId, TimerScheduler};
use crate::sync::AtomicSequence;

/// Error when setting a timer
#[derive(Error, Debug)]
pub enum TimerError {
    /// The owning actor has terminated
    #[error("timers of {0} are closed")]
    Closed(String),

    /// The shared scheduler rejected the timer
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    generation: u64,
    scheduled: TimerId,
}

type Entries = Arc<Mutex<HashMap<String, Entry>>>;

/// The timers of one actor
pub struct TimerSet {
    owner: Mailbox,
    scheduler: TimerScheduler,
    entries: Entries,
    generations: AtomicSequence,
    closed: AtomicBool,
}

impl TimerSet {
    /// Create an empty timer set delivering into `owner`
    pub fn new(owner: Mailbox, scheduler: TimerScheduler) -> Self {
        Self {
            owner,
            scheduler,
            entries: Arc::new(Mutex::new(HashMap::new())),
            generations: AtomicSequence::default(),
            closed: AtomicBool::new(false),
        }
    }

    /// Arm `name` to deliver `[name, value]` after `delay`, replacing any
    /// timer already armed under that name.
    pub fn set(&self, name: &str, delay: Duration, value: impl Into<Value>) -> Result<(), TimerError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TimerError::Closed(self.owner.name().to_string()));
        }

        let generation = self.generations.next();
        let message = vec![Value::from(name), value.into()];
        let callback = {
            let entries = Arc::clone(&self.entries);
            let owner = self.owner.clone();
            let name = name.to_string();
            move || deliver(&entries, &owner, &name, generation, message)
        };

        // Held across scheduling so a zero delay cannot fire before the
        // entry is recorded.
        let mut entries = self.entries.lock();

        if let Some(previous) = entries.remove(name) {
            self.scheduler.cancel(previous.scheduled);
            trace!("Replaced timer {} of {}", name, self.owner.name());
        }

        let scheduled = self.scheduler.schedule(delay, callback)?;
        entries.insert(
            name.to_string(),
            Entry {
                generation,
                scheduled,
            },
        );

        debug!("Set timer {} of {} for {:?}", name, self.owner.name(), delay);
        Ok(())
    }

    /// Disarm `name`. Returns `false` if no such timer was armed.
    pub fn kill(&self, name: &str) -> bool {
        let removed = self.entries.lock().remove(name);

        match removed {
            Some(entry) => {
                self.scheduler.cancel(entry.scheduled);
                debug!("Killed timer {} of {}", name, self.owner.name());
                true
            }
            None => false,
        }
    }

    /// Disarm every timer. Returns how many were armed.
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<Entry> = self.entries.lock().drain().map(|(_, e)| e).collect();

        for entry in &drained {
            self.scheduler.cancel(entry.scheduled);
        }
        drained.len()
    }

    /// Disarm every timer and refuse new ones.
    pub fn close(&self) -> usize {
        self.closed.store(true, Ordering::Release);
        self.cancel_all()
    }

    /// Whether `name` is armed
    pub fn is_set(&self, name: &str) -> bool {
        self.entries.lock().contains_key(name)
    }

    /// Number of armed timers
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether no timers are armed
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

fn deliver(entries: &Entries, owner: &Mailbox, name: &str, generation: u64, message: Vec<Value>) {
    {
        let mut entries = entries.lock();
        match entries.get(name) {
            Some(entry) if entry.generation == generation => {
                entries.remove(name);
            }
            _ => return,
        }
    }

    match owner.try_send(Envelope::oneway(message, Some(owner.name().to_string()))) {
        Ok(()) => trace!("Timer {} fired for {}", name, owner.name()),
        Err(MailboxError::Full) => warn!(
            "Dropped timer {} of {}: mailbox full",
            name,
            owner.name()
        ),
        Err(MailboxError::Closed) => debug!(
            "Dropped timer {} of {}: mailbox closed",
            name,
            owner.name()
        ),
    }
}
