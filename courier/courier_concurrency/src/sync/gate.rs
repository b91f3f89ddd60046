//! One-shot barrier.
//!
//! A [`Gate`] starts closed and can be opened exactly once. Every waiter,
//! past or future, is released by that single opening. Opening an already
//! open gate is a no-op that reports `false`, so a double release cannot
//! reset or corrupt the barrier.

use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// A single-fire barrier.
#[derive(Debug, Default)]
pub struct Gate {
    open: Mutex<bool>,
    cond: Condvar,
}

impl Gate {
    /// Create a closed gate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the gate, releasing all current and future waiters.
    ///
    /// Returns `true` if this call opened the gate.
    pub fn open(&self) -> bool {
        let mut open = self.open.lock();
        if *open {
            return false;
        }
        *open = true;
        self.cond.notify_all();
        true
    }

    /// Whether the gate has been opened.
    pub fn is_open(&self) -> bool {
        *self.open.lock()
    }

    /// Block until the gate opens.
    pub fn wait(&self) {
        let mut open = self.open.lock();
        while !*open {
            self.cond.wait(&mut open);
        }
    }

    /// Block until the gate opens or `timeout` elapses.
    ///
    /// Returns `true` if the gate is open. A timeout too large to represent
    /// as a deadline waits without limit.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            self.wait();
            return true;
        };
        let mut open = self.open.lock();
        while !*open {
            if self.cond.wait_until(&mut open, deadline).timed_out() {
                return *open;
            }
        }
        true
    }
}
