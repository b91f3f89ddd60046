//! Actor lifecycle state shared between the handle and the actor thread.

use courier_core::log_event;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::sync::Gate;

/// Where an actor is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActorState {
    /// Constructed and registered, thread not started
    New,
    /// Running the `initialize` hook
    Initializing,
    /// Ready, blocked on the startup barrier
    AwaitingSync,
    /// Processing messages
    Running,
    /// Running the `shutdown` hook
    Stopping,
    /// Finished; unregistered with all timers cancelled
    Terminated,
}

impl ActorState {
    /// Whether the actor has finished
    pub fn is_terminal(self) -> bool {
        self == ActorState::Terminated
    }
}

impl fmt::Display for ActorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActorState::New => "new",
            ActorState::Initializing => "initializing",
            ActorState::AwaitingSync => "awaiting-sync",
            ActorState::Running => "running",
            ActorState::Stopping => "stopping",
            ActorState::Terminated => "terminated",
        };
        write!(f, "{}", name)
    }
}

pub(crate) struct Lifecycle {
    name: String,
    state: Mutex<ActorState>,
    pub(crate) ready: Gate,
    pub(crate) sync: Gate,
    launched: AtomicBool,
    aborted: AtomicBool,
    init_error: Mutex<Option<String>>,
}

impl Lifecycle {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(ActorState::New),
            ready: Gate::new(),
            sync: Gate::new(),
            launched: AtomicBool::new(false),
            aborted: AtomicBool::new(false),
            init_error: Mutex::new(None),
        }
    }

    pub(crate) fn state(&self) -> ActorState {
        *self.state.lock()
    }

    /// Move to `to`. Terminated is absorbing. Returns the previous state.
    pub(crate) fn transition(&self, to: ActorState) -> ActorState {
        let mut state = self.state.lock();
        let from = *state;

        if from.is_terminal() || from == to {
            return from;
        }

        *state = to;
        drop(state);

        log_event!(self.name, from => to);
        from
    }

    pub(crate) fn mark_launched(&self) {
        self.launched.store(true, Ordering::Release);
    }

    pub(crate) fn was_launched(&self) -> bool {
        self.launched.load(Ordering::Acquire)
    }

    pub(crate) fn abort(&self) {
        self.aborted.store(true, Ordering::Release);
    }

    pub(crate) fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::Acquire)
    }

    pub(crate) fn fail_initialization(&self, fault: String) {
        *self.init_error.lock() = Some(fault);
    }

    pub(crate) fn init_error(&self) -> Option<String> {
        self.init_error.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions_and_terminal_state() {
        let lifecycle = Lifecycle::new("t");
        assert_eq!(lifecycle.state(), ActorState::New);

        assert_eq!(lifecycle.transition(ActorState::Initializing), ActorState::New);
        assert_eq!(lifecycle.transition(ActorState::Terminated), ActorState::Initializing);

        lifecycle.transition(ActorState::Running);
        assert_eq!(lifecycle.state(), ActorState::Terminated);
    }

    #[test]
    fn test_init_error_recorded() {
        let lifecycle = Lifecycle::new("t");
        assert_eq!(lifecycle.init_error(), None);
        lifecycle.fail_initialization("boom".into());
        assert_eq!(lifecycle.init_error().as_deref(), Some("boom"));
    }

    #[test]
    fn test_state_display() {
        assert_eq!(ActorState::AwaitingSync.to_string(), "awaiting-sync");
        assert!(ActorState::Terminated.is_terminal());
        assert!(!ActorState::Stopping.is_terminal());
    }
}
