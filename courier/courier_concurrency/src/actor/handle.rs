//! The supervisor-facing handle to an actor.

use courier_core::{ActorError, Message, Store, Value};
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::config::{ActorConfig, AppRef};
use super::context::ActorContext;
use super::envelope::Envelope;
use super::handler::Handler;
use super::mailbox::{Mailbox, MailboxError, MailboxReceiver, ReceivePolicy};
use super::registry::Registry;
use super::router::Router;
use super::runner::Runner;
use super::state::{ActorState, Lifecycle};
use super::timers::{TimerError, TimerSet};
use crate::scheduler::TimerScheduler;

// Everything the thread takes ownership of at start.
struct Pending {
    handler: Box<dyn Handler>,
    receiver: MailboxReceiver,
    parent: Option<String>,
    app: Option<AppRef>,
    policy: ReceivePolicy,
    stores: HashMap<String, Store>,
}

/// Handle owned by an actor's supervisor.
///
/// Constructing an actor registers it immediately, so it can receive
/// messages before it starts. They queue until the startup barrier is
/// released with [`Actor::signal_sync`].
pub struct Actor {
    name: String,
    lifecycle: Arc<Lifecycle>,
    mailbox: Mailbox,
    timers: Arc<TimerSet>,
    router: Router,
    pending: Mutex<Option<Pending>>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl Actor {
    pub(crate) fn new(
        config: ActorConfig,
        handler: Box<dyn Handler>,
        router: Router,
        scheduler: TimerScheduler,
    ) -> Result<Self, ActorError> {
        let ActorConfig {
            name,
            parent,
            mailbox: mailbox_config,
            app,
        } = config;

        let (mailbox, receiver) = Mailbox::new(mailbox_config.capacity, name.as_str());

        router
            .registry()
            .register(mailbox.clone())
            .map_err(|_| ActorError::DuplicateRegistration(name.clone()))?;

        debug!(
            "Created actor {} (parent: {:?}, mailbox capacity: {})",
            name, parent, mailbox_config.capacity
        );

        let timers = Arc::new(TimerSet::new(mailbox.clone(), scheduler));

        Ok(Self {
            lifecycle: Arc::new(Lifecycle::new(name.as_str())),
            pending: Mutex::new(Some(Pending {
                handler,
                receiver,
                parent,
                app,
                policy: ReceivePolicy::from(&mailbox_config),
                stores: HashMap::new(),
            })),
            thread: Mutex::new(None),
            name,
            mailbox,
            timers,
            router,
        })
    }

    /// The actor's registry name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current lifecycle state
    pub fn state(&self) -> ActorState {
        self.lifecycle.state()
    }

    /// Sending handle to the actor's mailbox
    pub fn mailbox(&self) -> &Mailbox {
        &self.mailbox
    }

    /// Register named structured data. Only allowed before [`Actor::start`].
    pub fn add_store(&self, name: impl Into<String>, store: Store) -> Result<(), ActorError> {
        let mut pending = self.pending.lock();

        match pending.as_mut() {
            Some(pending) => {
                let name = name.into();
                debug!("Added store {} to actor {}", name, self.name);
                pending.stores.insert(name, store);
                Ok(())
            }
            None => Err(self.unavailable()),
        }
    }

    /// Launch the actor thread. The thread runs `initialize` and then waits
    /// for [`Actor::signal_sync`].
    pub fn start(&self) -> Result<(), ActorError> {
        // Held until the handle is stored, so a concurrent `join` cannot miss it.
        let mut thread_slot = self.thread.lock();
        let pending = self.pending.lock().take().ok_or_else(|| self.unavailable())?;
        let registry = Arc::clone(self.router.registry());

        let ctx = ActorContext::new(
            self.name.clone(),
            pending.parent,
            pending.app,
            self.router.clone(),
            self.mailbox.clone(),
            Arc::clone(&self.timers),
            pending.stores,
        );

        let runner = Runner {
            lifecycle: Arc::clone(&self.lifecycle),
            handler: pending.handler,
            ctx,
            receiver: pending.receiver,
            policy: pending.policy,
            registry: Arc::clone(&registry),
            mailbox_id: self.mailbox.id(),
            timers: Arc::clone(&self.timers),
        };

        let spawned = thread::Builder::new()
            .name(self.name.clone())
            .spawn(move || runner.run());

        match spawned {
            Ok(handle) => {
                self.lifecycle.mark_launched();
                *thread_slot = Some(handle);
                info!("Started actor {}", self.name);
                Ok(())
            }
            Err(e) => {
                error!("Failed to spawn thread for actor {}: {}", self.name, e);
                self.terminate_unstarted(&registry);
                Err(ActorError::SpawnFailed(self.name.clone(), e.to_string()))
            }
        }
    }

    /// Block until `initialize` has completed.
    ///
    /// # Errors
    ///
    /// `NotStarted` before [`Actor::start`], `InitializationFailed` if the
    /// hook failed, `Terminated` if the actor was stopped before starting.
    pub fn wait_ready(&self) -> Result<(), ActorError> {
        self.check_waitable()?;
        self.lifecycle.ready.wait();
        self.ready_outcome()
    }

    /// Like [`Actor::wait_ready`], giving up after `timeout`.
    pub fn wait_ready_timeout(&self, timeout: Duration) -> Result<(), ActorError> {
        self.check_waitable()?;
        if !self.lifecycle.ready.wait_timeout(timeout) {
            return Err(ActorError::ReadyTimeout(self.name.clone(), timeout));
        }
        self.ready_outcome()
    }

    /// Release the startup barrier. Calling this more than once is a no-op.
    pub fn signal_sync(&self) {
        if !self.lifecycle.sync.open() {
            debug!("Sync already signalled for actor {}", self.name);
        }
    }

    /// Stop the actor.
    ///
    /// A running actor handles everything queued before the stop, then runs
    /// `shutdown`. An actor still waiting on the startup barrier skips
    /// `started` and its queue. An actor that was never started terminates
    /// without a thread. With `join`, waits for the thread to exit.
    pub fn stop(&self, join: bool) -> Result<(), ActorError> {
        let registry = Arc::clone(self.router.registry());

        if self.pending.lock().take().is_some() {
            debug!("Stopping unstarted actor {}", self.name);
            self.terminate_unstarted(&registry);
            return Ok(());
        }

        match self.lifecycle.state() {
            ActorState::New | ActorState::Initializing | ActorState::AwaitingSync => {
                self.lifecycle.abort();
                self.lifecycle.sync.open();
                let _ = self.mailbox.send_stop();
            }
            ActorState::Running => {
                if let Err(e) = self.mailbox.send_stop() {
                    debug!("Stop for actor {} not queued: {}", self.name, e);
                }
            }
            ActorState::Stopping | ActorState::Terminated => {}
        }

        if join {
            self.join()?;
        }
        Ok(())
    }

    /// Wait for the actor thread to exit. Returns immediately when called
    /// from the actor's own thread or when there is no thread.
    pub fn join(&self) -> Result<(), ActorError> {
        let handle = {
            let mut thread = self.thread.lock();
            match thread.as_ref() {
                Some(handle) if handle.thread().id() == thread::current().id() => return Ok(()),
                _ => thread.take(),
            }
        };

        match handle {
            Some(handle) => handle
                .join()
                .map_err(|_| ActorError::Crashed(self.name.clone())),
            None => Ok(()),
        }
    }

    /// Queue `data` directly into the mailbox, bypassing the router. The
    /// envelope carries no sender. Waits for space in a full bounded mailbox.
    pub fn put(&self, data: Message) -> Result<(), ActorError> {
        self.mailbox
            .send(Envelope::oneway(data, None))
            .map_err(|e| match e {
                MailboxError::Closed => ActorError::Terminated(self.name.clone()),
                MailboxError::Full => ActorError::DeliveryFailed(self.name.clone()),
            })
    }

    /// Arm a one-shot timer delivering `[name, value]` to this actor.
    pub fn set_timer(
        &self,
        name: &str,
        delay: Duration,
        value: impl Into<Value>,
    ) -> Result<(), TimerError> {
        self.timers.set(name, delay, value)
    }

    /// Disarm a timer. Returns `false` if it was not armed.
    pub fn kill_timer(&self, name: &str) -> bool {
        self.timers.kill(name)
    }

    /// Whether timer `name` is armed
    pub fn is_timer_set(&self, name: &str) -> bool {
        self.timers.is_set(name)
    }

    fn check_waitable(&self) -> Result<(), ActorError> {
        if !self.lifecycle.was_launched() && !self.lifecycle.state().is_terminal() {
            return Err(ActorError::NotStarted(self.name.clone()));
        }
        Ok(())
    }

    fn ready_outcome(&self) -> Result<(), ActorError> {
        if let Some(fault) = self.lifecycle.init_error() {
            return Err(ActorError::InitializationFailed(self.name.clone(), fault));
        }
        if !self.lifecycle.was_launched() {
            return Err(ActorError::Terminated(self.name.clone()));
        }
        Ok(())
    }

    fn unavailable(&self) -> ActorError {
        if self.lifecycle.state().is_terminal() {
            ActorError::Terminated(self.name.clone())
        } else {
            ActorError::AlreadyStarted(self.name.clone())
        }
    }

    fn terminate_unstarted(&self, registry: &Registry) {
        self.timers.close();
        registry.unregister(&self.name, self.mailbox.id());
        self.lifecycle.transition(ActorState::Terminated);
        self.lifecycle.ready.open();
        self.lifecycle.sync.open();
        info!("Actor {} terminated", self.name);
    }
}

impl fmt::Debug for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Actor")
            .field("name", &self.name)
            .field("state", &self.state())
            .field("mailbox", &self.mailbox)
            .finish()
    }
}

impl Drop for Actor {
    fn drop(&mut self) {
        if !self.state().is_terminal() {
            if let Err(e) = self.stop(false) {
                warn!("Failed to stop actor {} on drop: {}", self.name, e);
            }
        }
    }
}
