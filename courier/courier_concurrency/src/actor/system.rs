//! Actor system owning the shared runtime pieces.
//!
//! The [`ActorSystem`] holds the registry, the router built on it and the
//! timer scheduler. Every actor constructed through a system shares these,
//! so independent systems never see each other's actors.

use courier_core::{ActorError, Error, RouteError, Value};
use log::info;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use super::config::{ActorConfig, MailboxConfig};
use super::handle::Actor;
use super::handler::Handler;
use super::registry::Registry;
use super::router::{Delivery, Router, SendRequest};
use super::supervisor::{Supervisor, SupervisorConfig};
use crate::scheduler::{SchedulerConfig, SchedulerStats, TimerScheduler};

/// Configuration for the actor system
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorSystemConfig {
    /// Name of the timer scheduling thread
    pub timer_thread_name: String,

    /// Mailbox settings for actors created with [`ActorSystem::actor`]
    pub default_mailbox: MailboxConfig,

    /// Settings for supervisors created with [`ActorSystem::supervisor`]
    pub supervisor: SupervisorConfig,
}

impl Default for ActorSystemConfig {
    fn default() -> Self {
        Self {
            timer_thread_name: SchedulerConfig::default().thread_name,
            default_mailbox: MailboxConfig::default(),
            supervisor: SupervisorConfig::default(),
        }
    }
}

/// The central actor system that constructs and connects actors
pub struct ActorSystem {
    /// Registry shared by every actor of this system
    registry: Arc<Registry>,
    /// Router over the registry
    router: Router,
    /// Timer scheduling thread
    scheduler: TimerScheduler,
    /// Configuration for this actor system
    config: ActorSystemConfig,
}

impl ActorSystem {
    /// Create a new actor system with default configuration
    pub fn new() -> courier_core::Result<Self> {
        Self::with_config(ActorSystemConfig::default())
    }

    /// Create a new actor system with the specified configuration
    pub fn with_config(config: ActorSystemConfig) -> courier_core::Result<Self> {
        let scheduler = TimerScheduler::with_config(SchedulerConfig {
            thread_name: config.timer_thread_name.clone(),
        })
        .map_err(|e| Error::Runtime(e.to_string()))?;

        let registry = Arc::new(Registry::new());
        info!("Creating actor system");

        Ok(Self {
            router: Router::new(Arc::clone(&registry)),
            registry,
            scheduler,
            config,
        })
    }

    /// Construct and register an actor.
    ///
    /// # Errors
    ///
    /// `DuplicateRegistration` if a live actor already holds the name. The
    /// existing actor keeps it.
    pub fn actor_of<H: Handler>(&self, config: ActorConfig, handler: H) -> Result<Actor, ActorError> {
        Actor::new(
            config,
            Box::new(handler),
            self.router.clone(),
            self.scheduler.clone(),
        )
    }

    /// Construct an actor named `name` with the default mailbox settings.
    pub fn actor<H: Handler>(&self, name: &str, handler: H) -> Result<Actor, ActorError> {
        let config = ActorConfig::new(name).with_mailbox(self.config.default_mailbox.clone());
        self.actor_of(config, handler)
    }

    /// Create an empty supervisor using this system's supervisor settings
    pub fn supervisor(&self) -> Supervisor {
        Supervisor::new(self.config.supervisor.clone())
    }

    /// Route a request from outside any actor
    pub fn send(&self, request: SendRequest) -> Result<Delivery, RouteError> {
        self.router.send(request)
    }

    /// Fire-and-forget `message` to `to`
    pub fn tell(&self, to: &str, message: impl Into<Value>) -> Result<Delivery, RouteError> {
        self.router.tell(to, message)
    }

    /// Send and wait for the handler's result
    pub fn ask(
        &self,
        to: &str,
        message: impl Into<Value>,
        timeout: Option<Duration>,
    ) -> Result<Option<Value>, RouteError> {
        self.router.ask(to, message, timeout)
    }

    /// Send to every registered actor; returns the recipient count
    pub fn broadcast(&self, message: impl Into<Value>) -> Result<usize, RouteError> {
        self.router.broadcast(message)
    }

    /// The router of this system
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// The registry of this system
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Get the number of registered actors
    pub fn actor_count(&self) -> usize {
        self.registry.len()
    }

    /// Registered actor names, sorted
    pub fn actor_names(&self) -> Vec<String> {
        self.registry.names()
    }

    /// Timer scheduler counters
    pub fn timer_stats(&self) -> SchedulerStats {
        self.scheduler.stats()
    }

    /// The configuration of this system
    pub fn config(&self) -> &ActorSystemConfig {
        &self.config
    }

    /// Stop the timer thread. Actors are stopped by their supervisors.
    pub fn shutdown(&self) {
        info!("Shutting down actor system");
        self.scheduler.shutdown();
        info!("Actor system shutdown complete");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::handler::handler_fn;
    use courier_core::message;

    fn echo() -> impl Handler {
        handler_fn(|_ctx, data, _from| Ok(data.map(Value::Array)))
    }

    #[test]
    fn test_actor_registration() {
        let system = ActorSystem::new().unwrap();

        let a = system.actor("actor1", echo()).unwrap();
        let b = system
            .actor_of(ActorConfig::new("actor2").with_parent("actor1"), echo())
            .unwrap();

        assert_eq!(system.actor_count(), 2);
        assert_eq!(system.actor_names(), vec!["actor1", "actor2"]);

        a.stop(true).unwrap();
        b.stop(true).unwrap();
        assert_eq!(system.actor_count(), 0);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let system = ActorSystem::new().unwrap();
        let first = system.actor("echo", echo()).unwrap();

        let second = system.actor("echo", echo());
        assert!(matches!(second, Err(ActorError::DuplicateRegistration(ref n)) if n == "echo"));

        assert_eq!(
            system.registry().lookup("echo").unwrap().id(),
            first.mailbox().id()
        );
    }

    #[test]
    fn test_systems_are_isolated() {
        let one = ActorSystem::new().unwrap();
        let two = ActorSystem::new().unwrap();

        let _a = one.actor("shared-name", echo()).unwrap();
        let _b = two.actor("shared-name", echo()).unwrap();

        assert!(matches!(
            two.tell("only-in-one", message!["x"]),
            Err(RouteError::DestinationNotFound(_))
        ));
    }

    #[test]
    fn test_default_mailbox_applied() {
        let config = ActorSystemConfig {
            default_mailbox: MailboxConfig {
                capacity: 4,
                ..Default::default()
            },
            ..Default::default()
        };
        let system = ActorSystem::with_config(config).unwrap();

        let actor = system.actor("bounded", echo()).unwrap();
        assert_eq!(actor.mailbox().capacity(), 4);
    }

    #[test]
    fn test_system_shutdown() {
        let system = ActorSystem::new().unwrap();
        let actor = system.actor("t", echo()).unwrap();

        system.shutdown();
        assert!(actor.set_timer("late", Duration::from_millis(1), 1).is_err());
    }
}
