//! Deterministic startup and shutdown of a group of actors.
//!
//! A supervisor drives the two-phase startup: every actor is started, each
//! one's `initialize` is awaited in insertion order, and only then is the
//! barrier released for all of them. Shutdown runs in reverse order.

use courier_core::ActorError;
use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::handle::Actor;
use super::state::ActorState;

/// Configuration for a supervisor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Per-actor limit in milliseconds on waiting for `initialize`.
    /// `None` waits indefinitely.
    pub ready_timeout_ms: Option<u64>,

    /// Wait for each actor thread to exit when stopping
    pub join_on_stop: bool,
}

impl SupervisorConfig {
    /// Ready timeout as a duration
    pub fn ready_timeout(&self) -> Option<Duration> {
        self.ready_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            ready_timeout_ms: Some(10_000),
            join_on_stop: true,
        }
    }
}

/// Owns a group of actors and their lifecycle
#[derive(Debug)]
pub struct Supervisor {
    /// Configuration for this supervisor
    config: SupervisorConfig,

    /// Actors in startup order
    actors: Vec<Actor>,
}

impl Supervisor {
    /// Create an empty supervisor
    pub fn new(config: SupervisorConfig) -> Self {
        Self {
            config,
            actors: Vec::new(),
        }
    }

    /// Take ownership of an actor. Actors start in the order added.
    pub fn add(&mut self, actor: Actor) -> &mut Self {
        debug!("Supervising actor {}", actor.name());
        self.actors.push(actor);
        self
    }

    /// Look up a supervised actor by name
    pub fn get(&self, name: &str) -> Option<&Actor> {
        self.actors.iter().find(|actor| actor.name() == name)
    }

    /// Supervised actors in startup order
    pub fn actors(&self) -> &[Actor] {
        &self.actors
    }

    /// Number of supervised actors
    pub fn len(&self) -> usize {
        self.actors.len()
    }

    /// Whether no actors are supervised
    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    /// Get the supervisor configuration
    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    /// Start every actor, wait for each to be ready in order, then release
    /// them all.
    ///
    /// On any failure the whole group is stopped and the first error is
    /// returned.
    pub fn start_all(&self) -> Result<(), ActorError> {
        info!("Starting {} actors", self.actors.len());

        if let Err(e) = self.start_and_wait() {
            error!("Supervised startup failed: {}", e);
            self.stop_all();
            return Err(e);
        }

        for actor in &self.actors {
            actor.signal_sync();
        }

        info!("All {} actors released", self.actors.len());
        Ok(())
    }

    fn start_and_wait(&self) -> Result<(), ActorError> {
        for actor in &self.actors {
            actor.start()?;
        }

        for actor in &self.actors {
            match self.config.ready_timeout() {
                Some(timeout) => actor.wait_ready_timeout(timeout)?,
                None => actor.wait_ready()?,
            }
            debug!("Actor {} ready", actor.name());
        }
        Ok(())
    }

    /// Stop every actor in reverse startup order.
    ///
    /// # Returns
    ///
    /// Errors from individual stops, in the order they occurred.
    pub fn stop_all(&self) -> Vec<ActorError> {
        let mut errors = Vec::new();

        for actor in self.actors.iter().rev() {
            if actor.state() == ActorState::Terminated {
                continue;
            }
            debug!("Stopping actor {}", actor.name());
            if let Err(e) = actor.stop(self.config.join_on_stop) {
                error!("Failed to stop actor {}: {}", actor.name(), e);
                errors.push(e);
            }
        }

        errors
    }
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new(SupervisorConfig::default())
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        self.stop_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supervisor_config_default() {
        let config = SupervisorConfig::default();

        assert_eq!(config.ready_timeout(), Some(Duration::from_secs(10)));
        assert!(config.join_on_stop);
    }

    #[test]
    fn test_supervisor_config_deserialize() {
        let config: SupervisorConfig =
            serde_json::from_str(r#"{"ready_timeout_ms": null, "join_on_stop": false}"#).unwrap();

        assert_eq!(config.ready_timeout(), None);
        assert!(!config.join_on_stop);
    }

    #[test]
    fn test_empty_supervisor() {
        let supervisor = Supervisor::default();
        assert!(supervisor.is_empty());
        assert!(supervisor.start_all().is_ok());
        assert!(supervisor.stop_all().is_empty());
    }
}
