//! Error types for the Courier actor runtime.
//!
//! This module defines an error hierarchy organized by subsystem. Each
//! subsystem (actors, routing, the registry, the store) has its own error
//! type, and the root error type, `Error`, can wrap any of them for uniform
//! handling at the top level.

use std::time::Duration;
use thiserror::Error;

/// Root error type for the Courier system.
#[derive(Debug, Error)]
pub enum Error {
    /// Actor lifecycle errors
    #[error("Actor error: {0}")]
    Actor(#[from] ActorError),

    /// Message routing errors
    #[error("Route error: {0}")]
    Route(#[from] RouteError),

    /// Registry errors
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Structured store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// General runtime errors
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Errors related to actor construction and lifecycle.
#[derive(Debug, Error)]
pub enum ActorError {
    /// Another actor already holds this name in the registry
    #[error("Duplicate registration: {0}")]
    DuplicateRegistration(String),

    /// The actor thread has already been started
    #[error("Actor already started: {0}")]
    AlreadyStarted(String),

    /// The actor thread was never started
    #[error("Actor not started: {0}")]
    NotStarted(String),

    /// The actor has terminated
    #[error("Actor terminated: {0}")]
    Terminated(String),

    /// The operating system refused to spawn the actor thread
    #[error("Failed to spawn actor thread {0}: {1}")]
    SpawnFailed(String, String),

    /// The `initialize` hook failed
    #[error("Actor initialization failed: {0}: {1}")]
    InitializationFailed(String, String),

    /// Timed out waiting for the actor to become ready
    #[error("Timed out after {1:?} waiting for actor {0}")]
    ReadyTimeout(String, Duration),

    /// Failed to enqueue a message into the actor's mailbox
    #[error("Actor message delivery failed: {0}")]
    DeliveryFailed(String),

    /// The actor thread panicked outside of a hook
    #[error("Actor crashed: {0}")]
    Crashed(String),
}

/// Errors reported by the router when sending a message.
///
/// Sends are best effort: these errors are logged at the router boundary and
/// returned to the caller, never raised inside the receiving actor.
#[derive(Debug, Error)]
pub enum RouteError {
    /// The payload was not a sequence of values
    #[error("Invalid message format: {0}")]
    InvalidFormat(String),

    /// No actor is registered under the destination name
    #[error("Destination not found: {0}")]
    DestinationNotFound(String),

    /// A synchronous reply did not arrive within the timeout
    #[error("Reply from {0} timed out after {1:?}")]
    ReplyTimeout(String, Duration),

    /// The reply channel closed without an answer
    #[error("No reply from {0}")]
    NoReply(String),

    /// The destination's message handler faulted while producing a reply
    #[error("Handler fault in {0}: {1}")]
    HandlerFault(String, String),

    /// The destination mailbox is full
    #[error("Mailbox full: {0}")]
    MailboxFull(String),

    /// The destination mailbox is closed
    #[error("Mailbox closed: {0}")]
    MailboxClosed(String),
}

/// Errors related to the actor registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The name is already registered to another actor
    #[error("Name already registered: {0}")]
    Duplicate(String),

    /// The name is not registered
    #[error("Name not registered: {0}")]
    NotRegistered(String),
}

/// Errors related to structured store access.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No value exists at the path
    #[error("Undefined path: {0}")]
    UndefinedPath(String),

    /// The path could not be created
    #[error("Invalid path {0}: {1}")]
    InvalidPath(String, String),

    /// The value at the path has a different type
    #[error("Type mismatch at {path}: expected {expected}")]
    TypeMismatch {
        /// Path of the offending value
        path: String,

        /// Expected value type
        expected: String,
    },

    /// The store could not be parsed or rendered
    #[error("Store serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type used throughout the Courier system.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion() {
        let route_err = RouteError::DestinationNotFound("missing".to_string());
        let error: Error = route_err.into();
        assert!(matches!(error, Error::Route(_)));

        let actor_err = ActorError::DuplicateRegistration("echo".to_string());
        let error: Error = actor_err.into();
        assert!(matches!(error, Error::Actor(_)));

        let registry_err = RegistryError::Duplicate("echo".to_string());
        let error: Error = registry_err.into();
        assert!(matches!(error, Error::Registry(_)));
    }

    #[test]
    fn test_error_display() {
        let error: Error = RouteError::ReplyTimeout("echo".into(), Duration::from_millis(250)).into();
        let display = format!("{}", error);
        assert!(display.contains("Reply from echo timed out after 250ms"));

        let error: Error = ActorError::InitializationFailed("db".into(), "boom".into()).into();
        assert_eq!(
            error.to_string(),
            "Actor error: Actor initialization failed: db: boom"
        );
    }

    #[test]
    fn test_store_error_from_json() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let store_err: StoreError = err.into();
        assert!(matches!(store_err, StoreError::Serialization(_)));
    }
}
