//! Construction-time configuration for actors.

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Opaque application object shared with actors.
pub type AppRef = Arc<dyn Any + Send + Sync>;

/// How an actor's loop waits on its mailbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MailboxConfig {
    /// Block while waiting for a letter. When false the loop polls and
    /// delivers an idle tick whenever the mailbox is empty.
    pub blocking: bool,

    /// Dequeue timeout in milliseconds for blocking mode. Expiry delivers an
    /// idle tick. `None` blocks indefinitely.
    pub timeout_ms: Option<u64>,

    /// Mailbox capacity. Zero means unbounded.
    pub capacity: usize,
}

impl MailboxConfig {
    /// Dequeue timeout as a duration.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Whether the mailbox has a capacity bound.
    pub fn is_bounded(&self) -> bool {
        self.capacity > 0
    }
}

impl Default for MailboxConfig {
    fn default() -> Self {
        Self {
            blocking: true,
            timeout_ms: None,
            capacity: 0,
        }
    }
}

/// Configuration used when constructing an actor.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorConfig {
    /// Registry name. Must be unique among live actors.
    pub name: String,

    /// Name of the parent actor, if any.
    pub parent: Option<String>,

    /// Mailbox behavior
    pub mailbox: MailboxConfig,

    /// Application object handed to the actor's context
    #[serde(skip)]
    pub app: Option<AppRef>,
}

impl ActorConfig {
    /// Create a configuration with default mailbox settings.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the parent actor name.
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Set the mailbox configuration.
    pub fn with_mailbox(mut self, mailbox: MailboxConfig) -> Self {
        self.mailbox = mailbox;
        self
    }

    /// Set the shared application object.
    pub fn with_app(mut self, app: AppRef) -> Self {
        self.app = Some(app);
        self
    }
}

impl fmt::Debug for ActorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorConfig")
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("mailbox", &self.mailbox)
            .field("app", &self.app.is_some())
            .finish()
    }
}
