//! Actor-based concurrency with named mailboxes and routed messages.
//!
//! This module provides the actor runtime, including:
//!
//! - Mailboxes, envelopes and the name registry
//! - The router for direct, broadcast, waited and forwarded sends
//! - Per-actor one-shot timers that deliver through the mailbox
//! - The actor thread with its two-phase startup barrier
//! - Supervision of actor groups and the owning actor system

pub mod config;
pub mod context;
pub mod envelope;
pub mod handle;
pub mod handler;
pub mod mailbox;
pub mod registry;
pub mod router;
mod runner;
pub mod state;
pub mod supervisor;
pub mod system;
pub mod timers;

pub use config::{ActorConfig, AppRef, MailboxConfig};
pub use context::ActorContext;
pub use envelope::{Envelope, Letter, ReplyResult, ReplyTo};
pub use handle::Actor;
pub use handler::{handler_fn, FnHandler, Handler};
pub use mailbox::{Mailbox, MailboxError, MailboxReceiver, ReceivePolicy, Received};
pub use registry::Registry;
pub use router::{Delivery, Router, SendRequest, DEFAULT_REPLY_TOKEN};
pub use state::ActorState;
pub use supervisor::{Supervisor, SupervisorConfig};
pub use system::{ActorSystem, ActorSystemConfig};
pub use timers::{TimerError, TimerSet};
