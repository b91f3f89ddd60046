#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

//! # Courier Concurrency
//!
//! A thread-per-actor runtime. Each actor owns a mailbox and a thread, and
//! actors talk only through messages routed by name.
//!
//! This crate provides:
//!
//! - Actors with lifecycle hooks and a two-phase startup barrier
//! - Routing for fire-and-forget, broadcast, waited and forwarded sends
//! - Named one-shot timers that deliver into the owning actor's mailbox
//! - Supervisors that start and stop actor groups deterministically
//!
//! ## Example
//!
//! ```no_run
//! use courier_concurrency::actor::handler_fn;
//! use courier_concurrency::ActorSystem;
//! use courier_core::{message, Value};
//! use std::time::Duration;
//!
//! let system = ActorSystem::new()?;
//! let mut supervisor = system.supervisor();
//! supervisor.add(system.actor("echo", handler_fn(|_ctx, data, _from| {
//!     Ok(data.map(Value::Array))
//! }))?);
//! supervisor.start_all()?;
//!
//! let reply = system.ask("echo", message!["ping"], Some(Duration::from_secs(1)))?;
//! assert_eq!(reply, Some(Value::from(message!["ping"])));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// Actors, mailboxes, routing, timers and supervision
pub mod actor;

/// The shared timer scheduling thread
pub mod scheduler;

/// Synchronization primitives used by the runtime
pub mod sync;

pub use actor::{
    handler_fn, Actor, ActorConfig, ActorContext, ActorState, ActorSystem, ActorSystemConfig,
    Delivery, Handler, MailboxConfig, Router, SendRequest, Supervisor, SupervisorConfig,
};
pub use scheduler::TimerScheduler;
