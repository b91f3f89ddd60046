//! The view of the runtime an actor gets from inside its hooks.

use courier_core::{RouteError, Store, Value};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use super::config::AppRef;
use super::envelope::Envelope;
use super::mailbox::{Mailbox, MailboxError};
use super::router::{Delivery, Router, SendRequest};
use super::timers::{TimerError, TimerSet};

/// Handed to every hook. Sends made through the context carry the actor's
/// name as sender.
pub struct ActorContext {
    name: String,
    parent: Option<String>,
    app: Option<AppRef>,
    router: Router,
    mailbox: Mailbox,
    timers: Arc<TimerSet>,
    stores: HashMap<String, Store>,
}

impl ActorContext {
    pub(crate) fn new(
        name: String,
        parent: Option<String>,
        app: Option<AppRef>,
        router: Router,
        mailbox: Mailbox,
        timers: Arc<TimerSet>,
        stores: HashMap<String, Store>,
    ) -> Self {
        Self {
            name,
            parent,
            app,
            router,
            mailbox,
            timers,
            stores,
        }
    }

    /// This actor's registry name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the parent actor
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// The shared application object
    pub fn app(&self) -> Option<&AppRef> {
        self.app.as_ref()
    }

    /// The application object downcast to `T`
    pub fn app_as<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.app.as_ref().and_then(|app| app.downcast_ref::<T>())
    }

    /// The router used for sends
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Route a request, filling in this actor as sender if unset.
    ///
    /// Waiting on a reply from this same actor would deadlock; use a forward
    /// or a timeout instead.
    pub fn send(&self, request: SendRequest) -> Result<Delivery, RouteError> {
        let request = if request.has_sender() {
            request
        } else {
            request.sender(self.name.as_str())
        };
        self.router.send(request)
    }

    /// Fire-and-forget `message` to `to`.
    pub fn tell(&self, to: &str, message: impl Into<Value>) -> Result<Delivery, RouteError> {
        self.send(SendRequest::new(message).to(to))
    }

    /// Send `message` to every registered actor, this one included.
    pub fn broadcast(&self, message: impl Into<Value>) -> Result<Delivery, RouteError> {
        self.send(SendRequest::new(message))
    }

    /// Queue `data` into this actor's own mailbox, behind everything already
    /// queued. The envelope carries no sender.
    pub fn put(&self, data: Vec<Value>) -> Result<(), RouteError> {
        self.mailbox
            .try_send(Envelope::oneway(data, None))
            .map_err(|e| match e {
                MailboxError::Full => RouteError::MailboxFull(self.name.clone()),
                MailboxError::Closed => RouteError::MailboxClosed(self.name.clone()),
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

    /// A store registered before the actor started
    pub fn store(&self, name: &str) -> Option<&Store> {
        self.stores.get(name)
    }

    /// Names of the registered stores, sorted
    pub fn store_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.stores.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
