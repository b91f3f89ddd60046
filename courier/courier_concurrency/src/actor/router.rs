//! Message routing between actors.
//!
//! [`Router::send`] is the single entry point for talking to actors. It builds
//! envelopes, resolves destinations through the [`Registry`] and applies the
//! requested reply policy:
//!
//! - no destination: broadcast to every registered actor
//! - destination without reply: fire-and-forget
//! - destination with [`SendRequest::wait`]: block for the handler's result
//! - destination with [`SendRequest::forward`]: the handler's result `r` is
//!   delivered to a third actor as `[token, r]`
//!
//! Failures are logged here and returned as [`RouteError`]s. They are never
//! raised inside the receiving actor.

use crossbeam_channel::{bounded, RecvTimeoutError};
use courier_core::{Message, RouteError, Value};
use log::{debug, error, trace, warn};
use std::sync::Arc;
use std::time::Duration;

use super::envelope::{Envelope, ReplyResult, ReplyTo};
use super::mailbox::{Mailbox, MailboxError};
use super::registry::Registry;

/// Token used for forwarded replies when none is given
pub const DEFAULT_REPLY_TOKEN: &str = "reply";

#[derive(Debug, Clone)]
enum ReplyMode {
    None,
    Wait(Option<Duration>),
    Forward { actor: String, token: Value },
}

/// A message send, built up before being handed to [`Router::send`]
#[derive(Debug, Clone)]
pub struct SendRequest {
    message: Value,
    to: Option<String>,
    sender: Option<String>,
    reply: ReplyMode,
}

impl SendRequest {
    /// Start a request carrying `message`, which must be an array.
    pub fn new(message: impl Into<Value>) -> Self {
        Self {
            message: message.into(),
            to: None,
            sender: None,
            reply: ReplyMode::None,
        }
    }

    /// Address a single actor. Without this the request is a broadcast.
    pub fn to(mut self, name: impl Into<String>) -> Self {
        self.to = Some(name.into());
        self
    }

    /// Record the sending actor's name.
    pub fn sender(mut self, name: impl Into<String>) -> Self {
        self.sender = Some(name.into());
        self
    }

    /// Block for the result, up to `timeout` (forever when `None`).
    pub fn wait(mut self, timeout: Option<Duration>) -> Self {
        self.reply = ReplyMode::Wait(timeout);
        self
    }

    /// Deliver the result to `actor` as `["reply", result]`.
    pub fn forward(self, actor: impl Into<String>) -> Self {
        self.forward_with_token(actor, DEFAULT_REPLY_TOKEN)
    }

    /// Deliver the result to `actor` as `[token, result]`.
    pub fn forward_with_token(mut self, actor: impl Into<String>, token: impl Into<Value>) -> Self {
        self.reply = ReplyMode::Forward {
            actor: actor.into(),
            token: token.into(),
        };
        self
    }

    /// Destination name, `None` for a broadcast
    pub fn destination(&self) -> Option<&str> {
        self.to.as_deref()
    }

    /// Whether a sender name has been set
    pub fn has_sender(&self) -> bool {
        self.sender.is_some()
    }
}

/// Successful outcome of a send
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    /// The envelope was queued in the destination mailbox
    Queued,

    /// A copy was queued for each of `recipients` actors
    Broadcast {
        /// Number of mailboxes that accepted the message
        recipients: usize,
    },

    /// The destination handled the message and returned this result
    Replied(Option<Value>),
}

impl Delivery {
    /// The synchronous result, if this was a waited send
    pub fn into_reply(self) -> Option<Value> {
        match self {
            Delivery::Replied(value) => value,
            _ => None,
        }
    }
}

/// Resolves names through a shared registry and delivers envelopes
#[derive(Debug, Clone)]
pub struct Router {
    registry: Arc<Registry>,
}

impl Router {
    /// Create a router over `registry`
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// The registry used for lookups
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Route a request. Errors are logged before being returned.
    pub fn send(&self, request: SendRequest) -> Result<Delivery, RouteError> {
        let result = self.route(request);

        if let Err(e) = &result {
            match e {
                RouteError::InvalidFormat(_) | RouteError::HandlerFault(..) => {
                    error!("Message routing failed: {}", e)
                }
                _ => warn!("Message routing failed: {}", e),
            }
        }

        result
    }

    /// Fire-and-forget `message` to `to`.
    pub fn tell(&self, to: &str, message: impl Into<Value>) -> Result<Delivery, RouteError> {
        self.send(SendRequest::new(message).to(to))
    }

    /// Send `message` to `to` and wait for the handler's result.
    pub fn ask(
        &self,
        to: &str,
        message: impl Into<Value>,
        timeout: Option<Duration>,
    ) -> Result<Option<Value>, RouteError> {
        self.send(SendRequest::new(message).to(to).wait(timeout))
            .map(Delivery::into_reply)
    }

    /// Send `message` to every registered actor. Returns the recipient count.
    pub fn broadcast(&self, message: impl Into<Value>) -> Result<usize, RouteError> {
        match self.send(SendRequest::new(message))? {
            Delivery::Broadcast { recipients } => Ok(recipients),
            _ => Ok(0),
        }
    }

    fn route(&self, request: SendRequest) -> Result<Delivery, RouteError> {
        let SendRequest {
            message,
            to,
            sender,
            reply,
        } = request;

        let data = message.into_message().map_err(|other| {
            RouteError::InvalidFormat(format!("expected array, got {}", other.type_name()))
        })?;

        let Some(to) = to else {
            if !matches!(reply, ReplyMode::None) {
                debug!("Ignoring reply policy on broadcast");
            }
            return Ok(self.broadcast_envelopes(data, sender));
        };

        let mailbox = self
            .registry
            .lookup(&to)
            .ok_or_else(|| RouteError::DestinationNotFound(to.clone()))?;

        match reply {
            ReplyMode::None => {
                deliver(&mailbox, Envelope::oneway(data, sender))?;
                trace!("Queued message for {}", to);
                Ok(Delivery::Queued)
            }
            ReplyMode::Forward { actor, token } => {
                let reply_to = ReplyTo::Actor { name: actor, token };
                deliver(&mailbox, Envelope::new(data, sender, reply_to))?;
                Ok(Delivery::Queued)
            }
            ReplyMode::Wait(timeout) => {
                let (reply_tx, reply_rx) = bounded::<ReplyResult>(1);
                deliver(
                    &mailbox,
                    Envelope::new(data, sender, ReplyTo::Channel(reply_tx)),
                )?;

                let reply = match timeout {
                    Some(timeout) => reply_rx.recv_timeout(timeout).map_err(|e| match e {
                        RecvTimeoutError::Timeout => RouteError::ReplyTimeout(to.clone(), timeout),
                        RecvTimeoutError::Disconnected => RouteError::NoReply(to.clone()),
                    })?,
                    None => reply_rx
                        .recv()
                        .map_err(|_| RouteError::NoReply(to.clone()))?,
                };

                reply
                    .map(Delivery::Replied)
                    .map_err(|fault| RouteError::HandlerFault(to, fault))
            }
        }
    }

    fn broadcast_envelopes(&self, data: Message, sender: Option<String>) -> Delivery {
        // Snapshot under the lock, deliver after releasing it.
        let mailboxes = self.registry.snapshot();
        let mut recipients = 0;

        for mailbox in &mailboxes {
            match deliver(mailbox, Envelope::oneway(data.clone(), sender.clone())) {
                Ok(()) => recipients += 1,
                Err(e) => warn!("Broadcast skipped {}: {}", mailbox.name(), e),
            }
        }

        debug!("Broadcast delivered to {} of {} actors", recipients, mailboxes.len());
        Delivery::Broadcast { recipients }
    }

    /// Route a handler's result according to the envelope's reply descriptor.
    ///
    /// `from` is the name of the actor that produced the result. Replies to
    /// abandoned channels are discarded silently.
    pub fn deliver_reply(&self, from: &str, reply_to: ReplyTo, result: ReplyResult) {
        match reply_to {
            ReplyTo::None => {}
            ReplyTo::Channel(sender) => {
                if sender.send(result).is_err() {
                    trace!("Discarded late reply from {}", from);
                }
            }
            ReplyTo::Actor { name, token } => match result {
                Ok(value) => {
                    let forwarded = Value::Array(vec![token, value.unwrap_or(Value::Null)]);
                    let _ = self.send(SendRequest::new(forwarded).to(name).sender(from));
                }
                Err(fault) => {
                    debug!("Not forwarding faulted result from {} to {}: {}", from, name, fault);
                }
            },
        }
    }
}

fn deliver(mailbox: &Mailbox, envelope: Envelope) -> Result<(), RouteError> {
    mailbox.try_send(envelope).map_err(|e| match e {
        MailboxError::Full => RouteError::MailboxFull(mailbox.name().to_string()),
        MailboxError::Closed => RouteError::MailboxClosed(mailbox.name().to_string()),
    })
}
