//! Message envelopes and the letters that carry them through a mailbox.

use crossbeam_channel::Sender;
use courier_core::{Message, Value};
use std::fmt;

/// Outcome sent back over a synchronous reply channel. The error carries the
/// handler fault description.
pub type ReplyResult = Result<Option<Value>, String>;

/// Where the result of handling a message goes.
#[derive(Clone)]
pub enum ReplyTo {
    /// Result is discarded
    None,

    /// Result is sent over a single-use channel to a blocked caller
    Channel(Sender<ReplyResult>),

    /// `[token, result]` is delivered to another actor
    Actor {
        /// Actor that receives the forwarded result
        name: String,

        /// First element of the forwarded message
        token: Value,
    },
}

impl ReplyTo {
    /// Whether a reply is expected.
    pub fn is_some(&self) -> bool {
        !matches!(self, ReplyTo::None)
    }
}

impl fmt::Debug for ReplyTo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplyTo::None => write!(f, "None"),
            ReplyTo::Channel(_) => write!(f, "Channel"),
            ReplyTo::Actor { name, token } => f
                .debug_struct("Actor")
                .field("name", name)
                .field("token", token)
                .finish(),
        }
    }
}

/// A message in transit. Consumed exactly once by the receiving loop.
#[derive(Debug, Clone)]
pub struct Envelope {
    data: Message,
    from: Option<String>,
    reply_to: ReplyTo,
}

impl Envelope {
    /// Create an envelope.
    pub fn new(data: Message, from: Option<String>, reply_to: ReplyTo) -> Self {
        Self {
            data,
            from,
            reply_to,
        }
    }

    /// An envelope that expects no reply.
    pub fn oneway(data: Message, from: Option<String>) -> Self {
        Self::new(data, from, ReplyTo::None)
    }

    /// Message payload
    pub fn data(&self) -> &Message {
        &self.data
    }

    /// Sender name
    pub fn from(&self) -> Option<&str> {
        self.from.as_deref()
    }

    /// Reply descriptor
    pub fn reply_to(&self) -> &ReplyTo {
        &self.reply_to
    }

    /// Split into payload, sender and reply descriptor.
    pub fn into_parts(self) -> (Message, Option<String>, ReplyTo) {
        (self.data, self.from, self.reply_to)
    }
}

/// An item in an actor's mailbox.
#[derive(Debug)]
pub enum Letter {
    /// A message to hand to the actor
    Envelope(Envelope),

    /// Ends the actor's loop once everything queued before it is handled
    Stop,
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_core::message;

    #[test]
    fn test_envelope_parts() {
        let envelope = Envelope::new(
            message!["ping", 1],
            Some("a".to_string()),
            ReplyTo::Actor {
                name: "c".to_string(),
                token: Value::from("tok"),
            },
        );

        assert_eq!(envelope.data().len(), 2);
        assert_eq!(envelope.from(), Some("a"));
        assert!(envelope.reply_to().is_some());

        let (data, from, reply_to) = envelope.into_parts();
        assert_eq!(data[0], Value::from("ping"));
        assert_eq!(from.as_deref(), Some("a"));
        assert!(matches!(reply_to, ReplyTo::Actor { ref name, .. } if name == "c"));
    }

    #[test]
    fn test_oneway_has_no_reply() {
        let envelope = Envelope::oneway(message!["tick"], None);
        assert!(!envelope.reply_to().is_some());
        assert_eq!(envelope.from(), None);
    }
}
