//! Actor mailbox implementation for message passing.
//!
//! A mailbox is a FIFO queue of [`Letter`]s with many producers (the router,
//! timers, the supervisor) and a single consumer, the owning actor's loop.
//! Mailboxes are unbounded when configured with capacity zero.

use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender, TryRecvError, TrySendError};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use super::config::MailboxConfig;
use super::envelope::{Envelope, Letter};
use crate::sync::AtomicSequence;

static MAILBOX_IDS: AtomicSequence = AtomicSequence::new(1);

/// Error when sending a letter to a mailbox
#[derive(Error, Debug)]
pub enum MailboxError {
    /// The mailbox is full (bounded capacity reached)
    #[error("mailbox is full")]
    Full,

    /// The mailbox has been closed or the actor is stopped
    #[error("mailbox is closed")]
    Closed,
}

/// A sending handle to an actor's mailbox
#[derive(Clone)]
pub struct Mailbox {
    // Channel for sending letters to the actor
    sender: Sender<Letter>,
    // Unique per mailbox, used to tell apart actors that reuse a name
    id: u64,
    // Maximum capacity, zero when unbounded
    capacity: usize,
    // Owning actor name for debugging and monitoring
    name: Arc<str>,
}

impl Mailbox {
    /// Create a new mailbox with the specified capacity (zero for unbounded)
    pub fn new(capacity: usize, name: impl Into<String>) -> (Self, MailboxReceiver) {
        let (sender, receiver) = if capacity == 0 {
            unbounded()
        } else {
            bounded(capacity)
        };

        let mailbox = Self {
            sender,
            id: MAILBOX_IDS.next(),
            capacity,
            name: Arc::from(name.into()),
        };
        (mailbox, MailboxReceiver { receiver })
    }

    /// Deliver an envelope, waiting for space if the mailbox is bounded and full
    pub fn send(&self, envelope: Envelope) -> Result<(), MailboxError> {
        self.sender
            .send(Letter::Envelope(envelope))
            .map_err(|_| MailboxError::Closed)
    }

    /// Deliver an envelope without blocking
    pub fn try_send(&self, envelope: Envelope) -> Result<(), MailboxError> {
        self.sender
            .try_send(Letter::Envelope(envelope))
            .map_err(|e| match e {
                TrySendError::Full(_) => MailboxError::Full,
                TrySendError::Disconnected(_) => MailboxError::Closed,
            })
    }

    /// Queue the stop sentinel behind everything already queued
    pub fn send_stop(&self) -> Result<(), MailboxError> {
        self.sender
            .send(Letter::Stop)
            .map_err(|_| MailboxError::Closed)
    }

    /// Get the capacity of the mailbox, zero when unbounded
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of letters currently queued
    pub fn len(&self) -> usize {
        self.sender.len()
    }

    /// Whether no letters are queued
    pub fn is_empty(&self) -> bool {
        self.sender.is_empty()
    }

    /// Get the mailbox identity
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Get the name of the owning actor
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mailbox")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("capacity", &self.capacity)
            .finish()
    }
}

/// How the consumer waits for the next letter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceivePolicy {
    /// Wait until a letter arrives
    Block,

    /// Wait up to the duration, then report idle
    BlockFor(Duration),

    /// Never wait; report idle when empty
    Poll,
}

impl From<&MailboxConfig> for ReceivePolicy {
    fn from(config: &MailboxConfig) -> Self {
        match (config.blocking, config.timeout()) {
            (false, _) => ReceivePolicy::Poll,
            (true, Some(timeout)) => ReceivePolicy::BlockFor(timeout),
            (true, None) => ReceivePolicy::Block,
        }
    }
}

/// Outcome of a receive attempt
#[derive(Debug)]
pub enum Received {
    /// A letter was dequeued
    Letter(Letter),

    /// Nothing arrived within the policy's wait
    Idle,

    /// Every sender is gone
    Closed,
}

/// The consuming end of a mailbox, owned by the actor's loop
pub struct MailboxReceiver {
    receiver: Receiver<Letter>,
}

impl MailboxReceiver {
    /// Dequeue the next letter according to `policy`
    pub fn receive(&self, policy: ReceivePolicy) -> Received {
        match policy {
            ReceivePolicy::Block => match self.receiver.recv() {
                Ok(letter) => Received::Letter(letter),
                Err(_) => Received::Closed,
            },
            ReceivePolicy::BlockFor(timeout) => match self.receiver.recv_timeout(timeout) {
                Ok(letter) => Received::Letter(letter),
                Err(RecvTimeoutError::Timeout) => Received::Idle,
                Err(RecvTimeoutError::Disconnected) => Received::Closed,
            },
            ReceivePolicy::Poll => match self.receiver.try_recv() {
                Ok(letter) => Received::Letter(letter),
                Err(TryRecvError::Empty) => Received::Idle,
                Err(TryRecvError::Disconnected) => Received::Closed,
            },
        }
    }

    /// Discard everything queued. Returns the number of envelopes dropped.
    pub fn drain(&self) -> usize {
        self.receiver
            .try_iter()
            .filter(|letter| matches!(letter, Letter::Envelope(_)))
            .count()
    }

    /// Number of letters currently queued
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Whether no letters are queued
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

impl fmt::Debug for MailboxReceiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailboxReceiver")
            .field("queued", &self.receiver.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_core::message;

    fn envelope(n: i64) -> Envelope {
        Envelope::oneway(message![n], None)
    }

    fn expect_data(received: Received) -> i64 {
        match received {
            Received::Letter(Letter::Envelope(envelope)) => {
                envelope.data()[0].as_integer().unwrap()
            }
            other => panic!("unexpected receive outcome: {:?}", other),
        }
    }

    #[test]
    fn test_mailbox_send_receive_in_order() {
        let (mailbox, receiver) = Mailbox::new(0, "test-actor");

        for n in 0..5 {
            mailbox.send(envelope(n)).unwrap();
        }

        for n in 0..5 {
            assert_eq!(expect_data(receiver.receive(ReceivePolicy::Block)), n);
        }
    }

    #[test]
    fn test_mailbox_capacity() {
        let (mailbox, _receiver) = Mailbox::new(2, "test-actor");

        assert!(mailbox.try_send(envelope(1)).is_ok());
        assert!(mailbox.try_send(envelope(2)).is_ok());

        let result = mailbox.try_send(envelope(3));
        assert!(matches!(result, Err(MailboxError::Full)));
        assert_eq!(mailbox.len(), 2);
    }

    #[test]
    fn test_mailbox_closed() {
        let (mailbox, receiver) = Mailbox::new(10, "test-actor");

        drop(receiver);

        assert!(matches!(mailbox.send(envelope(1)), Err(MailboxError::Closed)));
        assert!(matches!(mailbox.send_stop(), Err(MailboxError::Closed)));
    }

    #[test]
    fn test_receive_policies() {
        let (mailbox, receiver) = Mailbox::new(0, "test-actor");

        assert!(matches!(receiver.receive(ReceivePolicy::Poll), Received::Idle));
        assert!(matches!(
            receiver.receive(ReceivePolicy::BlockFor(Duration::from_millis(10))),
            Received::Idle
        ));

        mailbox.send_stop().unwrap();
        assert!(matches!(
            receiver.receive(ReceivePolicy::Poll),
            Received::Letter(Letter::Stop)
        ));

        drop(mailbox);
        assert!(matches!(receiver.receive(ReceivePolicy::Block), Received::Closed));
    }

    #[test]
    fn test_policy_from_config() {
        let mut config = MailboxConfig::default();
        assert_eq!(ReceivePolicy::from(&config), ReceivePolicy::Block);

        config.timeout_ms = Some(50);
        assert_eq!(
            ReceivePolicy::from(&config),
            ReceivePolicy::BlockFor(Duration::from_millis(50))
        );

        config.blocking = false;
        assert_eq!(ReceivePolicy::from(&config), ReceivePolicy::Poll);
    }

    #[test]
    fn test_drain_counts_envelopes() {
        let (mailbox, receiver) = Mailbox::new(0, "test-actor");
        mailbox.send(envelope(1)).unwrap();
        mailbox.send(envelope(2)).unwrap();
        mailbox.send_stop().unwrap();

        assert_eq!(receiver.drain(), 2);
        assert!(receiver.is_empty());
    }

    #[test]
    fn test_mailbox_ids_are_unique() {
        let (a, _ra) = Mailbox::new(0, "same");
        let (b, _rb) = Mailbox::new(0, "same");
        assert_ne!(a.id(), b.id());
        assert_eq!(a.clone().id(), a.id());
    }
}
