//! Synchronization primitives used by the actor runtime.
//!
//! - [`Gate`]: a one-shot barrier backing the ready/sync startup handshake
//! - [`AtomicSequence`]: a lock-free id generator for mailboxes and timers

pub mod gate;
pub mod sequence;

pub use gate::Gate;
pub use sequence::AtomicSequence;
