//! Deferred execution on a shared scheduling thread.
//!
//! The runtime owns one [`TimerScheduler`]. Actor timers are scheduled on it
//! and fire on its thread, never on an actor's own thread.

pub mod timer;

pub use timer::{SchedulerConfig, SchedulerError, SchedulerStats, TimerId, TimerScheduler};
