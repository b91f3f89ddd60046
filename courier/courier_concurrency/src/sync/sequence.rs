//! Monotonic id generation.

use std::sync::atomic::{AtomicU64, Ordering};

/// A sequence that hands out unique, increasing ids.
#[derive(Debug)]
pub struct AtomicSequence {
    next: AtomicU64,
}

impl AtomicSequence {
    /// Create a sequence whose first id is `start`.
    pub const fn new(start: u64) -> Self {
        Self {
            next: AtomicU64::new(start),
        }
    }

    /// Take the next id.
    pub fn next(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// Peek at the id the next call to [`AtomicSequence::next`] will return.
    pub fn current(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}

impl Default for AtomicSequence {
    fn default() -> Self {
        Self::new(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_sequence_is_monotonic() {
        let seq = AtomicSequence::new(10);
        assert_eq!(seq.next(), 10);
        assert_eq!(seq.next(), 11);
        assert_eq!(seq.current(), 12);
    }

    #[test]
    fn test_sequence_unique_across_threads() {
        let seq = Arc::new(AtomicSequence::default());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let seq = Arc::clone(&seq);
                thread::spawn(move || (0..100).map(|_| seq.next()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id), "duplicate id {}", id);
            }
        }
        assert_eq!(seen.len(), 400);
    }
}
