//! Name-based actor lookup.
//!
//! The registry maps actor names to mailbox handles. It is shared through an
//! `Arc` by the router, every actor and the actor system. The lock is held
//! only for the map operation itself; delivery always happens after release.

use courier_core::RegistryError;
use log::{debug, trace};
use parking_lot::Mutex;
use std::collections::HashMap;

use super::mailbox::Mailbox;

/// Shared name → mailbox table
#[derive(Debug, Default)]
pub struct Registry {
    entries: Mutex<HashMap<String, Mailbox>>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mailbox under its actor name.
    ///
    /// Fails if the name is taken; the existing entry is left in place.
    pub fn register(&self, mailbox: Mailbox) -> Result<(), RegistryError> {
        let mut entries = self.entries.lock();

        if entries.contains_key(mailbox.name()) {
            return Err(RegistryError::Duplicate(mailbox.name().to_string()));
        }

        debug!("Registered actor: {} (mailbox {})", mailbox.name(), mailbox.id());
        entries.insert(mailbox.name().to_string(), mailbox);
        Ok(())
    }

    /// Remove `name` if it is still held by the mailbox with `id`.
    ///
    /// # Returns
    ///
    /// `true` if an entry was removed.
    pub fn unregister(&self, name: &str, id: u64) -> bool {
        let mut entries = self.entries.lock();

        match entries.get(name) {
            Some(mailbox) if mailbox.id() == id => {
                entries.remove(name);
                debug!("Unregistered actor: {}", name);
                true
            }
            Some(_) => {
                trace!("Skipped unregistering {}: held by another mailbox", name);
                false
            }
            None => false,
        }
    }

    /// Look up the mailbox registered under `name`
    pub fn lookup(&self, name: &str) -> Option<Mailbox> {
        self.entries.lock().get(name).cloned()
    }

    /// Copy of every registered mailbox, taken under the lock
    pub fn snapshot(&self) -> Vec<Mailbox> {
        self.entries.lock().values().cloned().collect()
    }

    /// Check whether `name` is registered
    pub fn contains(&self, name: &str) -> bool {
        self.entries.lock().contains_key(name)
    }

    /// Registered names in sorted order
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.lock().keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered actors
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether no actors are registered
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
