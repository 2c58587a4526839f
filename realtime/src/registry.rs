// Subscription registry: channel key -> delivery callback
//
// Exactly one callback per key; a new registration for the same key replaces
// the old one and bumps the registration epoch. Removal is epoch-guarded so
// a handle left over from before a replacement cannot remove the newer
// registration.

use groundlink_common::Update;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Capability interface for a delivery target: one method, one update.
/// Implemented for any matching closure.
pub trait Subscriber: Send + Sync {
    fn deliver(&self, update: Update);
}

impl<F> Subscriber for F
where
    F: Fn(Update) + Send + Sync,
{
    fn deliver(&self, update: Update) {
        self(update)
    }
}

struct Entry {
    subscriber: Arc<dyn Subscriber>,
    epoch: u64,
}

#[derive(Default)]
pub struct Registry {
    entries: Mutex<HashMap<String, Entry>>,
    next_epoch: AtomicU64,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the callback for `key`, replacing any prior one. Returns the
    /// registration epoch identifying this particular registration.
    pub fn register(&self, key: &str, subscriber: Arc<dyn Subscriber>) -> u64 {
        let epoch = self.next_epoch.fetch_add(1, Ordering::Relaxed) + 1;
        let mut entries = self.entries.lock().expect("registry lock poisoned");
        entries.insert(key.to_string(), Entry { subscriber, epoch });
        epoch
    }

    /// Remove the entry for `key` if its epoch matches. A stale epoch from a
    /// superseded registration is ignored. Returns whether an entry was
    /// removed.
    pub fn deactivate(&self, key: &str, epoch: u64) -> bool {
        let mut entries = self.entries.lock().expect("registry lock poisoned");
        match entries.get(key) {
            Some(entry) if entry.epoch == epoch => {
                entries.remove(key);
                true
            }
            _ => false,
        }
    }

    /// Deliver `update` to the callback registered for `key`. A registry miss
    /// drops the update and returns false; in-flight data for a channel that
    /// was just unsubscribed is expected, not an error.
    pub fn dispatch(&self, key: &str, update: Update) -> bool {
        let subscriber = {
            let entries = self.entries.lock().expect("registry lock poisoned");
            entries.get(key).map(|entry| Arc::clone(&entry.subscriber))
        };
        // The callback runs outside the lock so it may itself re-subscribe.
        match subscriber {
            Some(subscriber) => {
                subscriber.deliver(update);
                true
            }
            None => false,
        }
    }

    /// Snapshot of the registered channel keys, sorted for deterministic
    /// resubscription sweeps.
    pub fn keys(&self) -> Vec<String> {
        let entries = self.entries.lock().expect("registry lock poisoned");
        let mut keys: Vec<String> = entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("registry lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
