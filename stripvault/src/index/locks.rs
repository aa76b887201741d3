//! Lazily populated per-key lock registry.

use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;

/// Registry handing out one shared lock value per key.
///
/// `get` performs an atomic get-or-create through the map's entry API, so two
/// threads resolving the same key always receive the same `Arc<L>`. Entries
/// are never removed: a lock handed out once stays valid for the lifetime of
/// the registry.
#[derive(Debug)]
pub struct LockRegistry<K, L>
where
    K: Eq + Hash,
{
    locks: DashMap<K, Arc<L>>,
}

impl<K, L> LockRegistry<K, L>
where
    K: Eq + Hash + Clone,
    L: Default,
{
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    /// Get the lock for `key`, creating it on first use.
    pub fn get(&self, key: &K) -> Arc<L> {
        if let Some(existing) = self.locks.get(key) {
            return Arc::clone(existing.value());
        }
        Arc::clone(self.locks.entry(key.clone()).or_default().value())
    }

    /// Get the lock for `key` only if it was already created.
    pub fn peek(&self, key: &K) -> Option<Arc<L>> {
        self.locks.get(key).map(|entry| Arc::clone(entry.value()))
    }

    /// Keys that currently have a lock.
    pub fn keys_matching(&self, mut predicate: impl FnMut(&K) -> bool) -> Vec<K> {
        self.locks
            .iter()
            .filter(|entry| predicate(entry.key()))
            .map(|entry| entry.key().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl<K, L> Default for LockRegistry<K, L>
where
    K: Eq + Hash + Clone,
    L: Default,
{
    fn default() -> Self {
        Self::new()
    }
}
