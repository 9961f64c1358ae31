use parking_lot::RwLock;

use hashbrown::HashMap;

use std::hash::Hash;
use std::sync::Arc;

/// An append-only table handing out one dedicated lock object per key.
///
/// Locks are created on first access with insert-if-absent semantics: when two
/// threads race to create the lock for the same key, the loser discards its
/// object and adopts the winner's. An installed lock is never replaced or
/// removed, so every thread that ever asks for a key gets the same `Arc`.
///
/// Entries live for the whole process. That is fine for the bounded,
/// slowly-changing key spaces this crate targets, and wrong for
/// high-cardinality keys.
pub struct LockTable<K, L> {
    entries: RwLock<HashMap<K, Arc<L>>>,
}

impl<K, L> LockTable<K, L>
where
    K: Eq + Hash + Clone,
    L: Default,
{
    pub fn new() -> Self {
        LockTable {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Get the lock for `key`, creating it if this is the first access.
    pub fn of(&self, key: &K) -> Arc<L> {
        if let Some(lock) = self.entries.read().get(key) {
            return lock.clone();
        }

        // lost the fast path; whoever wins the entry below wins for good
        self.entries
            .write()
            .entry(key.clone())
            .or_default()
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl<K, L> Default for LockTable<K, L>
where
    K: Eq + Hash + Clone,
    L: Default,
{
    fn default() -> Self {
        Self::new()
    }
}
