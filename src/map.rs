use crate::lock::LockTable;

use parking_lot::{Mutex, RwLock};

use hashbrown::HashMap;

use std::hash::Hash;

/// A `Loader` is a type with a method [`Loader::load`] that maps a key to a value
pub trait Loader<K, V> {
    type Error;

    fn load(&self, key: &K) -> Result<V, Self::Error>;
}

impl<K, V, F, E> Loader<K, V> for F
where
    F: Fn(&K) -> Result<V, E>,
{
    type Error = E;

    fn load(&self, key: &K) -> Result<V, E> {
        self(key)
    }
}

/// A lazily populated map with no client-facing writer besides [`LazyMap::put`].
///
/// Values are produced by the [`Loader`] on first access. Each key has its own
/// lock, so a miss on one key never blocks a get of another, and concurrent
/// misses on the same key run the loader exactly once.
///
/// A failed load caches nothing; the error goes back to the caller and the
/// next get of that key tries again.
pub struct LazyMap<K, V, L> {
    inner: RwLock<HashMap<K, V>>,
    lockers: LockTable<K, Mutex<()>>,
    loader: L,
}

impl<K, V, L> LazyMap<K, V, L>
where
    K: Eq + Hash + Clone,
{
    pub fn new(loader: L) -> Self {
        LazyMap {
            inner: RwLock::new(HashMap::new()),
            lockers: LockTable::new(),
            loader,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().len() == 0
    }
}

impl<K, V, L> LazyMap<K, V, L>
where
    K: Eq + Hash + Clone,
    V: Clone,
    L: Loader<K, V>,
{
    /// Get the value for `key`, loading it if this map has not seen it yet.
    ///
    /// A present key returns immediately without touching the per-key lock.
    /// On a miss the key's lock is taken, presence is re-checked, and only
    /// then does the loader run.
    pub fn get(&self, key: &K) -> Result<V, L::Error> {
        if let Some(value) = self.inner.read().get(key) {
            return Ok(value.clone());
        }

        let locker = self.lockers.of(key);
        let _held = locker.lock();

        // another thread may have finished loading while we waited
        if let Some(value) = self.inner.read().get(key) {
            return Ok(value.clone());
        }

        let value = self.loader.load(key)?;
        self.inner.write().insert(key.clone(), value.clone());

        Ok(value)
    }

    /// Administrative write, serialized against any in-flight load of `key`.
    pub fn put(&self, key: K, value: V) {
        let locker = self.lockers.of(&key);
        let _held = locker.lock();

        self.inner.write().insert(key, value);
    }
}
