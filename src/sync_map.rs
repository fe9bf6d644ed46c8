//! SyncBucketMap: `BucketMap` behind one per-map mutex.
//!
//! Every method takes the lock exactly once and holds it for the whole
//! operation, including any growth the operation triggers. There is no
//! read/write split and no per-bucket locking. Use [`SyncBucketMap::lock`]
//! to run several operations under one acquisition.

use crate::bucket_map::BucketMap;
use crate::config::MapConfig;
use crate::error::MapError;
use crate::hash::BuildShiftAddHasher;
use core::fmt;
use core::hash::BuildHasher;
use parking_lot::{Mutex, MutexGuard};

pub struct SyncBucketMap<K, V, S = BuildShiftAddHasher> {
    inner: Mutex<BucketMap<K, V, S>>,
}

impl<K, V> SyncBucketMap<K, V>
where
    K: AsRef<[u8]>,
{
    pub fn new() -> Self {
        Self::from_map(BucketMap::new())
    }

    pub fn with_config(config: MapConfig) -> Result<Self, MapError> {
        BucketMap::with_config(config).map(Self::from_map)
    }
}

impl<K, V> Default for SyncBucketMap<K, V>
where
    K: AsRef<[u8]>,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> From<BucketMap<K, V, S>> for SyncBucketMap<K, V, S> {
    fn from(map: BucketMap<K, V, S>) -> Self {
        Self::from_map(map)
    }
}

impl<K, V, S> SyncBucketMap<K, V, S> {
    pub fn from_map(map: BucketMap<K, V, S>) -> Self {
        Self {
            inner: Mutex::new(map),
        }
    }

    /// Acquires the map's lock for a sequence of operations.
    pub fn lock(&self) -> MutexGuard<'_, BucketMap<K, V, S>> {
        self.inner.lock()
    }

    pub fn into_inner(self) -> BucketMap<K, V, S> {
        self.inner.into_inner()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

impl<K, V, S> SyncBucketMap<K, V, S>
where
    K: AsRef<[u8]>,
    S: BuildHasher,
{
    pub fn with_config_and_hasher(config: MapConfig, hasher: S) -> Result<Self, MapError> {
        BucketMap::with_config_and_hasher(config, hasher).map(Self::from_map)
    }

    pub fn insert(&self, key: K, value: V) -> Result<Option<V>, MapError> {
        self.inner.lock().insert(key, value)
    }

    /// Clones the value out from under the lock.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        Q: ?Sized + AsRef<[u8]>,
        V: Clone,
    {
        self.inner.lock().get(key).cloned()
    }

    /// Runs `f` on the value while the lock is held.
    pub fn with_value<Q, R, F>(&self, key: &Q, f: F) -> Option<R>
    where
        Q: ?Sized + AsRef<[u8]>,
        F: FnOnce(&V) -> R,
    {
        self.inner.lock().get(key).map(f)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        Q: ?Sized + AsRef<[u8]>,
    {
        self.inner.lock().contains_key(key)
    }

    pub fn remove<Q>(&self, key: &Q) -> bool
    where
        Q: ?Sized + AsRef<[u8]>,
    {
        self.inner.lock().remove(key)
    }

    pub fn remove_entry<Q>(&self, key: &Q) -> Option<(K, V)>
    where
        Q: ?Sized + AsRef<[u8]>,
    {
        self.inner.lock().remove_entry(key)
    }

    pub fn keys(&self) -> Vec<K>
    where
        K: Clone,
    {
        self.inner.lock().keys().into_iter().cloned().collect()
    }

    pub fn values(&self) -> Vec<V>
    where
        V: Clone,
    {
        self.inner.lock().values().into_iter().cloned().collect()
    }
}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for SyncBucketMap<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_lock() {
            Some(map) => fmt::Debug::fmt(&*map, f),
            None => f.write_str("SyncBucketMap { <locked> }"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn basic_operations_take_the_lock() {
        let m = SyncBucketMap::new();
        assert_eq!(m.insert("a", 1).unwrap(), None);
        assert_eq!(m.insert("a", 2).unwrap(), Some(1));
        assert_eq!(m.get("a"), Some(2));
        assert_eq!(m.with_value("a", |v| v * 10), Some(20));
        assert!(m.contains_key("a"));
        assert!(m.remove("a"));
        assert!(!m.remove("a"));
        assert!(m.is_empty());
    }

    /// Invariant: inserts from several threads are serialized; every key
    /// lands exactly once and growth under contention loses nothing.
    #[test]
    fn concurrent_writers_lose_nothing() {
        let m: Arc<SyncBucketMap<String, usize>> = Arc::new(SyncBucketMap::new());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let m = Arc::clone(&m);
                thread::spawn(move || {
                    for i in 0..500 {
                        m.insert(format!("t{}-{}", t, i), i).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(m.len(), 2000);
        for t in 0..4 {
            for i in 0..500 {
                assert_eq!(m.get(&format!("t{}-{}", t, i)), Some(i));
            }
        }
        let map = Arc::try_unwrap(m).ok().unwrap().into_inner();
        map.assert_invariants();
    }

    #[test]
    fn lock_allows_compound_updates() {
        let m = SyncBucketMap::new();
        m.insert("counter", 0u64).unwrap();
        {
            let mut g = m.lock();
            let v = g.get_mut("counter").unwrap();
            *v += 5;
        }
        assert_eq!(m.get("counter"), Some(5));
    }

    #[test]
    fn debug_while_locked_does_not_deadlock() {
        let m = SyncBucketMap::new();
        m.insert("k", 1).unwrap();
        assert_eq!(format!("{:?}", m), "{\"k\": 1}");
        let _g = m.lock();
        assert_eq!(format!("{:?}", m), "SyncBucketMap { <locked> }");
    }
}
