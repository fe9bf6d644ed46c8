//! BucketMap: power-of-two bucket array with synchronous rehash on growth.

use crate::bucket::{self, Bucket, Entry, Insert, Slots, SlotsMut, BUCKET_SIZE};
use crate::config::{MapConfig, DEFAULT_SIZE_LOG2};
use crate::error::MapError;
use crate::hash::{bucket_index, hash_extra, hash_with, BuildShiftAddHasher};
use crate::value::Value;
use core::fmt;
use core::hash::BuildHasher;
use core::iter::FusedIterator;
use core::mem;
use core::slice;

/// Byte keys mapped to borrowed or owned byte values.
pub type ByteMap<'a> = BucketMap<Box<[u8]>, Value<'a, [u8]>>;

/// Hash map over byte-addressable keys.
///
/// Keys are compared by the bytes `K::as_ref` exposes, never by `Eq`. Each
/// key's 32-bit hash picks a bucket with its top bits; a bucket holds six
/// entries inline and spills further colliding keys into an overflow
/// vector. The table doubles when the load factor reaches
/// `MapConfig::max_load_factor`, rehashing every entry before the
/// triggering insert proceeds.
///
/// ```
/// use bucket_hashmap::BucketMap;
///
/// let mut m = BucketMap::new();
/// m.insert("a", 1)?;
/// m.insert("b", 2)?;
/// assert_eq!(m.insert("a", 3)?, Some(1));
/// assert_eq!(m.len(), 2);
/// assert_eq!(m.get("a"), Some(&3));
/// assert!(m.remove("b"));
/// assert_eq!(m.get("b"), None);
/// # Ok::<(), bucket_hashmap::MapError>(())
/// ```
pub struct BucketMap<K, V, S = BuildShiftAddHasher> {
    buckets: Vec<Bucket<K, V>>,
    size_log2: u32,
    len: usize,
    hasher: S,
    config: MapConfig,
}

/// Occupancy snapshot, see [`BucketMap::stats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BucketStats {
    pub buckets: usize,
    pub empty_buckets: usize,
    /// Buckets whose overflow region has been allocated.
    pub overflowing_buckets: usize,
    /// Live entries stored outside the inline slots.
    pub overflow_entries: usize,
    /// Live entries in the fullest bucket.
    pub longest_bucket: usize,
}

impl<K, V> BucketMap<K, V>
where
    K: AsRef<[u8]>,
{
    pub fn new() -> Self {
        Self::with_hasher(BuildShiftAddHasher)
    }

    pub fn with_config(config: MapConfig) -> Result<Self, MapError> {
        Self::with_config_and_hasher(config, BuildShiftAddHasher)
    }

    /// Sized so that `capacity` insertions of distinct keys do not grow.
    pub fn with_capacity(capacity: usize) -> Result<Self, MapError> {
        Self::with_config(MapConfig::for_capacity(capacity))
    }
}

impl<K, V> Default for BucketMap<K, V>
where
    K: AsRef<[u8]>,
{
    fn default() -> Self {
        Self::new()
    }
}

fn alloc_buckets<K, V>(size_log2: u32, max_size_log2: u32) -> Result<Vec<Bucket<K, V>>, MapError>
where
    K: AsRef<[u8]>,
{
    let n = 1usize
        .checked_shl(size_log2)
        .ok_or(MapError::CapacityExceeded { max_size_log2 })?;
    let mut buckets = Vec::new();
    buckets.try_reserve_exact(n)?;
    buckets.resize_with(n, Bucket::new);
    Ok(buckets)
}

impl<K, V, S> BucketMap<K, V, S>
where
    K: AsRef<[u8]>,
    S: BuildHasher,
{
    /// Default-configured map using `hasher` for bucket selection.
    pub fn with_hasher(hasher: S) -> Self {
        let n = 1usize << DEFAULT_SIZE_LOG2;
        Self {
            buckets: (0..n).map(|_| Bucket::new()).collect(),
            size_log2: DEFAULT_SIZE_LOG2,
            len: 0,
            hasher,
            config: MapConfig::default(),
        }
    }

    pub fn with_config_and_hasher(config: MapConfig, hasher: S) -> Result<Self, MapError> {
        config.validate()?;
        let buckets = alloc_buckets(config.initial_size_log2, config.max_size_log2)?;
        Ok(Self {
            buckets,
            size_log2: config.initial_size_log2,
            len: 0,
            hasher,
            config,
        })
    }

    #[inline]
    fn locate(&self, bytes: &[u8]) -> (usize, u8) {
        let hash = hash_with(&self.hasher, bytes);
        (bucket_index(hash, self.size_log2), hash_extra(hash))
    }

    /// Inserts `value` under `key`, returning the value it replaced.
    ///
    /// When the key is already present both the stored key and value are
    /// replaced and `len` is unchanged. The load factor is checked before
    /// inserting and the table grows first if it has been reached.
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>, MapError> {
        if !self.config.holds(self.size_log2, self.len) {
            self.grow()?;
        }

        let hash = hash_with(&self.hasher, key.as_ref());
        let limits = self.config.overflow_limits();
        let mut entry = Entry::new(key, value, hash_extra(hash));
        let mut attempts = 0;
        loop {
            let idx = bucket_index(hash, self.size_log2);
            match self.buckets[idx].insert(entry, limits)? {
                Insert::Success => {
                    self.len += 1;
                    return Ok(None);
                }
                Insert::Override(old) => return Ok(Some(old)),
                Insert::Full(back) => {
                    if attempts == self.config.max_full_retries {
                        log::warn!(
                            "bucket {} still full at 2^{} buckets after {} growth attempts",
                            idx,
                            self.size_log2,
                            attempts
                        );
                        return Err(MapError::BucketSaturated { attempts });
                    }
                    attempts += 1;
                    self.grow()?;
                    entry = back;
                }
            }
        }
    }

    /// Inserts every pair from `iter`, stopping at the first error.
    pub fn try_extend<I>(&mut self, iter: I) -> Result<(), MapError>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        for (k, v) in iter {
            self.insert(k, v)?;
        }
        Ok(())
    }

    fn find<Q>(&self, key: &Q) -> Option<&Entry<K, V>>
    where
        Q: ?Sized + AsRef<[u8]>,
    {
        if self.len == 0 {
            return None;
        }
        let bytes = key.as_ref();
        let (idx, extra) = self.locate(bytes);
        self.buckets[idx].get(bytes, extra)
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        Q: ?Sized + AsRef<[u8]>,
    {
        self.find(key).map(|e| &e.value)
    }

    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        Q: ?Sized + AsRef<[u8]>,
    {
        self.find(key).map(|e| (&e.key, &e.value))
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        Q: ?Sized + AsRef<[u8]>,
    {
        if self.len == 0 {
            return None;
        }
        let bytes = key.as_ref();
        let (idx, extra) = self.locate(bytes);
        self.buckets[idx].get_mut(bytes, extra).map(|e| &mut e.value)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        Q: ?Sized + AsRef<[u8]>,
    {
        self.find(key).is_some()
    }

    /// Removes `key`, returning whether it was present.
    ///
    /// The slot is emptied in place; buckets are never compacted and the
    /// table never shrinks.
    pub fn remove<Q>(&mut self, key: &Q) -> bool
    where
        Q: ?Sized + AsRef<[u8]>,
    {
        self.remove_entry(key).is_some()
    }

    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        Q: ?Sized + AsRef<[u8]>,
    {
        if self.len == 0 {
            return None;
        }
        let bytes = key.as_ref();
        let (idx, extra) = self.locate(bytes);
        let entry = self.buckets[idx].remove(bytes, extra)?;
        self.len -= 1;
        Some((entry.key, entry.value))
    }

    /// Doubles the bucket array and moves every entry into it.
    ///
    /// All storage the move needs is reserved before the first entry is
    /// taken out of the old array, so an allocation failure leaves the map
    /// as it was.
    fn grow(&mut self) -> Result<(), MapError> {
        let max = self.config.max_size_log2;
        let new_log2 = self.size_log2 + 1;
        if new_log2 > max {
            return Err(MapError::CapacityExceeded { max_size_log2: max });
        }
        log::debug!(
            "growing bucket array from 2^{} to 2^{} buckets with {} entries",
            self.size_log2,
            new_log2,
            self.len
        );

        let mut fresh = alloc_buckets(new_log2, max)?;
        let mut counts: Vec<usize> = Vec::new();
        counts.try_reserve_exact(fresh.len())?;
        counts.resize(fresh.len(), 0);
        for e in self.buckets.iter().flat_map(Bucket::slots).flatten() {
            let hash = hash_with(&self.hasher, e.key.as_ref());
            counts[bucket_index(hash, new_log2)] += 1;
        }
        let limits = self.config.overflow_limits().unbounded();
        for (b, &n) in fresh.iter_mut().zip(&counts) {
            if n > BUCKET_SIZE {
                b.reserve_overflow((n - BUCKET_SIZE).max(limits.initial))?;
            }
        }
        drop(counts);

        let old = mem::replace(&mut self.buckets, fresh);
        self.size_log2 = new_log2;
        for entry in old.into_iter().flat_map(Bucket::into_entries) {
            let hash = hash_with(&self.hasher, entry.key.as_ref());
            let idx = bucket_index(hash, new_log2);
            let placed = self.buckets[idx].insert(entry, limits)?;
            debug_assert!(matches!(placed, Insert::Success));
        }
        Ok(())
    }
}

impl<K, V, S> BucketMap<K, V, S> {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn size_log2(&self) -> u32 {
        self.size_log2
    }

    pub fn num_buckets(&self) -> usize {
        self.buckets.len()
    }

    /// `len / (num_buckets * BUCKET_SIZE)`.
    pub fn load_factor(&self) -> f64 {
        self.len as f64 / (self.buckets.len() * BUCKET_SIZE) as f64
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    /// Every key, in bucket order. The vector holds exactly `len` items.
    pub fn keys(&self) -> Vec<&K> {
        let mut out = Vec::with_capacity(self.len);
        out.extend(self.iter().map(|(k, _)| k));
        out
    }

    /// Every value, in the same order as [`keys`](Self::keys).
    pub fn values(&self) -> Vec<&V> {
        let mut out = Vec::with_capacity(self.len);
        out.extend(self.iter().map(|(_, v)| v));
        out
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            buckets: self.buckets.iter(),
            slots: bucket::empty_slots(),
            remaining: self.len,
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            buckets: self.buckets.iter_mut(),
            slots: bucket::empty_slots_mut(),
            remaining: self.len,
        }
    }

    pub fn stats(&self) -> BucketStats {
        let mut s = BucketStats {
            buckets: self.buckets.len(),
            ..BucketStats::default()
        };
        for b in &self.buckets {
            let live = b.live();
            if live == 0 {
                s.empty_buckets += 1;
            }
            if b.has_overflow() {
                s.overflowing_buckets += 1;
            }
            s.overflow_entries += b.overflow_live();
            s.longest_bucket = s.longest_bucket.max(live);
        }
        s
    }
}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for BucketMap<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, K, V, S> IntoIterator for &'a BucketMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a mut BucketMap<K, V, S> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> IterMut<'a, K, V> {
        self.iter_mut()
    }
}

/// Iterator over immutable entries in `BucketMap`.
pub struct Iter<'a, K, V> {
    buckets: slice::Iter<'a, Bucket<K, V>>,
    slots: Slots<'a, K, V>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.slots.next() {
                Some(Some(e)) => {
                    self.remaining -= 1;
                    return Some((&e.key, &e.value));
                }
                Some(None) => {}
                None => self.slots = self.buckets.next()?.slots(),
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// Iterator over mutable entries in `BucketMap`.
pub struct IterMut<'a, K, V> {
    buckets: slice::IterMut<'a, Bucket<K, V>>,
    slots: SlotsMut<'a, K, V>,
    remaining: usize,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.slots.next() {
                Some(Some(Entry { key, value, .. })) => {
                    self.remaining -= 1;
                    return Some((&*key, value));
                }
                Some(None) => {}
                None => self.slots = self.buckets.next()?.slots_mut(),
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> FusedIterator for IterMut<'_, K, V> {}

#[cfg(test)]
impl<K, V, S> BucketMap<K, V, S>
where
    K: AsRef<[u8]>,
    S: BuildHasher,
{
    /// Panics if any structural invariant is broken:
    /// - every entry sits in the bucket its hash selects, with the matching
    ///   extra byte;
    /// - no bucket holds the same key bytes twice;
    /// - `len` equals the number of live slots.
    pub(crate) fn assert_invariants(&self) {
        assert_eq!(self.buckets.len(), 1usize << self.size_log2);
        let mut live = 0;
        for (idx, b) in self.buckets.iter().enumerate() {
            let entries: Vec<&Entry<K, V>> = b.slots().flatten().collect();
            for (i, e) in entries.iter().enumerate() {
                let hash = hash_with(&self.hasher, e.key.as_ref());
                assert_eq!(bucket_index(hash, self.size_log2), idx, "entry in wrong bucket");
                assert_eq!(hash_extra(hash), e.extra, "stale extra byte");
                for other in &entries[i + 1..] {
                    assert_ne!(e.key.as_ref(), other.key.as_ref(), "duplicate key in bucket");
                }
            }
            assert_eq!(entries.len(), b.live());
            live += entries.len();
        }
        assert_eq!(live, self.len);
    }

    pub(crate) fn bucket_of<Q: ?Sized + AsRef<[u8]>>(&self, key: &Q) -> usize {
        self.locate(key.as_ref()).0
    }
}
