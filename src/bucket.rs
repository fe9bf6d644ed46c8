//! Bucket: six inline entry slots plus a lazily allocated overflow region.
//!
//! Lookups scan at most `BUCKET_SIZE` inline slots before touching the
//! overflow vector. A slot is only byte-compared after its cached hash
//! byte and key length both match the probe.

use crate::bytes::bytes_eq;
use crate::error::MapError;
use core::iter::Chain;
use core::mem;
use core::slice;

/// Inline slots per bucket.
pub const BUCKET_SIZE: usize = 6;

pub(crate) struct Entry<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    key_len: usize,
    pub(crate) extra: u8,
}

impl<K: AsRef<[u8]>, V> Entry<K, V> {
    pub(crate) fn new(key: K, value: V, extra: u8) -> Self {
        let key_len = key.as_ref().len();
        Self {
            key,
            value,
            key_len,
            extra,
        }
    }

    #[inline]
    fn matches(&self, bytes: &[u8], extra: u8) -> bool {
        self.extra == extra && self.key_len == bytes.len() && bytes_eq(self.key.as_ref(), bytes)
    }
}

/// Allocation policy for overflow regions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct OverflowLimits {
    pub(crate) initial: usize,
    pub(crate) max_len: Option<usize>,
}

impl OverflowLimits {
    /// Same first allocation, no length limit. Used while rehashing.
    pub(crate) fn unbounded(self) -> Self {
        Self {
            max_len: None,
            ..self
        }
    }
}

/// Outcome of inserting into a single bucket.
pub(crate) enum Insert<K, V> {
    /// Placed in a free slot; the map's length grows by one.
    Success,
    /// Same key already present; carries the replaced value.
    Override(V),
    /// Inline slots and overflow region are both at capacity. The entry is
    /// handed back untouched.
    Full(Entry<K, V>),
}

pub(crate) type Slots<'a, K, V> =
    Chain<slice::Iter<'a, Option<Entry<K, V>>>, slice::Iter<'a, Option<Entry<K, V>>>>;
pub(crate) type SlotsMut<'a, K, V> =
    Chain<slice::IterMut<'a, Option<Entry<K, V>>>, slice::IterMut<'a, Option<Entry<K, V>>>>;

/// Spill storage for a bucket whose inline slots are taken.
///
/// Unallocated until first needed. Removed slots are left as `None` and
/// reused before the vector is extended.
pub(crate) struct OverflowBucket<K, V> {
    slots: Vec<Option<Entry<K, V>>>,
    live: usize,
}

impl<K, V> OverflowBucket<K, V> {
    const fn new() -> Self {
        Self {
            slots: Vec::new(),
            live: 0,
        }
    }

    fn is_allocated(&self) -> bool {
        self.slots.capacity() > 0
    }
}

impl<K: AsRef<[u8]>, V> OverflowBucket<K, V> {
    fn position(&self, bytes: &[u8], extra: u8) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| s.as_ref().is_some_and(|e| e.matches(bytes, extra)))
    }

    fn push(&mut self, entry: Entry<K, V>, limits: OverflowLimits) -> Result<Insert<K, V>, MapError> {
        if let Some(slot) = self.slots.iter_mut().find(|s| s.is_none()) {
            *slot = Some(entry);
            self.live += 1;
            return Ok(Insert::Success);
        }
        if limits.max_len.is_some_and(|max| self.slots.len() >= max) {
            return Ok(Insert::Full(entry));
        }
        if !self.is_allocated() {
            let first = limits.max_len.map_or(limits.initial, |m| m.min(limits.initial));
            self.slots.try_reserve_exact(first)?;
            log::trace!("allocated overflow region of {} slots", first);
        } else {
            self.slots.try_reserve(1)?;
        }
        self.slots.push(Some(entry));
        self.live += 1;
        Ok(Insert::Success)
    }
}

pub(crate) struct Bucket<K, V> {
    inline: [Option<Entry<K, V>>; BUCKET_SIZE],
    overflow: OverflowBucket<K, V>,
}

impl<K: AsRef<[u8]>, V> Bucket<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            inline: Default::default(),
            overflow: OverflowBucket::new(),
        }
    }

    /// Inserts or overwrites `entry`.
    ///
    /// The whole bucket is searched for the key before a free slot is
    /// taken, so a key living in the overflow region is never duplicated
    /// into an inline slot freed by an earlier removal.
    pub(crate) fn insert(
        &mut self,
        entry: Entry<K, V>,
        limits: OverflowLimits,
    ) -> Result<Insert<K, V>, MapError> {
        let mut vacant = None;
        for (i, slot) in self.inline.iter_mut().enumerate() {
            match slot {
                Some(e) if e.matches(entry.key.as_ref(), entry.extra) => {
                    let old = mem::replace(e, entry);
                    return Ok(Insert::Override(old.value));
                }
                None if vacant.is_none() => vacant = Some(i),
                _ => {}
            }
        }

        if let Some(i) = self.overflow.position(entry.key.as_ref(), entry.extra) {
            if let Some(e) = self.overflow.slots[i].as_mut() {
                let old = mem::replace(e, entry);
                return Ok(Insert::Override(old.value));
            }
        }

        match vacant {
            Some(i) => {
                self.inline[i] = Some(entry);
                Ok(Insert::Success)
            }
            None => self.overflow.push(entry, limits),
        }
    }

    pub(crate) fn get(&self, bytes: &[u8], extra: u8) -> Option<&Entry<K, V>> {
        self.slots()
            .flatten()
            .find(|e| e.matches(bytes, extra))
    }

    pub(crate) fn get_mut(&mut self, bytes: &[u8], extra: u8) -> Option<&mut Entry<K, V>> {
        self.slots_mut()
            .flatten()
            .find(|e| e.matches(bytes, extra))
    }

    /// Takes the matching entry out, leaving its slot empty.
    pub(crate) fn remove(&mut self, bytes: &[u8], extra: u8) -> Option<Entry<K, V>> {
        for slot in self.inline.iter_mut() {
            if slot.as_ref().is_some_and(|e| e.matches(bytes, extra)) {
                return slot.take();
            }
        }
        let i = self.overflow.position(bytes, extra)?;
        let entry = self.overflow.slots[i].take();
        self.overflow.live -= 1;
        entry
    }

    /// Consumes the bucket, yielding its live entries (inline first).
    pub(crate) fn into_entries(self) -> impl Iterator<Item = Entry<K, V>> {
        self.inline
            .into_iter()
            .chain(self.overflow.slots)
            .flatten()
    }

    /// Reserves room for `additional` overflow entries up front.
    pub(crate) fn reserve_overflow(&mut self, additional: usize) -> Result<(), MapError> {
        self.overflow.slots.try_reserve_exact(additional)?;
        Ok(())
    }
}

impl<K, V> Bucket<K, V> {
    pub(crate) fn live(&self) -> usize {
        self.inline.iter().filter(|s| s.is_some()).count() + self.overflow.live
    }

    pub(crate) fn overflow_live(&self) -> usize {
        self.overflow.live
    }

    pub(crate) fn has_overflow(&self) -> bool {
        self.overflow.is_allocated()
    }

    pub(crate) fn slots(&self) -> Slots<'_, K, V> {
        self.inline.iter().chain(self.overflow.slots.iter())
    }

    pub(crate) fn slots_mut(&mut self) -> SlotsMut<'_, K, V> {
        self.inline.iter_mut().chain(self.overflow.slots.iter_mut())
    }
}

pub(crate) fn empty_slots<'a, K, V>() -> Slots<'a, K, V> {
    <&[Option<Entry<K, V>>]>::default()
        .iter()
        .chain(<&[Option<Entry<K, V>>]>::default().iter())
}

pub(crate) fn empty_slots_mut<'a, K, V>() -> SlotsMut<'a, K, V> {
    <&mut [Option<Entry<K, V>>]>::default()
        .iter_mut()
        .chain(<&mut [Option<Entry<K, V>>]>::default().iter_mut())
}
