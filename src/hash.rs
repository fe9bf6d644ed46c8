//! Shift-add multiplicative hash and the index/extra split.
//!
//! The map only ever needs 32 bits of hash. The top `size_log2` bits pick
//! the bucket, so doubling the table sends the entries of old bucket `i`
//! to new buckets `2i` and `2i + 1`. The low byte is cached next to each
//! entry as a cheap pre-filter before comparing key bytes.

use core::hash::{BuildHasher, Hasher};

/// Odd multiplier applied after folding in the key bytes.
pub const MULTIPLIER: u32 = 1_327_217_885;

/// Hashes `bytes` with the default function.
#[inline]
pub fn hash_bytes(bytes: &[u8]) -> u32 {
    let mut h = ShiftAddHasher::default();
    h.write(bytes);
    h.finish() as u32
}

/// `h += (h << 5) + byte` over the input, multiplied by [`MULTIPLIER`] in
/// `finish`. Not collision resistant.
#[derive(Clone, Copy, Debug, Default)]
pub struct ShiftAddHasher {
    state: u32,
}

impl Hasher for ShiftAddHasher {
    #[inline]
    fn write(&mut self, bytes: &[u8]) {
        let mut k = self.state;
        for &b in bytes {
            k = k.wrapping_add((k << 5).wrapping_add(u32::from(b)));
        }
        self.state = k;
    }

    #[inline]
    fn finish(&self) -> u64 {
        u64::from(self.state.wrapping_mul(MULTIPLIER))
    }
}

/// Default `BuildHasher` for `BucketMap`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuildShiftAddHasher;

impl BuildHasher for BuildShiftAddHasher {
    type Hasher = ShiftAddHasher;

    #[inline]
    fn build_hasher(&self) -> ShiftAddHasher {
        ShiftAddHasher::default()
    }
}

/// Hashes raw key bytes with any `BuildHasher`, truncated to 32 bits.
///
/// Bytes go through a single `write` call so no length prefix is mixed in.
#[inline]
pub(crate) fn hash_with<S: BuildHasher>(builder: &S, bytes: &[u8]) -> u32 {
    let mut h = builder.build_hasher();
    h.write(bytes);
    h.finish() as u32
}

/// Bucket index: the top `size_log2` bits of `hash`.
#[inline]
pub fn bucket_index(hash: u32, size_log2: u32) -> usize {
    debug_assert!(size_log2 <= 32);
    (u64::from(hash) >> (32 - size_log2)) as usize
}

/// Low byte of `hash`, stored per entry.
#[inline]
pub fn hash_extra(hash: u32) -> u8 {
    (hash & 0xFF) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(bytes: &[u8]) -> u32 {
        let mut k: u32 = 0;
        for &b in bytes {
            k = k.wrapping_add(k.wrapping_shl(5)).wrapping_add(b as u32);
        }
        k.wrapping_mul(MULTIPLIER)
    }

    #[test]
    fn empty_input_hashes_to_zero() {
        assert_eq!(hash_bytes(b""), 0);
    }

    #[test]
    fn matches_the_shift_add_rule() {
        for input in [&b"a"[..], b"key", b"hello world", &[0xFF; 40]] {
            assert_eq!(hash_bytes(input), reference(input));
        }
        // Single byte: h = b, then multiplied.
        assert_eq!(hash_bytes(b"a"), 97u32.wrapping_mul(MULTIPLIER));
    }

    #[test]
    fn split_writes_are_equivalent_to_one_write() {
        let mut h = ShiftAddHasher::default();
        h.write(b"hel");
        h.write(b"lo");
        assert_eq!(h.finish() as u32, hash_bytes(b"hello"));
    }

    #[test]
    fn hash_with_default_builder_matches_hash_bytes() {
        assert_eq!(hash_with(&BuildShiftAddHasher, b"abc"), hash_bytes(b"abc"));
    }

    #[test]
    fn index_uses_top_bits() {
        let h = 0b1010_0000_0000_0000_0000_0000_0000_0001u32;
        assert_eq!(bucket_index(h, 0), 0);
        assert_eq!(bucket_index(h, 1), 1);
        assert_eq!(bucket_index(h, 3), 0b101);
        assert_eq!(bucket_index(h, 32), h as usize);
        assert_eq!(hash_extra(h), 1);
    }

    #[test]
    fn growing_splits_each_bucket_in_two() {
        for key in ["a", "b", "alpha", "omega", "k123"] {
            let h = hash_bytes(key.as_bytes());
            for log2 in 1..31 {
                let old = bucket_index(h, log2);
                let new = bucket_index(h, log2 + 1);
                assert!(new == old * 2 || new == old * 2 + 1);
            }
        }
    }
}
