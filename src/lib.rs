//! bucket-hashmap: a growable hash map over byte keys with six-slot
//! buckets, an overflow region per bucket, and synchronous doubling.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a map whose behavior under collisions, growth and removal is
//!   fully predictable from the hash alone, built in small layers.
//! - Layers:
//!   - hash: 32-bit shift-add multiplicative hash. The top `size_log2`
//!     bits select a bucket; the low byte ("extra") is cached per entry.
//!   - bucket: six inline slots plus a lazily allocated overflow vector.
//!     Owns insert/override/lookup/remove inside one bucket.
//!   - BucketMap<K, V, S>: the bucket array, the load-factor check, and
//!     the rehash that doubles the array.
//!   - SyncBucketMap<K, V, S>: BucketMap behind a single mutex.
//!
//! Constraints
//! - Keys are compared by the bytes `K: AsRef<[u8]>` exposes. Lengths and
//!   the extra byte are checked before any byte comparison.
//! - Starting size is 8 buckets; the table doubles when `len` reaches
//!   `0.75 * buckets * 6` and never shrinks.
//! - The load factor is checked before every insert, overrides included.
//! - Overwriting a key replaces the stored key and value; `len` is
//!   unchanged.
//! - Removal empties the slot in place. Emptied slots are reused by later
//!   inserts into the same bucket, but only after the whole bucket has been
//!   scanned for the key, so a key is never stored twice.
//!
//! Growth and failure
//! - Every allocation is fallible: the bucket array and overflow regions
//!   use `try_reserve*` and report `MapError::OutOfMemory`.
//! - Rehash reserves everything it needs before moving the first entry,
//!   so a failed growth leaves the map intact.
//! - Overflow regions are unbounded by default. With
//!   `MapConfig::overflow_max_len` set, a bucket at the cap reports itself
//!   full; the map grows and retries up to `max_full_retries` times before
//!   returning `MapError::BucketSaturated`.
//! - Growth beyond `max_size_log2` returns `MapError::CapacityExceeded`.
//!
//! Values
//! - `Value<'a, T>` stores either a caller-owned borrow or an owned box.
//!   Owned values are dropped with their entry; borrowed ones never are.
//!   `ByteMap<'a>` pairs boxed byte keys with such values.
//!
//! Notes and non-goals
//! - No iteration-order guarantee; iteration walks buckets in index order.
//! - No incremental rehash, no shrinking, no per-bucket locking.
//! - The default hash is not collision resistant; plug in another
//!   `BuildHasher` via `with_hasher` if keys are adversarial.

mod bucket;
mod bucket_map;
mod bucket_map_proptest;
pub mod bytes;
pub mod config;
mod error;
pub mod hash;
mod sync_map;
mod value;

// Public surface
pub use bucket::BUCKET_SIZE;
pub use bucket_map::{BucketMap, BucketStats, ByteMap, Iter, IterMut};
pub use config::MapConfig;
pub use error::MapError;
pub use hash::{BuildShiftAddHasher, ShiftAddHasher};
pub use sync_map::SyncBucketMap;
pub use value::Value;
