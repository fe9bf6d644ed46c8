//! Tunables for `BucketMap`.

use crate::bucket::{OverflowLimits, BUCKET_SIZE};
use crate::error::MapError;

/// Default starting table: `2^3 = 8` buckets.
pub const DEFAULT_SIZE_LOG2: u32 = 3;

/// Hard ceiling; the index is taken from a 32-bit hash.
pub const MAX_SIZE_LOG2: u32 = 32;

pub const DEFAULT_LOAD_FACTOR: f64 = 0.75;

/// Slots reserved the first time a bucket spills into its overflow region.
pub const DEFAULT_OVERFLOW_CAPACITY: usize = 4;

pub const DEFAULT_FULL_RETRIES: u32 = 3;

/// Sizing and growth policy of a `BucketMap`.
///
/// ```
/// use bucket_hashmap::MapConfig;
///
/// let config = MapConfig::default()
///     .initial_size_log2(6)
///     .overflow_max_len(Some(8));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct MapConfig {
    /// `log2` of the bucket count a new map starts with.
    pub initial_size_log2: u32,
    /// Growth fails with `CapacityExceeded` beyond this.
    pub max_size_log2: u32,
    /// Growth is triggered when `len / (buckets * 6)` reaches this.
    pub max_load_factor: f64,
    pub overflow_initial_capacity: usize,
    /// Longest a single overflow region may get; `None` lets it grow like
    /// any vector. When set, a bucket at the limit reports itself full and
    /// the map grows to redistribute it.
    pub overflow_max_len: Option<usize>,
    /// How many growth events one insertion may trigger because its bucket
    /// was full before giving up with `BucketSaturated`.
    pub max_full_retries: u32,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            initial_size_log2: DEFAULT_SIZE_LOG2,
            max_size_log2: MAX_SIZE_LOG2,
            max_load_factor: DEFAULT_LOAD_FACTOR,
            overflow_initial_capacity: DEFAULT_OVERFLOW_CAPACITY,
            overflow_max_len: None,
            max_full_retries: DEFAULT_FULL_RETRIES,
        }
    }
}

impl MapConfig {
    /// Default config with a starting size large enough that `capacity`
    /// entries fit without growing.
    pub fn for_capacity(capacity: usize) -> Self {
        let config = Self::default();
        let mut log2 = config.initial_size_log2;
        let before_last = capacity.saturating_sub(1);
        while log2 < config.max_size_log2 && !config.holds(log2, before_last) {
            log2 += 1;
        }
        config.initial_size_log2(log2)
    }

    pub fn initial_size_log2(mut self, log2: u32) -> Self {
        self.initial_size_log2 = log2;
        self
    }

    pub fn max_size_log2(mut self, log2: u32) -> Self {
        self.max_size_log2 = log2;
        self
    }

    pub fn max_load_factor(mut self, load_factor: f64) -> Self {
        self.max_load_factor = load_factor;
        self
    }

    pub fn overflow_initial_capacity(mut self, capacity: usize) -> Self {
        self.overflow_initial_capacity = capacity;
        self
    }

    pub fn overflow_max_len(mut self, max_len: Option<usize>) -> Self {
        self.overflow_max_len = max_len;
        self
    }

    pub fn max_full_retries(mut self, retries: u32) -> Self {
        self.max_full_retries = retries;
        self
    }

    pub fn validate(&self) -> Result<(), MapError> {
        if self.max_size_log2 > MAX_SIZE_LOG2 {
            return Err(MapError::InvalidConfig("max_size_log2 is above 32"));
        }
        if self.initial_size_log2 > self.max_size_log2 {
            return Err(MapError::InvalidConfig(
                "initial_size_log2 is above max_size_log2",
            ));
        }
        if !(self.max_load_factor > 0.0 && self.max_load_factor <= 1.0) {
            return Err(MapError::InvalidConfig(
                "max_load_factor must be in (0, 1]",
            ));
        }
        if self.overflow_initial_capacity == 0 {
            return Err(MapError::InvalidConfig(
                "overflow_initial_capacity must be non-zero",
            ));
        }
        Ok(())
    }

    /// Whether a table of `2^log2` buckets holding `len` entries is still
    /// under the load factor, i.e. can take one more insertion without
    /// growing first.
    pub(crate) fn holds(&self, log2: u32, len: usize) -> bool {
        let slots = (1u64 << log2) as f64 * BUCKET_SIZE as f64;
        (len as f64) < slots * self.max_load_factor
    }

    pub(crate) fn overflow_limits(&self) -> OverflowLimits {
        OverflowLimits {
            initial: self.overflow_initial_capacity,
            max_len: self.overflow_max_len,
        }
    }
}
