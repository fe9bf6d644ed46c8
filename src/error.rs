//! Error type shared by every fallible map operation.

use std::collections::TryReserveError;

/// Errors surfaced by `BucketMap` instead of aborting the process.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum MapError {
    /// The allocator refused to provide storage for the bucket array or
    /// for a bucket's overflow region.
    #[error("failed to allocate bucket storage: {0}")]
    OutOfMemory(#[from] TryReserveError),

    /// Growing would take the bucket array past its configured ceiling.
    #[error("bucket array cannot grow past 2^{max_size_log2} buckets")]
    CapacityExceeded { max_size_log2: u32 },

    /// A bucket's overflow region stayed at its maximum length even after
    /// the map grew `attempts` times to spread it out.
    #[error("bucket still full after {attempts} growth attempts")]
    BucketSaturated { attempts: u32 },

    /// A `MapConfig` failed validation.
    #[error("invalid map configuration: {0}")]
    InvalidConfig(&'static str),
}

#[cfg(test)]
mod tests {
    use super::MapError;

    #[test]
    fn display_messages_name_the_limit() {
        let e = MapError::CapacityExceeded { max_size_log2: 5 };
        assert_eq!(e.to_string(), "bucket array cannot grow past 2^5 buckets");

        let e = MapError::BucketSaturated { attempts: 3 };
        assert_eq!(e.to_string(), "bucket still full after 3 growth attempts");
    }

    #[test]
    fn try_reserve_failure_converts() {
        let mut v: Vec<u64> = Vec::new();
        let err = v.try_reserve(usize::MAX).unwrap_err();
        let e: MapError = err.into();
        assert!(matches!(e, MapError::OutOfMemory(_)));
    }
}
