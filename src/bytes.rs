//! Byte-wise key comparison.

/// Returns true when `a` and `b` hold the same bytes.
///
/// Lengths are compared first; the byte loop stops at the first mismatch.
#[inline]
pub fn bytes_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x == y)
}

/// Compares the first `len` bytes of `a` and `b`.
///
/// Returns false if either region is shorter than `len`.
#[inline]
pub fn prefix_eq(a: &[u8], b: &[u8], len: usize) -> bool {
    match (a.get(..len), b.get(..len)) {
        (Some(a), Some(b)) => bytes_eq(a, b),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_and_unequal_regions() {
        assert!(bytes_eq(b"", b""));
        assert!(bytes_eq(b"abc", b"abc"));
        assert!(!bytes_eq(b"abc", b"abd"));
        assert!(!bytes_eq(b"abc", b"ab"));
    }

    #[test]
    fn prefix_respects_length() {
        assert!(prefix_eq(b"abcdef", b"abcxyz", 3));
        assert!(!prefix_eq(b"abcdef", b"abcxyz", 4));
        assert!(!prefix_eq(b"ab", b"abc", 3));
        assert!(prefix_eq(b"", b"", 0));
    }
}
