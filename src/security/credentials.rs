//! Shared-secret comparison.

use subtle::ConstantTimeEq;

/// Compare a presented secret with the expected one without leaking the
/// position of the first differing byte. An empty expected secret never
/// matches, so an unset key cannot be satisfied by an empty header.
pub fn secret_matches(presented: &str, expected: &str) -> bool {
    if expected.is_empty() {
        return false;
    }
    presented.as_bytes().ct_eq(expected.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_matches() {
        assert!(secret_matches("s3cret", "s3cret"));
        assert!(!secret_matches("s3cre", "s3cret"));
        assert!(!secret_matches("S3CRET", "s3cret"));
        assert!(!secret_matches("", ""));
    }
}
