//! Content hashing (C1).
//!
//! Grounded in the teacher's `infrastructure::snapshot::hash::HashCalculator`:
//! a single deterministic SHA-256 function, reused for chunk content, file
//! content, and combining Merkle child hashes.

use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of `bytes`. Deterministic; never fails.
pub fn hash_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        let a = hash_hex(b"fn f() {}");
        let b = hash_hex(b"fn f() {}");
        assert_eq!(a, b);
    }

    #[test]
    fn hash_changes_with_content() {
        assert_ne!(hash_hex(b"a"), hash_hex(b"b"));
    }

    #[test]
    fn known_vector() {
        // sha256("") is a fixed, widely-published constant.
        assert_eq!(
            hash_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
