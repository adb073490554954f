//! Digests for persisted ciphertext blobs
//!
//! Persisted columns are reported together with the SHA-256 digest of the
//! bytes that were written, so an auditor can later compare the files on
//! disk against the run output.
//!
//! # Example
//!
//! ```rust
//! use optout_proof::crypto::HashUtils;
//!
//! let digest = HashUtils::sha256_hex(b"vector_0 bytes");
//! assert_eq!(digest.len(), 64);
//! assert!(HashUtils::matches(b"vector_0 bytes", &digest));
//! ```

use sha2::{Digest, Sha256};

/// Hash utilities
pub struct HashUtils;

impl HashUtils {
    /// Hex-encoded SHA-256 digest of `data`
    pub fn sha256_hex(data: &[u8]) -> String {
        hex::encode(Sha256::digest(data))
    }

    /// Check `data` against a hex digest
    ///
    /// # Arguments
    /// * `data` - Bytes to hash
    /// * `expected_hex` - Digest as produced by [`HashUtils::sha256_hex`]
    ///
    /// # Returns
    /// `true` if the digests agree; case-insensitive in the hex input
    pub fn matches(data: &[u8], expected_hex: &str) -> bool {
        match hex::decode(expected_hex) {
            Ok(expected) => Sha256::digest(data).as_slice() == expected.as_slice(),
            Err(_) => false,
        }
    }
}
