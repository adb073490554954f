//! Cryptographic utilities shared by the pipeline
//!
//! - SHA-256 digests of persisted blobs
//! - Reproducible per-column ChaCha20 streams
//!
//! The homomorphic encryption scheme itself lives in [`crate::ckks`].

pub mod hash;
pub mod random;

pub use hash::HashUtils;
pub use random::SeedStreams;
