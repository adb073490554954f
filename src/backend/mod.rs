//! Homomorphic encryption backends
//!
//! The protocol only needs a narrow capability: pack a real vector into one
//! ciphertext, multiply two ciphertexts slot-wise, decrypt, and move
//! ciphertexts to and from bytes. [`HeBackend`] captures that surface.
//!
//! Two implementations are provided:
//! - [`CkksBackend`]: RNS-CKKS from [`crate::ckks`]
//! - [`ClearBackend`]: a cleartext stand-in with exact arithmetic, used to
//!   test the protocol algebra independently of encryption noise
//!
//! # Example
//!
//! ```rust
//! use optout_proof::backend::{ClearBackend, HeBackend};
//! use optout_proof::crypto::SeedStreams;
//!
//! let backend = ClearBackend::new(8);
//! let mut rng = SeedStreams::from_u64(1).control();
//! let keys = backend.generate_keys(&mut rng)?;
//! let ct = backend.encrypt(&keys.public_key, &[1.0, 2.0], &mut rng)?;
//! let sq = backend.multiply(&keys.eval_key, &ct, &ct)?;
//! assert_eq!(&backend.decrypt(&keys.secret_key, &sq)?[..2], &[1.0, 4.0]);
//! # Ok::<(), optout_proof::error::OptOutError>(())
//! ```

pub mod ckks;
pub mod clear;

pub use self::ckks::CkksBackend;
pub use clear::ClearBackend;

use rand_core::{CryptoRng, RngCore};

use crate::error::Result;

/// Encryption capability used by the opt-out protocol
///
/// Implementations are shared read-only across worker threads.
pub trait HeBackend: Send + Sync {
    /// Ciphertext packing one real value per slot
    type Ciphertext: Clone + Send + Sync;
    /// Encryption key
    type PublicKey: Send + Sync;
    /// Decryption key
    type SecretKey: Send + Sync;
    /// Key material needed by [`HeBackend::multiply`]
    type EvalKey: Send + Sync;

    /// Short backend name for logs
    fn name(&self) -> &'static str;

    /// Number of real slots in one ciphertext
    fn slot_count(&self) -> usize;

    /// Generate a public/secret key pair
    fn generate_keypair<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
    ) -> Result<(Self::PublicKey, Self::SecretKey)>;

    /// Generate multiplication key material for `secret_key`
    fn generate_eval_keys<R: RngCore + CryptoRng>(
        &self,
        secret_key: &Self::SecretKey,
        rng: &mut R,
    ) -> Result<Self::EvalKey>;

    /// Encrypt `values` (at most `slot_count()`, remaining slots are zero)
    fn encrypt<R: RngCore + CryptoRng>(
        &self,
        public_key: &Self::PublicKey,
        values: &[f64],
        rng: &mut R,
    ) -> Result<Self::Ciphertext>;

    /// Decrypt into the full slot vector
    fn decrypt(&self, secret_key: &Self::SecretKey, ct: &Self::Ciphertext) -> Result<Vec<f64>>;

    /// Slot-wise product
    fn multiply(
        &self,
        eval_key: &Self::EvalKey,
        a: &Self::Ciphertext,
        b: &Self::Ciphertext,
    ) -> Result<Self::Ciphertext>;

    /// Encode a ciphertext as an opaque blob
    fn serialize(&self, ct: &Self::Ciphertext) -> Result<Vec<u8>>;

    /// Decode a blob written by [`HeBackend::serialize`]
    fn deserialize(&self, bytes: &[u8]) -> Result<Self::Ciphertext>;

    /// Generate all key material in one step
    fn generate_keys<R: RngCore + CryptoRng>(&self, rng: &mut R) -> Result<KeySet<Self>>
    where
        Self: Sized,
    {
        let (public_key, secret_key) = self.generate_keypair(rng)?;
        let eval_key = self.generate_eval_keys(&secret_key, rng)?;
        Ok(KeySet {
            public_key,
            secret_key,
            eval_key,
        })
    }
}

/// Complete key material of one protocol run
pub struct KeySet<B: HeBackend> {
    /// Encryption key
    pub public_key: B::PublicKey,
    /// Decryption key; only the proof extractor uses it
    pub secret_key: B::SecretKey,
    /// Multiplication key
    pub eval_key: B::EvalKey,
}

impl<B: HeBackend> std::fmt::Debug for KeySet<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeySet").finish_non_exhaustive()
    }
}
