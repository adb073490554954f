//! RNS-CKKS approximate homomorphic encryption
//!
//! This module provides the encryption capability the opt-out protocol is
//! built on:
//! - Parameter resolution against the HE-standard security tables
//! - Key generation (public key, secret key, relinearization key)
//! - Encryption and decryption of real-valued slot vectors
//! - Slot-wise ciphertext multiplication with relinearization and rescaling
//! - Versioned binary serialization of ciphertexts
//!
//! Polynomials live in `Z_Q[X]/(X^N+1)` in RNS form with every limb in the
//! NTT domain. `N/2` real values are packed per ciphertext.
//!
//! # Example
//!
//! ```rust
//! use optout_proof::ckks::{CkksContext, CkksParameters};
//! use rand_chacha::ChaCha20Rng;
//! use rand_core::SeedableRng;
//!
//! let ctx = CkksContext::new(&CkksParameters::insecure(1024))?;
//! let mut rng = ChaCha20Rng::seed_from_u64(1);
//! let keys = ctx.keygen(&mut rng)?;
//! let rk = ctx.relin_keygen(&keys.secret_key, &mut rng)?;
//!
//! let data = ctx.encrypt(&keys.public_key, &[5.0, 7.0, 9.0], &mut rng)?;
//! let mask = ctx.encrypt(&keys.public_key, &[1.0, 0.0, 1.0], &mut rng)?;
//! let masked = ctx.multiply(&rk, &mask, &data)?;
//!
//! let slots = ctx.decrypt(&keys.secret_key, &masked)?;
//! assert!(slots[1].abs() < 1e-4);
//! # Ok::<(), optout_proof::error::OptOutError>(())
//! ```

pub mod arith;
pub mod ciphertext;
pub mod context;
pub mod encoding;
pub mod keys;
pub mod ntt;
pub mod params;
pub mod sampling;
pub mod serialize;

pub use ciphertext::Ciphertext;
pub use context::CkksContext;
pub use encoding::CkksEncoder;
pub use keys::{KeyPair, PublicKey, RelinearizationKey, SecretKey};
pub use params::{CkksParameters, CkksParams, SecurityLevel};
pub use serialize::{ciphertext_from_bytes, ciphertext_to_bytes};
