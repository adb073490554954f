//! CKKS key material.
//!
//! All polynomials are stored in the NTT domain. The secret key and the
//! relinearization key span the extended basis `q_0..q_L, P`; the public key
//! spans `q_0..q_L` only.

use std::fmt;

use super::arith::RnsPoly;

/// Secret key: ternary polynomial s
#[derive(Clone)]
pub struct SecretKey {
    pub(crate) s: RnsPoly,
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKey")
            .field("limbs", &self.s.num_limbs())
            .finish_non_exhaustive()
    }
}

/// Public key (b, a) with b = -a·s + e
#[derive(Debug, Clone)]
pub struct PublicKey {
    pub(crate) b: RnsPoly,
    pub(crate) a: RnsPoly,
}

/// Relinearization key: one key-switching component per RNS limb
///
/// Component j is (b_j, a_j) with b_j = -a_j·s + e_j + P·g_j·s², where g_j is
/// the CRT idempotent of limb j. In RNS form the P·g_j·s² term lives on
/// limb j only.
#[derive(Debug, Clone)]
pub struct RelinearizationKey {
    pub(crate) components: Vec<(RnsPoly, RnsPoly)>,
}

impl RelinearizationKey {
    /// Number of key-switching digits
    pub fn num_components(&self) -> usize {
        self.components.len()
    }
}

/// Public/secret key pair
#[derive(Debug, Clone)]
pub struct KeyPair {
    /// Encryption key
    pub public_key: PublicKey,
    /// Decryption key
    pub secret_key: SecretKey,
}
