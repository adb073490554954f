//! CKKS ciphertext.

use bincode::{Decode, Encode};

use super::arith::RnsPoly;

/// A CKKS ciphertext: (c0, c1) in the NTT domain over q_0..q_level
///
/// Decrypts as c0 + c1·s ≈ Δ·m. The scale is tracked exactly so that decoding
/// after rescaling by primes that are only close to Δ stays accurate.
#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct Ciphertext {
    pub(crate) c0: RnsPoly,
    pub(crate) c1: RnsPoly,
    pub(crate) scale: f64,
}

impl Ciphertext {
    /// Remaining rescales; a ciphertext at level 0 cannot be multiplied
    pub fn level(&self) -> usize {
        self.c0.num_limbs().saturating_sub(1)
    }

    /// Scale carried by the encrypted values
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Ring degree N
    pub fn degree(&self) -> usize {
        self.c0.degree()
    }

    /// Keep only the first `level + 1` limbs
    pub(crate) fn truncated(&self, level: usize) -> Self {
        let keep = level + 1;
        Self {
            c0: RnsPoly {
                limbs: self.c0.limbs[..keep].to_vec(),
            },
            c1: RnsPoly {
                limbs: self.c1.limbs[..keep].to_vec(),
            },
            scale: self.scale,
        }
    }
}
