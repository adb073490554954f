//! Cleartext backend
//!
//! Same contract as [`super::CkksBackend`] with exact arithmetic and no
//! secrecy. It tracks the multiplicative depth like a leveled scheme so that
//! depth bugs in the protocol surface here too.

use bincode::{Decode, Encode};
use rand_core::{CryptoRng, RngCore};

use super::HeBackend;
use crate::error::{OptOutError, Result};

/// Default number of multiplications a fresh ciphertext supports
pub const DEFAULT_DEPTH: usize = 2;

/// "Ciphertext" holding its slot values in the clear
#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct ClearCiphertext {
    values: Vec<f64>,
    level: usize,
}

impl ClearCiphertext {
    /// Remaining multiplications
    pub fn level(&self) -> usize {
        self.level
    }
}

/// Placeholder key; the cleartext backend has no key material
#[derive(Debug, Clone, Copy, Default)]
pub struct ClearKey;

/// Cleartext [`HeBackend`]
#[derive(Debug, Clone)]
pub struct ClearBackend {
    slots: usize,
    depth: usize,
}

impl ClearBackend {
    /// Backend with `slots` slots and the default depth
    pub fn new(slots: usize) -> Self {
        Self::with_depth(slots, DEFAULT_DEPTH)
    }

    /// Backend with an explicit multiplicative depth
    pub fn with_depth(slots: usize, depth: usize) -> Self {
        Self { slots, depth }
    }
}

impl HeBackend for ClearBackend {
    type Ciphertext = ClearCiphertext;
    type PublicKey = ClearKey;
    type SecretKey = ClearKey;
    type EvalKey = ClearKey;

    fn name(&self) -> &'static str {
        "clear"
    }

    fn slot_count(&self) -> usize {
        self.slots
    }

    fn generate_keypair<R: RngCore + CryptoRng>(&self, _rng: &mut R) -> Result<(ClearKey, ClearKey)> {
        Ok((ClearKey, ClearKey))
    }

    fn generate_eval_keys<R: RngCore + CryptoRng>(
        &self,
        _secret_key: &ClearKey,
        _rng: &mut R,
    ) -> Result<ClearKey> {
        Ok(ClearKey)
    }

    fn encrypt<R: RngCore + CryptoRng>(
        &self,
        _public_key: &ClearKey,
        values: &[f64],
        _rng: &mut R,
    ) -> Result<ClearCiphertext> {
        if values.len() > self.slots {
            return Err(OptOutError::TooManyRows {
                n_rows: values.len(),
                slots: self.slots,
            });
        }
        let mut padded = values.to_vec();
        padded.resize(self.slots, 0.0);
        Ok(ClearCiphertext {
            values: padded,
            level: self.depth,
        })
    }

    fn decrypt(&self, _secret_key: &ClearKey, ct: &ClearCiphertext) -> Result<Vec<f64>> {
        Ok(ct.values.clone())
    }

    fn multiply(
        &self,
        _eval_key: &ClearKey,
        a: &ClearCiphertext,
        b: &ClearCiphertext,
    ) -> Result<ClearCiphertext> {
        let level = a.level.min(b.level);
        if level == 0 {
            return Err(OptOutError::DepthExhausted { level });
        }
        if a.values.len() != b.values.len() {
            return Err(OptOutError::ShapeMismatch {
                what: "ciphertext slots".to_string(),
                expected: a.values.len(),
                found: b.values.len(),
            });
        }
        Ok(ClearCiphertext {
            values: a.values.iter().zip(&b.values).map(|(x, y)| x * y).collect(),
            level: level - 1,
        })
    }

    fn serialize(&self, ct: &ClearCiphertext) -> Result<Vec<u8>> {
        Ok(bincode::encode_to_vec(ct, bincode::config::standard())?)
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<ClearCiphertext> {
        let (ct, _): (ClearCiphertext, usize) =
            bincode::decode_from_slice(bytes, bincode::config::standard())?;
        if ct.values.len() != self.slots {
            return Err(OptOutError::Serialization(format!(
                "blob has {} slots, backend has {}",
                ct.values.len(),
                self.slots
            )));
        }
        Ok(ct)
    }
}
