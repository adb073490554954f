//! CKKS backend

use rand_core::{CryptoRng, RngCore};

use super::HeBackend;
use crate::ckks::{
    ciphertext_from_bytes, ciphertext_to_bytes, Ciphertext, CkksContext, CkksParameters,
    PublicKey, RelinearizationKey, SecretKey,
};
use crate::error::Result;

/// [`HeBackend`] over the crate's RNS-CKKS implementation
#[derive(Debug, Clone)]
pub struct CkksBackend {
    context: CkksContext,
}

impl CkksBackend {
    /// Build the crypto context for the requested parameters
    ///
    /// # Arguments
    /// * `params` - Requested CKKS parameters
    ///
    /// # Returns
    /// `Ok(CkksBackend)` if the parameters resolve, `Err` otherwise
    pub fn new(params: &CkksParameters) -> Result<Self> {
        let context = CkksContext::new(params)?;
        log::info!(
            "CKKS context ready: ring dimension {}, {} slots, {} primes + special, depth {}",
            context.params().poly_degree,
            context.slot_count(),
            context.params().moduli.len(),
            context.params().max_level()
        );
        Ok(Self { context })
    }

    /// Underlying crypto context
    pub fn context(&self) -> &CkksContext {
        &self.context
    }
}

impl HeBackend for CkksBackend {
    type Ciphertext = Ciphertext;
    type PublicKey = PublicKey;
    type SecretKey = SecretKey;
    type EvalKey = RelinearizationKey;

    fn name(&self) -> &'static str {
        "ckks"
    }

    fn slot_count(&self) -> usize {
        self.context.slot_count()
    }

    fn generate_keypair<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
    ) -> Result<(PublicKey, SecretKey)> {
        let keys = self.context.keygen(rng)?;
        Ok((keys.public_key, keys.secret_key))
    }

    fn generate_eval_keys<R: RngCore + CryptoRng>(
        &self,
        secret_key: &SecretKey,
        rng: &mut R,
    ) -> Result<RelinearizationKey> {
        self.context.relin_keygen(secret_key, rng)
    }

    fn encrypt<R: RngCore + CryptoRng>(
        &self,
        public_key: &PublicKey,
        values: &[f64],
        rng: &mut R,
    ) -> Result<Ciphertext> {
        self.context.encrypt(public_key, values, rng)
    }

    fn decrypt(&self, secret_key: &SecretKey, ct: &Ciphertext) -> Result<Vec<f64>> {
        self.context.decrypt(secret_key, ct)
    }

    fn multiply(
        &self,
        eval_key: &RelinearizationKey,
        a: &Ciphertext,
        b: &Ciphertext,
    ) -> Result<Ciphertext> {
        self.context.multiply(eval_key, a, b)
    }

    fn serialize(&self, ct: &Ciphertext) -> Result<Vec<u8>> {
        ciphertext_to_bytes(&self.context, ct)
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Ciphertext> {
        ciphertext_from_bytes(&self.context, bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::SeedStreams;

    #[test]
    fn test_backend_multiply_and_serialize() {
        let backend = CkksBackend::new(&CkksParameters::insecure(1024)).unwrap();
        assert_eq!(backend.name(), "ckks");
        assert_eq!(backend.slot_count(), 512);
        assert_eq!(backend.context().params().max_level(), 2);

        let mut rng = SeedStreams::from_u64(3).control();
        let keys = backend.generate_keys(&mut rng).unwrap();
        assert_eq!(keys.eval_key.num_components(), 3);
        let a = backend.encrypt(&keys.public_key, &[12.0, 25.5], &mut rng).unwrap();
        let b = backend.encrypt(&keys.public_key, &[0.0, 1.0], &mut rng).unwrap();
        let prod = backend.multiply(&keys.eval_key, &b, &a).unwrap();

        let restored = backend.deserialize(&backend.serialize(&prod).unwrap()).unwrap();
        let slots = backend.decrypt(&keys.secret_key, &restored).unwrap();
        assert!(slots[0].abs() < 1e-4);
        assert!((slots[1] - 25.5).abs() < 1e-4);
    }

    #[test]
    fn test_default_parameters_resolve_to_4096_slots() {
        let backend = CkksBackend::new(&CkksParameters::default()).unwrap();
        assert_eq!(backend.slot_count(), 4096);
    }
}
