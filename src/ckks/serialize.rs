//! Binary ciphertext format.
//!
//! A ciphertext is written as a bincode envelope carrying a format version,
//! the ring dimension and the modulus chain it was produced under, so a blob
//! is rejected when it is loaded into a context with different parameters.

use bincode::{Decode, Encode};

use super::ciphertext::Ciphertext;
use super::context::CkksContext;
use crate::error::{OptOutError, Result};

/// Current envelope version
pub const FORMAT_VERSION: u16 = 1;

#[derive(Encode, Decode)]
struct Envelope {
    version: u16,
    ring_dimension: u32,
    moduli: Vec<u64>,
    ciphertext: Ciphertext,
}

/// Serialize a ciphertext under the context's parameters
pub fn ciphertext_to_bytes(ctx: &CkksContext, ct: &Ciphertext) -> Result<Vec<u8>> {
    ctx.validate(ct)?;
    let envelope = Envelope {
        version: FORMAT_VERSION,
        ring_dimension: ctx.params().poly_degree as u32,
        moduli: ctx.params().moduli.clone(),
        ciphertext: ct.clone(),
    };
    Ok(bincode::encode_to_vec(&envelope, bincode::config::standard())?)
}

/// Deserialize and validate a ciphertext against the context
pub fn ciphertext_from_bytes(ctx: &CkksContext, bytes: &[u8]) -> Result<Ciphertext> {
    let (envelope, read): (Envelope, usize) =
        bincode::decode_from_slice(bytes, bincode::config::standard())?;
    if read != bytes.len() {
        return Err(OptOutError::Serialization(format!(
            "{} trailing bytes after ciphertext",
            bytes.len() - read
        )));
    }
    if envelope.version != FORMAT_VERSION {
        return Err(OptOutError::Serialization(format!(
            "unsupported format version {}",
            envelope.version
        )));
    }
    let params = ctx.params();
    if envelope.ring_dimension as usize != params.poly_degree {
        return Err(OptOutError::Serialization(format!(
            "ring dimension {} does not match context ({})",
            envelope.ring_dimension, params.poly_degree
        )));
    }
    if envelope.moduli != params.moduli {
        return Err(OptOutError::Serialization(
            "modulus chain does not match context".to_string(),
        ));
    }

    let ct = envelope.ciphertext;
    ctx.validate(&ct)
        .map_err(|e| OptOutError::Serialization(format!("malformed ciphertext: {e}")))?;
    Ok(ct)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ckks::params::CkksParameters;
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;

    fn context() -> CkksContext {
        CkksContext::new(&CkksParameters::insecure(1024)).unwrap()
    }

    #[test]
    fn test_roundtrip_preserves_ciphertext() {
        let ctx = context();
        let mut rng = ChaCha20Rng::seed_from_u64(11);
        let keys = ctx.keygen(&mut rng).unwrap();
        let ct = ctx.encrypt(&keys.public_key, &[10.5, 20.25], &mut rng).unwrap();

        let bytes = ciphertext_to_bytes(&ctx, &ct).unwrap();
        let restored = ciphertext_from_bytes(&ctx, &bytes).unwrap();
        assert_eq!(restored, ct);
    }

    #[test]
    fn test_rejects_truncated_and_trailing_bytes() {
        let ctx = context();
        let mut rng = ChaCha20Rng::seed_from_u64(12);
        let keys = ctx.keygen(&mut rng).unwrap();
        let ct = ctx.encrypt(&keys.public_key, &[1.0], &mut rng).unwrap();
        let mut bytes = ciphertext_to_bytes(&ctx, &ct).unwrap();

        assert!(ciphertext_from_bytes(&ctx, &bytes[..bytes.len() / 2]).is_err());
        bytes.push(0);
        assert!(matches!(
            ciphertext_from_bytes(&ctx, &bytes),
            Err(OptOutError::Serialization(_))
        ));
    }

    #[test]
    fn test_rejects_foreign_context() {
        let ctx = context();
        let other = CkksContext::new(&CkksParameters::insecure(2048)).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(13);
        let keys = ctx.keygen(&mut rng).unwrap();
        let ct = ctx.encrypt(&keys.public_key, &[1.0], &mut rng).unwrap();
        let bytes = ciphertext_to_bytes(&ctx, &ct).unwrap();

        assert!(ciphertext_from_bytes(&other, &bytes).is_err());
    }
}
