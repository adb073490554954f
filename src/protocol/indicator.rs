//! Indicator vectors
//!
//! An indicator vector has one distinguished slot, the target row, holding a
//! "select" value while every other slot holds a "pass" value. Two variants
//! drive the protocol:
//!
//! | variant      | target | elsewhere |
//! |--------------|--------|-----------|
//! | request      | 0      | 1         |
//! | verification | 1      | 0         |
//!
//! Multiplying a column by the request indicator zeroes the target row and
//! keeps every other row; multiplying by the verification indicator keeps
//! only the target row.

use rand_core::{CryptoRng, RngCore};

use crate::backend::HeBackend;
use crate::error::{OptOutError, Result};

/// Builder of plaintext and encrypted indicator vectors
pub struct IndicatorEncoder;

impl IndicatorEncoder {
    /// Plaintext indicator
    ///
    /// # Arguments
    /// * `n_rows` - Vector length
    /// * `target_index` - Distinguished row
    /// * `select_value` - Value at `target_index`
    /// * `pass_value` - Value at every other row
    ///
    /// # Returns
    /// The vector, or `RowOutOfRange` if `target_index >= n_rows`
    pub fn encode(
        n_rows: usize,
        target_index: usize,
        select_value: f64,
        pass_value: f64,
    ) -> Result<Vec<f64>> {
        if target_index >= n_rows {
            return Err(OptOutError::RowOutOfRange {
                index: target_index,
                n_rows,
            });
        }
        let mut vector = vec![pass_value; n_rows];
        vector[target_index] = select_value;
        Ok(vector)
    }

    /// Request indicator: 0 at the target, 1 elsewhere
    pub fn request(n_rows: usize, target_index: usize) -> Result<Vec<f64>> {
        Self::encode(n_rows, target_index, 0.0, 1.0)
    }

    /// Verification indicator: 1 at the target, 0 elsewhere
    pub fn verification(n_rows: usize, target_index: usize) -> Result<Vec<f64>> {
        Self::encode(n_rows, target_index, 1.0, 0.0)
    }

    /// Encrypt an indicator vector
    pub fn encrypt<B: HeBackend, R: RngCore + CryptoRng>(
        backend: &B,
        public_key: &B::PublicKey,
        indicator: &[f64],
        rng: &mut R,
    ) -> Result<B::Ciphertext> {
        log::debug!(
            "encrypting {}-slot indicator via {}",
            indicator.len(),
            backend.name()
        );
        backend.encrypt(public_key, indicator, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_request_and_verification() {
        assert_eq!(
            IndicatorEncoder::request(4, 2).unwrap(),
            vec![1.0, 1.0, 0.0, 1.0]
        );
        assert_eq!(
            IndicatorEncoder::verification(4, 2).unwrap(),
            vec![0.0, 0.0, 1.0, 0.0]
        );
    }

    #[test]
    fn test_boundaries() {
        assert_eq!(IndicatorEncoder::request(3, 0).unwrap(), vec![0.0, 1.0, 1.0]);
        assert_eq!(IndicatorEncoder::request(3, 2).unwrap(), vec![1.0, 1.0, 0.0]);
        assert!(matches!(
            IndicatorEncoder::request(3, 3),
            Err(OptOutError::RowOutOfRange { index: 3, n_rows: 3 })
        ));
        assert!(IndicatorEncoder::verification(0, 0).is_err());
    }

    proptest! {
        #[test]
        fn prop_single_distinguished_slot(
            (n_rows, target) in (1usize..500).prop_flat_map(|n| (Just(n), 0..n)),
            select in -100.0f64..100.0,
            pass in -100.0f64..100.0,
        ) {
            prop_assume!(select != pass);
            let v = IndicatorEncoder::encode(n_rows, target, select, pass).unwrap();
            prop_assert_eq!(v.len(), n_rows);
            prop_assert_eq!(v[target], select);
            prop_assert_eq!(v.iter().filter(|&&x| x == select).count(), 1);
        }

        #[test]
        fn prop_request_plus_verification_is_all_ones(
            (n_rows, target) in (1usize..500).prop_flat_map(|n| (Just(n), 0..n)),
        ) {
            let request = IndicatorEncoder::request(n_rows, target).unwrap();
            let verification = IndicatorEncoder::verification(n_rows, target).unwrap();
            prop_assert!(request.iter().zip(&verification).all(|(r, v)| r + v == 1.0 && r * v == 0.0));
        }
    }
}
