//! Sampling for CKKS key generation and encryption.
//!
//! - Secret and ephemeral keys: uniform ternary {-1, 0, 1}
//! - Errors: rounded Gaussian with σ = 3.19
//! - Masks: uniform in Z_q
//!
//! Signed samples are drawn once and reduced into every RNS limb so that all
//! limbs describe the same integer polynomial.

use rand::Rng;
use rand_core::{CryptoRng, RngCore};
use rand_distr::{Distribution, Normal};

use crate::error::{OptOutError, Result};

/// Standard deviation of the RLWE error distribution
pub const ERROR_STD_DEV: f64 = 3.19;

/// Errors are truncated at this many standard deviations
const ERROR_TAIL_CUT: f64 = 6.0;

/// Sample N ternary coefficients, each -1, 0 or 1 with probability 1/3
pub fn sample_ternary<R: RngCore + CryptoRng>(rng: &mut R, n: usize) -> Vec<i64> {
    (0..n).map(|_| rng.random_range(-1i64..=1)).collect()
}

/// Sample N rounded Gaussian coefficients with standard deviation σ
pub fn sample_gaussian<R: RngCore + CryptoRng>(
    rng: &mut R,
    n: usize,
    sigma: f64,
) -> Result<Vec<i64>> {
    let bound = (sigma * ERROR_TAIL_CUT).ceil();
    let normal = Normal::new(0.0, sigma)
        .map_err(|e| OptOutError::Crypto(format!("invalid error distribution: {e}")))?;
    Ok((0..n)
        .map(|_| normal.sample(rng).round().clamp(-bound, bound) as i64)
        .collect())
}

/// Sample N residues uniformly in [0, q)
pub fn sample_uniform<R: RngCore + CryptoRng>(rng: &mut R, n: usize, q: u64) -> Vec<u64> {
    (0..n).map(|_| rng.random_range(0..q)).collect()
}
