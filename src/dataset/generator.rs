//! Synthetic demonstration data
//!
//! Values are drawn uniformly from `[10, 30)`. Column `i` comes from its own
//! ChaCha20 stream of the generator's seed, so columns can be generated in
//! any order, or in parallel, with identical results.

use rand::Rng;
use rand_chacha::ChaCha20Rng;
use rand_core::SeedableRng;

use crate::error::{OptOutError, Result};

/// Lower bound (inclusive) of generated values
pub const DEFAULT_LOW: f64 = 10.0;

/// Upper bound (exclusive) of generated values
pub const DEFAULT_HIGH: f64 = 30.0;

/// Seeded generator of plaintext columns
#[derive(Debug, Clone)]
pub struct DataGenerator {
    seed: u64,
    low: f64,
    high: f64,
}

impl DataGenerator {
    /// Generator over `[10, 30)`
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            low: DEFAULT_LOW,
            high: DEFAULT_HIGH,
        }
    }

    /// Generator over a custom half-open range
    pub fn with_range(seed: u64, low: f64, high: f64) -> Result<Self> {
        if !(low.is_finite() && high.is_finite() && low < high) {
            return Err(OptOutError::Config(format!(
                "invalid value range [{low}, {high})"
            )));
        }
        Ok(Self { seed, low, high })
    }

    /// Plaintext of column `index` with `n_rows` values
    pub fn column(&self, index: usize, n_rows: usize) -> Vec<f64> {
        let mut rng = ChaCha20Rng::seed_from_u64(self.seed);
        rng.set_stream(index as u64);
        (0..n_rows)
            .map(|_| rng.random_range(self.low..self.high))
            .collect()
    }

    /// All `n_variables` columns
    pub fn columns(&self, n_variables: usize, n_rows: usize) -> Vec<Vec<f64>> {
        (0..n_variables).map(|i| self.column(i, n_rows)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_in_range() {
        let generator = DataGenerator::new(1);
        let column = generator.column(0, 1000);
        assert_eq!(column.len(), 1000);
        assert!(column.iter().all(|v| (10.0..30.0).contains(v)));
    }

    #[test]
    fn test_reproducible_and_column_independent() {
        let a = DataGenerator::new(99);
        let b = DataGenerator::new(99);
        assert_eq!(a.column(3, 50), b.column(3, 50));
        assert_ne!(a.column(3, 50), a.column(4, 50));
        assert_ne!(a.column(3, 50), DataGenerator::new(100).column(3, 50));
        assert_eq!(a.columns(5, 8)[4], a.column(4, 8));
    }

    #[test]
    fn test_custom_range() {
        let generator = DataGenerator::with_range(5, -1.0, 1.0).unwrap();
        assert!(generator.column(0, 200).iter().all(|v| (-1.0..1.0).contains(v)));
        assert!(DataGenerator::with_range(5, 2.0, 2.0).is_err());
        assert!(DataGenerator::with_range(5, f64::NAN, 2.0).is_err());
    }
}
