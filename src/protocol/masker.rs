//! Opt-out masking
//!
//! Multiplies every stored column by the encrypted request indicator. Row
//! `target` of every masked column becomes 0; all other rows are unchanged.

use crate::backend::HeBackend;
use crate::dataset::{EncryptedColumn, EncryptedDataset};
use crate::error::Result;
use crate::utils::ParallelMap;

/// Applies the request indicator to a dataset
pub struct OptOutMasker<'a, B: HeBackend> {
    backend: &'a B,
    eval_key: &'a B::EvalKey,
    parallel: &'a ParallelMap,
}

impl<'a, B: HeBackend> OptOutMasker<'a, B> {
    /// Create a masker
    pub fn new(backend: &'a B, eval_key: &'a B::EvalKey, parallel: &'a ParallelMap) -> Self {
        Self {
            backend,
            eval_key,
            parallel,
        }
    }

    /// Mask every column of `dataset`
    ///
    /// # Arguments
    /// * `dataset` - Encrypted dataset, left untouched
    /// * `request` - Encrypted request indicator
    ///
    /// # Returns
    /// One masked column per stored column, in column order; the first
    /// multiplication failure aborts the phase
    pub fn mask(
        &self,
        dataset: &EncryptedDataset<B>,
        request: &B::Ciphertext,
    ) -> Result<Vec<EncryptedColumn<B>>> {
        let columns = dataset.columns();
        self.parallel.try_map(columns.len(), |i| {
            let column = &columns[i];
            let masked = self
                .backend
                .multiply(self.eval_key, request, column.ciphertext())?;
            log::debug!("masked column {i}");
            Ok(EncryptedColumn::new(masked, column.n_rows()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ClearBackend;
    use crate::crypto::SeedStreams;
    use crate::protocol::IndicatorEncoder;

    #[test]
    fn test_mask_zeroes_target_row_only() {
        let backend = ClearBackend::new(4);
        let mut rng = SeedStreams::from_u64(0).control();
        let keys = backend.generate_keys(&mut rng).unwrap();
        let parallel = ParallelMap::sequential();
        let dataset = EncryptedDataset::encrypt_columns(
            &backend,
            &keys.public_key,
            2,
            4,
            &SeedStreams::from_u64(1),
            &parallel,
            |i| if i == 0 { vec![5.0, 7.0, 9.0, 11.0] } else { vec![2.0, 4.0, 6.0, 8.0] },
        )
        .unwrap();
        let request = IndicatorEncoder::request(4, 2).unwrap();
        let request = IndicatorEncoder::encrypt(&backend, &keys.public_key, &request, &mut rng).unwrap();

        let masked = OptOutMasker::new(&backend, &keys.eval_key, &parallel)
            .mask(&dataset, &request)
            .unwrap();

        assert_eq!(masked.len(), 2);
        assert_eq!(
            masked[0].decrypt(&backend, &keys.secret_key).unwrap(),
            vec![5.0, 7.0, 0.0, 11.0]
        );
        assert_eq!(
            masked[1].decrypt(&backend, &keys.secret_key).unwrap(),
            vec![2.0, 4.0, 0.0, 8.0]
        );
    }
}
