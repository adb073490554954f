//! Deletion verification
//!
//! Multiplies every masked column by the encrypted verification indicator.
//! Only the verified row survives; after masking at the same row it is 0.

use crate::backend::HeBackend;
use crate::dataset::EncryptedColumn;
use crate::error::Result;
use crate::utils::ParallelMap;

/// Applies the verification indicator to masked columns
pub struct DeletionVerifier<'a, B: HeBackend> {
    backend: &'a B,
    eval_key: &'a B::EvalKey,
    parallel: &'a ParallelMap,
}

impl<'a, B: HeBackend> DeletionVerifier<'a, B> {
    /// Create a verifier
    pub fn new(backend: &'a B, eval_key: &'a B::EvalKey, parallel: &'a ParallelMap) -> Self {
        Self {
            backend,
            eval_key,
            parallel,
        }
    }

    /// Isolate the verified row of every masked column
    ///
    /// # Arguments
    /// * `masked` - Output of the masking phase
    /// * `verification` - Encrypted verification indicator
    ///
    /// # Returns
    /// One verification column per masked column, in the same order
    pub fn verify(
        &self,
        masked: &[EncryptedColumn<B>],
        verification: &B::Ciphertext,
    ) -> Result<Vec<EncryptedColumn<B>>> {
        self.parallel.try_map(masked.len(), |i| {
            let column = &masked[i];
            let checked = self
                .backend
                .multiply(self.eval_key, verification, column.ciphertext())?;
            log::debug!("verified column {i}");
            Ok(EncryptedColumn::new(checked, column.n_rows()))
        })
    }
}
