//! Proof extraction
//!
//! The only step that decrypts. Each verification column is decrypted and the
//! verified row is read, giving one scalar per original column.

use serde::{Deserialize, Serialize};

use crate::backend::HeBackend;
use crate::dataset::EncryptedColumn;
use crate::error::{OptOutError, Result};
use crate::utils::ParallelMap;

/// Proof of deletion: one decrypted scalar per column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeletionProof {
    /// Row that was opted out
    pub target_index: usize,
    /// Row selected by the verification indicator
    pub verify_index: usize,
    /// Value read at `verify_index`, in column order
    pub values: Vec<f64>,
}

impl DeletionProof {
    /// Number of proof entries, equal to the number of columns
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// `true` if the proof has no entries
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Largest absolute proof entry; 0 for an empty proof
    pub fn max_abs(&self) -> f64 {
        self.values.iter().fold(0.0f64, |acc, v| acc.max(v.abs()))
    }

    /// `true` if the verified row is the opted-out row and every entry is
    /// zero within `tolerance`
    pub fn confirms_deletion(&self, tolerance: f64) -> bool {
        self.target_index == self.verify_index && self.values.iter().all(|v| v.abs() <= tolerance)
    }
}

/// Decrypts verification columns into a [`DeletionProof`]
pub struct ProofExtractor<'a, B: HeBackend> {
    backend: &'a B,
    secret_key: &'a B::SecretKey,
    parallel: &'a ParallelMap,
}

impl<'a, B: HeBackend> ProofExtractor<'a, B> {
    /// Create an extractor holding the decryption key
    pub fn new(backend: &'a B, secret_key: &'a B::SecretKey, parallel: &'a ParallelMap) -> Self {
        Self {
            backend,
            secret_key,
            parallel,
        }
    }

    /// Decrypt every column and read slot `verify_index`
    ///
    /// # Arguments
    /// * `verification` - Output of the verification phase
    /// * `target_index` - Row that was opted out
    /// * `verify_index` - Row the verification indicator selected
    ///
    /// # Returns
    /// The proof, or `RowOutOfRange` if `verify_index` is not a row of a
    /// column
    pub fn extract(
        &self,
        verification: &[EncryptedColumn<B>],
        target_index: usize,
        verify_index: usize,
    ) -> Result<DeletionProof> {
        let values = self.parallel.try_map(verification.len(), |i| {
            let column = &verification[i];
            if verify_index >= column.n_rows() {
                return Err(OptOutError::RowOutOfRange {
                    index: verify_index,
                    n_rows: column.n_rows(),
                });
            }
            let slots = column.decrypt(self.backend, self.secret_key)?;
            Ok(slots[verify_index])
        })?;

        Ok(DeletionProof {
            target_index,
            verify_index,
            values,
        })
    }
}
