//! Encrypted column store
//!
//! A dataset is an ordered list of encrypted columns. Each column packs one
//! value per row into a single ciphertext, row `i` in slot `i`. The column
//! index is the variable index, fixed by insertion order.
//!
//! # Example
//!
//! ```rust
//! use optout_proof::backend::{ClearBackend, HeBackend};
//! use optout_proof::crypto::SeedStreams;
//! use optout_proof::dataset::{EncryptedColumn, EncryptedDataset};
//!
//! let backend = ClearBackend::new(8);
//! let mut rng = SeedStreams::from_u64(0).control();
//! let keys = backend.generate_keys(&mut rng)?;
//!
//! let mut dataset: EncryptedDataset<ClearBackend> = EncryptedDataset::new(3);
//! let ct = backend.encrypt(&keys.public_key, &[5.0, 7.0, 9.0], &mut rng)?;
//! dataset.append(EncryptedColumn::new(ct, 3))?;
//! assert_eq!(dataset.len(), 1);
//! # Ok::<(), optout_proof::error::OptOutError>(())
//! ```

use crate::backend::HeBackend;
use crate::crypto::SeedStreams;
use crate::error::{OptOutError, Result};
use crate::utils::ParallelMap;

/// One encrypted column: a ciphertext and the number of rows it packs
pub struct EncryptedColumn<B: HeBackend> {
    ciphertext: B::Ciphertext,
    n_rows: usize,
}

impl<B: HeBackend> EncryptedColumn<B> {
    /// Wrap a ciphertext packing `n_rows` rows
    pub fn new(ciphertext: B::Ciphertext, n_rows: usize) -> Self {
        Self { ciphertext, n_rows }
    }

    /// Encrypt a plaintext column
    ///
    /// # Arguments
    /// * `backend` - Encryption backend
    /// * `public_key` - Encryption key
    /// * `values` - One value per row
    /// * `rng` - Randomness for this column
    pub fn encrypt<R>(
        backend: &B,
        public_key: &B::PublicKey,
        values: &[f64],
        rng: &mut R,
    ) -> Result<Self>
    where
        R: rand_core::RngCore + rand_core::CryptoRng,
    {
        let ciphertext = backend.encrypt(public_key, values, rng)?;
        Ok(Self::new(ciphertext, values.len()))
    }

    /// Underlying ciphertext
    pub fn ciphertext(&self) -> &B::Ciphertext {
        &self.ciphertext
    }

    /// Number of rows packed in the column
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Decrypt and keep the first `n_rows` slots
    pub fn decrypt(&self, backend: &B, secret_key: &B::SecretKey) -> Result<Vec<f64>> {
        let mut slots = backend.decrypt(secret_key, &self.ciphertext)?;
        if slots.len() < self.n_rows {
            return Err(OptOutError::ShapeMismatch {
                what: "decrypted slots".to_string(),
                expected: self.n_rows,
                found: slots.len(),
            });
        }
        slots.truncate(self.n_rows);
        Ok(slots)
    }
}

impl<B: HeBackend> Clone for EncryptedColumn<B> {
    fn clone(&self) -> Self {
        Self {
            ciphertext: self.ciphertext.clone(),
            n_rows: self.n_rows,
        }
    }
}

impl<B: HeBackend> std::fmt::Debug for EncryptedColumn<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptedColumn")
            .field("n_rows", &self.n_rows)
            .finish_non_exhaustive()
    }
}

/// Ordered collection of equally tall encrypted columns
pub struct EncryptedDataset<B: HeBackend> {
    columns: Vec<EncryptedColumn<B>>,
    n_rows: usize,
}

impl<B: HeBackend> EncryptedDataset<B> {
    /// Empty dataset whose columns will pack `n_rows` rows
    pub fn new(n_rows: usize) -> Self {
        Self {
            columns: Vec::new(),
            n_rows,
        }
    }

    /// Build a dataset from columns, checking every column's height
    pub fn from_columns(n_rows: usize, columns: Vec<EncryptedColumn<B>>) -> Result<Self> {
        let mut dataset = Self::new(n_rows);
        dataset.columns.reserve(columns.len());
        for column in columns {
            dataset.append(column)?;
        }
        Ok(dataset)
    }

    /// Generate and encrypt `n_variables` columns in parallel
    ///
    /// Column `i` is produced by `column_values(i)` and encrypted with stream
    /// `i` of `streams`, so the result does not depend on scheduling.
    ///
    /// # Arguments
    /// * `backend` - Encryption backend
    /// * `public_key` - Encryption key
    /// * `n_variables` - Number of columns
    /// * `n_rows` - Rows per column
    /// * `streams` - Per-column randomness
    /// * `parallel` - Parallel map
    /// * `column_values` - Plaintext of column `i`
    pub fn encrypt_columns<F>(
        backend: &B,
        public_key: &B::PublicKey,
        n_variables: usize,
        n_rows: usize,
        streams: &SeedStreams,
        parallel: &ParallelMap,
        column_values: F,
    ) -> Result<Self>
    where
        F: Fn(usize) -> Vec<f64> + Sync + Send,
    {
        let columns = parallel.try_map(n_variables, |i| {
            let values = column_values(i);
            if values.len() != n_rows {
                return Err(OptOutError::ShapeMismatch {
                    what: format!("plaintext column {i}"),
                    expected: n_rows,
                    found: values.len(),
                });
            }
            let mut rng = streams.stream(i as u64);
            log::debug!("encrypting column {i}");
            EncryptedColumn::encrypt(backend, public_key, &values, &mut rng)
        })?;
        Ok(Self { columns, n_rows })
    }

    /// Append a column at the next variable index
    ///
    /// # Returns
    /// `Err(ShapeMismatch)` if the column does not pack `n_rows()` rows
    pub fn append(&mut self, column: EncryptedColumn<B>) -> Result<()> {
        if column.n_rows() != self.n_rows {
            return Err(OptOutError::ShapeMismatch {
                what: format!("column {}", self.columns.len()),
                expected: self.n_rows,
                found: column.n_rows(),
            });
        }
        self.columns.push(column);
        Ok(())
    }

    /// Column at variable index `index`
    pub fn get(&self, index: usize) -> Option<&EncryptedColumn<B>> {
        self.columns.get(index)
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// `true` if the dataset has no columns
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Rows per column
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Columns in variable order
    pub fn iter(&self) -> std::slice::Iter<'_, EncryptedColumn<B>> {
        self.columns.iter()
    }

    /// Columns as a slice
    pub fn columns(&self) -> &[EncryptedColumn<B>] {
        &self.columns
    }
}

impl<B: HeBackend> std::fmt::Debug for EncryptedDataset<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptedDataset")
            .field("n_columns", &self.columns.len())
            .field("n_rows", &self.n_rows)
            .finish()
    }
}

impl<'a, B: HeBackend> IntoIterator for &'a EncryptedDataset<B> {
    type Item = &'a EncryptedColumn<B>;
    type IntoIter = std::slice::Iter<'a, EncryptedColumn<B>>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.iter()
    }
}
