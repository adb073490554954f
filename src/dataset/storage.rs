//! Dataset storage layer
//!
//! Each column is written to its own file, `vector_<index>`, holding the
//! backend's serialized ciphertext. Persisting the whole dataset is
//! best-effort: a column that cannot be written is logged and reported, the
//! remaining columns are still written, and nothing is read back.
//!
//! # Example
//!
//! ```rust,no_run
//! use optout_proof::backend::{ClearBackend, HeBackend};
//! use optout_proof::crypto::SeedStreams;
//! use optout_proof::dataset::{DatasetStorage, EncryptedDataset};
//! use optout_proof::utils::ParallelMap;
//!
//! let backend = ClearBackend::new(4);
//! let keys = backend.generate_keys(&mut SeedStreams::from_u64(0).control())?;
//! let parallel = ParallelMap::default();
//! let dataset = EncryptedDataset::encrypt_columns(
//!     &backend, &keys.public_key, 2, 4, &SeedStreams::from_u64(1), &parallel,
//!     |_| vec![1.0; 4],
//! )?;
//!
//! let storage = DatasetStorage::new("out");
//! let report = storage.persist_all(&backend, &dataset, &parallel);
//! assert!(report.is_complete());
//!
//! let reloaded = storage.load(&backend, 2, 4)?;
//! # Ok::<(), optout_proof::error::OptOutError>(())
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::store::{EncryptedColumn, EncryptedDataset};
use crate::backend::HeBackend;
use crate::crypto::HashUtils;
use crate::error::{OptOutError, Result};
use crate::utils::ParallelMap;

/// File name prefix of persisted columns
pub const COLUMN_FILE_PREFIX: &str = "vector_";

/// A column written to disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersistedColumn {
    /// Variable index
    pub index: usize,
    /// File written
    pub path: PathBuf,
    /// Bytes written
    pub bytes: u64,
    /// Hex SHA-256 of the written bytes
    pub sha256: String,
}

/// A column that could not be written
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersistFailure {
    /// Variable index
    pub index: usize,
    /// Intended destination
    pub path: PathBuf,
    /// Error description
    pub error: String,
}

/// Outcome of [`DatasetStorage::persist_all`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PersistReport {
    /// Columns written, in variable order
    pub written: Vec<PersistedColumn>,
    /// Columns skipped, in variable order
    pub failed: Vec<PersistFailure>,
}

impl PersistReport {
    /// `true` if every column was written
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Total bytes written
    pub fn total_bytes(&self) -> u64 {
        self.written.iter().map(|c| c.bytes).sum()
    }
}

/// Column files under one directory
#[derive(Debug, Clone)]
pub struct DatasetStorage {
    dir: PathBuf,
}

impl DatasetStorage {
    /// Storage rooted at `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Destination of column `index`
    pub fn column_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("{COLUMN_FILE_PREFIX}{index}"))
    }

    /// Serialize and write one column
    ///
    /// # Arguments
    /// * `backend` - Backend providing the serializer
    /// * `index` - Variable index, selects the file name
    /// * `column` - Column to write
    ///
    /// # Returns
    /// Path, size and digest of the written file
    pub fn persist<B: HeBackend>(
        &self,
        backend: &B,
        index: usize,
        column: &EncryptedColumn<B>,
    ) -> Result<PersistedColumn> {
        let bytes = backend.serialize(column.ciphertext())?;
        let path = self.column_path(index);
        fs::write(&path, &bytes)?;
        log::debug!("wrote {} ({} bytes)", path.display(), bytes.len());
        Ok(PersistedColumn {
            index,
            path,
            bytes: bytes.len() as u64,
            sha256: HashUtils::sha256_hex(&bytes),
        })
    }

    /// Write every column, in parallel, without stopping on failures
    ///
    /// The output directory is created if missing. Failures are logged at
    /// `warn` and listed in the report.
    pub fn persist_all<B: HeBackend>(
        &self,
        backend: &B,
        dataset: &EncryptedDataset<B>,
        parallel: &ParallelMap,
    ) -> PersistReport {
        if let Err(e) = fs::create_dir_all(&self.dir) {
            log::warn!("cannot create {}: {e}", self.dir.display());
        }

        let outcomes = parallel.map(dataset.len(), |i| {
            let column = &dataset.columns()[i];
            self.persist(backend, i, column).map_err(|e| {
                let path = self.column_path(i);
                log::warn!("failed to persist column {i} to {}: {e}", path.display());
                PersistFailure {
                    index: i,
                    path,
                    error: e.to_string(),
                }
            })
        });

        let mut report = PersistReport::default();
        for outcome in outcomes {
            match outcome {
                Ok(written) => report.written.push(written),
                Err(failure) => report.failed.push(failure),
            }
        }
        report
    }

    /// Read one column back
    ///
    /// # Arguments
    /// * `backend` - Backend providing the deserializer
    /// * `path` - Column file
    /// * `n_rows` - Rows the column packs
    ///
    /// # Returns
    /// The column, or `TooManyRows` if `n_rows` exceeds the backend's slots
    pub fn load_column<B: HeBackend>(
        &self,
        backend: &B,
        path: impl AsRef<Path>,
        n_rows: usize,
    ) -> Result<EncryptedColumn<B>> {
        if n_rows > backend.slot_count() {
            return Err(OptOutError::TooManyRows {
                n_rows,
                slots: backend.slot_count(),
            });
        }
        let bytes = fs::read(path.as_ref())?;
        let ciphertext = backend.deserialize(&bytes)?;
        Ok(EncryptedColumn::new(ciphertext, n_rows))
    }

    /// Read columns `vector_0..vector_{count-1}` back into a dataset
    pub fn load<B: HeBackend>(
        &self,
        backend: &B,
        count: usize,
        n_rows: usize,
    ) -> Result<EncryptedDataset<B>> {
        let columns = (0..count)
            .map(|i| self.load_column(backend, self.column_path(i), n_rows))
            .collect::<Result<Vec<_>>>()?;
        EncryptedDataset::from_columns(n_rows, columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ClearBackend;
    use crate::crypto::SeedStreams;

    fn dataset(backend: &ClearBackend, n_variables: usize) -> (EncryptedDataset<ClearBackend>, crate::backend::KeySet<ClearBackend>) {
        let keys = backend
            .generate_keys(&mut SeedStreams::from_u64(0).control())
            .unwrap();
        let dataset = EncryptedDataset::encrypt_columns(
            backend,
            &keys.public_key,
            n_variables,
            3,
            &SeedStreams::from_u64(1),
            &ParallelMap::sequential(),
            |i| vec![i as f64, 10.0, 20.0],
        )
        .unwrap();
        (dataset, keys)
    }

    #[test]
    fn test_column_path() {
        let storage = DatasetStorage::new("/data/run");
        assert_eq!(storage.column_path(7), PathBuf::from("/data/run/vector_7"));
    }

    #[test]
    fn test_persist_all_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let backend = ClearBackend::new(4);
        let (dataset, keys) = dataset(&backend, 3);
        let storage = DatasetStorage::new(dir.path().join("nested"));

        let report = storage.persist_all(&backend, &dataset, &ParallelMap::new(2).unwrap());
        assert!(report.is_complete());
        assert_eq!(report.written.len(), 3);
        for (i, written) in report.written.iter().enumerate() {
            assert_eq!(written.index, i);
            let bytes = fs::read(&written.path).unwrap();
            assert_eq!(bytes.len() as u64, written.bytes);
            assert!(HashUtils::matches(&bytes, &written.sha256));
        }
        assert!(report.total_bytes() > 0);

        let reloaded = storage.load(&backend, 3, 3).unwrap();
        assert_eq!(reloaded.len(), 3);
        let first = reloaded.get(0).unwrap().decrypt(&backend, &keys.secret_key).unwrap();
        assert_eq!(first, vec![0.0, 10.0, 20.0]);
    }

    #[test]
    fn test_persist_all_is_best_effort() {
        let dir = tempfile::tempdir().unwrap();
        let backend = ClearBackend::new(4);
        let (dataset, _) = dataset(&backend, 3);
        // A directory at the destination of column 1 makes its write fail
        fs::create_dir(dir.path().join("vector_1")).unwrap();

        let storage = DatasetStorage::new(dir.path());
        let report = storage.persist_all(&backend, &dataset, &ParallelMap::sequential());

        assert!(!report.is_complete());
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].index, 1);
        let written: Vec<usize> = report.written.iter().map(|c| c.index).collect();
        assert_eq!(written, vec![0, 2]);
        assert!(dir.path().join("vector_2").is_file());
    }

    #[test]
    fn test_load_missing_column_fails() {
        let dir = tempfile::tempdir().unwrap();
        let backend = ClearBackend::new(4);
        let storage = DatasetStorage::new(dir.path());
        assert!(storage.load(&backend, 1, 3).is_err());
    }

    #[test]
    fn test_load_rejects_rows_beyond_slot_count() {
        let dir = tempfile::tempdir().unwrap();
        let backend = ClearBackend::new(4);
        let (dataset, _) = dataset(&backend, 1);
        let storage = DatasetStorage::new(dir.path());
        assert!(storage.persist_all(&backend, &dataset, &ParallelMap::sequential()).is_complete());

        assert!(matches!(
            storage.load_column(&backend, storage.column_path(0), 5),
            Err(OptOutError::TooManyRows { n_rows: 5, slots: 4 })
        ));
        assert!(storage.load_column(&backend, storage.column_path(0), 4).is_ok());
    }
}
