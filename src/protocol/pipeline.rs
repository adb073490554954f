//! Pipeline context
//!
//! [`PipelineContext`] owns everything a protocol run needs (backend, key
//! material, configuration, parallel map and randomness) and runs the phases
//! in order:
//!
//! 1. Key generation (sequential, in [`PipelineContext::new`])
//! 2. Data generation and encryption (parallel over columns)
//! 3. Persistence (parallel, best-effort)
//! 4. Masking with the request indicator (parallel)
//! 5. Verification with the verification indicator (parallel)
//! 6. Proof extraction (parallel decryption)
//!
//! # Example
//!
//! ```rust
//! use optout_proof::backend::ClearBackend;
//! use optout_proof::config::ProtocolConfig;
//! use optout_proof::dataset::DataGenerator;
//! use optout_proof::protocol::PipelineContext;
//!
//! let config = ProtocolConfig {
//!     n_patients: 16,
//!     n_variables: 3,
//!     target_index: 5,
//!     persist: false,
//!     seed: Some(1),
//!     ..ProtocolConfig::default()
//! };
//! let pipeline = PipelineContext::new(ClearBackend::new(16), config)?;
//! let report = pipeline.run(&DataGenerator::new(1))?;
//! assert!(report.proof.confirms_deletion(1e-9));
//! # Ok::<(), optout_proof::error::OptOutError>(())
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;

use super::extractor::{DeletionProof, ProofExtractor};
use super::indicator::IndicatorEncoder;
use super::masker::OptOutMasker;
use super::verifier::DeletionVerifier;
use crate::backend::{HeBackend, KeySet};
use crate::config::ProtocolConfig;
use crate::crypto::SeedStreams;
use crate::dataset::{DataGenerator, DatasetStorage, EncryptedColumn, EncryptedDataset, PersistReport};
use crate::error::{OptOutError, Result};
use crate::utils::ParallelMap;

/// Wall-clock time of each phase
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PhaseTimings {
    /// Key and evaluation key generation
    pub key_generation: Duration,
    /// Data generation and column encryption
    pub encryption: Duration,
    /// Writing the dataset
    pub persistence: Duration,
    /// Indicator encryption and masking
    pub masking: Duration,
    /// Verification pass
    pub verification: Duration,
    /// Decryption of the proof
    pub extraction: Duration,
}

impl PhaseTimings {
    /// Sum over all phases
    pub fn total(&self) -> Duration {
        self.key_generation
            + self.encryption
            + self.persistence
            + self.masking
            + self.verification
            + self.extraction
    }
}

/// Outcome of [`PipelineContext::run`]
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    /// Backend name
    pub backend: String,
    /// Slots per ciphertext
    pub batch_size: usize,
    /// Rows per column
    pub n_patients: usize,
    /// Number of columns
    pub n_variables: usize,
    /// Phase timings
    pub timings: PhaseTimings,
    /// Persistence outcome, `None` when persistence is disabled
    pub persist: Option<PersistReport>,
    /// The proof
    pub proof: DeletionProof,
}

/// Intermediate results of one opt-out
pub struct OptOutOutcome<B: HeBackend> {
    /// Columns after masking
    pub masked: Vec<EncryptedColumn<B>>,
    /// Columns after verification
    pub verification: Vec<EncryptedColumn<B>>,
    /// Decrypted proof
    pub proof: DeletionProof,
}

/// Everything one protocol run needs
pub struct PipelineContext<B: HeBackend> {
    backend: B,
    keys: KeySet<B>,
    config: ProtocolConfig,
    parallel: ParallelMap,
    streams: SeedStreams,
    batches: AtomicU64,
    key_generation: Duration,
}

impl<B: HeBackend> PipelineContext<B> {
    /// Validate the configuration and generate key material
    ///
    /// # Arguments
    /// * `backend` - Encryption backend
    /// * `config` - Run configuration
    ///
    /// # Returns
    /// The context, or an error if the configuration is invalid, the rows do
    /// not fit in one ciphertext, or key generation fails
    pub fn new(backend: B, config: ProtocolConfig) -> Result<Self> {
        config.validate()?;
        if config.n_patients > backend.slot_count() {
            return Err(OptOutError::TooManyRows {
                n_rows: config.n_patients,
                slots: backend.slot_count(),
            });
        }
        let parallel = ParallelMap::new(config.threads)?;
        let streams = SeedStreams::from_option(config.seed);

        log::info!(
            "generating keys ({} backend, {} slots, {} worker threads)",
            backend.name(),
            backend.slot_count(),
            parallel.threads()
        );
        let start = Instant::now();
        let keys = backend.generate_keys(&mut streams.control())?;
        let key_generation = start.elapsed();
        log::info!("keys ready in {:?}", key_generation);

        Ok(Self {
            backend,
            keys,
            config,
            parallel,
            streams,
            batches: AtomicU64::new(0),
            key_generation,
        })
    }

    /// Fresh streams for one encryption batch
    ///
    /// Every call gets its own batch number, so two encryptions under this
    /// context never share noise even when they use the same stream id.
    fn next_streams(&self) -> SeedStreams {
        let batch = self.batches.fetch_add(1, Ordering::Relaxed);
        log::trace!("encryption batch {batch}");
        self.streams.derive(batch)
    }

    /// Encryption backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Key material
    pub fn keys(&self) -> &KeySet<B> {
        &self.keys
    }

    /// Run configuration
    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    /// Parallel map used by every phase
    pub fn parallel(&self) -> &ParallelMap {
        &self.parallel
    }

    /// Generate and encrypt the dataset
    pub fn generate_dataset(&self, generator: &DataGenerator) -> Result<EncryptedDataset<B>> {
        let n_rows = self.config.n_patients;
        EncryptedDataset::encrypt_columns(
            &self.backend,
            &self.keys.public_key,
            self.config.n_variables,
            n_rows,
            &self.next_streams(),
            &self.parallel,
            |i| generator.column(i, n_rows),
        )
    }

    /// Encrypt caller-provided plaintext columns
    ///
    /// # Arguments
    /// * `columns` - One vector of `n_rows` values per column
    /// * `n_rows` - Rows per column
    pub fn encrypt_dataset(&self, columns: &[Vec<f64>], n_rows: usize) -> Result<EncryptedDataset<B>> {
        EncryptedDataset::encrypt_columns(
            &self.backend,
            &self.keys.public_key,
            columns.len(),
            n_rows,
            &self.next_streams(),
            &self.parallel,
            |i| columns[i].clone(),
        )
    }

    /// Persist the dataset to the configured directory
    pub fn persist(&self, dataset: &EncryptedDataset<B>) -> PersistReport {
        let storage = DatasetStorage::new(self.config.output_dir.clone());
        let report = storage.persist_all(&self.backend, dataset, &self.parallel);
        if report.is_complete() {
            log::info!(
                "persisted {} columns to {}",
                report.written.len(),
                storage.dir().display()
            );
        } else {
            log::warn!(
                "persisted {} of {} columns to {}",
                report.written.len(),
                dataset.len(),
                storage.dir().display()
            );
        }
        report
    }

    /// Opt out `target_index` and verify at `verify_index`
    ///
    /// Both indices are checked against the dataset before any encryption.
    pub fn opt_out(
        &self,
        dataset: &EncryptedDataset<B>,
        target_index: usize,
        verify_index: usize,
    ) -> Result<OptOutOutcome<B>> {
        let mut timings = PhaseTimings::default();
        self.opt_out_timed(dataset, target_index, verify_index, &mut timings)
    }

    fn opt_out_timed(
        &self,
        dataset: &EncryptedDataset<B>,
        target_index: usize,
        verify_index: usize,
        timings: &mut PhaseTimings,
    ) -> Result<OptOutOutcome<B>> {
        let n_rows = dataset.n_rows();
        let request = IndicatorEncoder::request(n_rows, target_index)?;
        let verification = IndicatorEncoder::verification(n_rows, verify_index)?;

        let mut rng = self.next_streams().control();

        let start = Instant::now();
        log::info!("masking row {target_index} in {} columns", dataset.len());
        let request = IndicatorEncoder::encrypt(&self.backend, &self.keys.public_key, &request, &mut rng)?;
        let masked = OptOutMasker::new(&self.backend, &self.keys.eval_key, &self.parallel)
            .mask(dataset, &request)?;
        timings.masking = start.elapsed();

        let start = Instant::now();
        log::info!("verifying row {verify_index}");
        let verification =
            IndicatorEncoder::encrypt(&self.backend, &self.keys.public_key, &verification, &mut rng)?;
        let checked = DeletionVerifier::new(&self.backend, &self.keys.eval_key, &self.parallel)
            .verify(&masked, &verification)?;
        timings.verification = start.elapsed();

        let start = Instant::now();
        let proof = ProofExtractor::new(&self.backend, &self.keys.secret_key, &self.parallel)
            .extract(&checked, target_index, verify_index)?;
        timings.extraction = start.elapsed();
        log::info!("proof extracted: max |value| = {:e}", proof.max_abs());

        Ok(OptOutOutcome {
            masked,
            verification: checked,
            proof,
        })
    }

    /// Run every phase with the configured target and verification rows
    pub fn run(&self, generator: &DataGenerator) -> Result<PipelineReport> {
        let mut timings = PhaseTimings {
            key_generation: self.key_generation,
            ..PhaseTimings::default()
        };

        let start = Instant::now();
        log::info!(
            "encrypting {} columns of {} rows",
            self.config.n_variables,
            self.config.n_patients
        );
        let dataset = self.generate_dataset(generator)?;
        timings.encryption = start.elapsed();

        let persist = if self.config.persist {
            let start = Instant::now();
            let report = self.persist(&dataset);
            timings.persistence = start.elapsed();
            Some(report)
        } else {
            None
        };

        let outcome = self.opt_out_timed(
            &dataset,
            self.config.target_index,
            self.config.verify_index(),
            &mut timings,
        )?;

        let proof = outcome.proof;
        if proof.target_index == proof.verify_index && !proof.confirms_deletion(self.config.tolerance) {
            log::warn!(
                "proof entry {:e} exceeds tolerance {:e}",
                proof.max_abs(),
                self.config.tolerance
            );
        }

        Ok(PipelineReport {
            backend: self.backend.name().to_string(),
            batch_size: self.backend.slot_count(),
            n_patients: self.config.n_patients,
            n_variables: self.config.n_variables,
            timings,
            persist,
            proof,
        })
    }
}

impl<B: HeBackend> std::fmt::Debug for PipelineContext<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineContext")
            .field("backend", &self.backend.name())
            .field("config", &self.config)
            .field("parallel", &self.parallel)
            .finish_non_exhaustive()
    }
}
