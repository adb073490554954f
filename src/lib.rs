//! OptOut Proof: proof of deletion for encrypted tabular datasets
//!
//! This library lets a data holder prove that one row of a fully encrypted
//! dataset has been zeroed out in every column, without decrypting any
//! individual record. Only the final proof, one scalar per column, is ever
//! decrypted.
//!
//! # Example
//!
//! ```no_run
//! use optout_proof::backend::CkksBackend;
//! use optout_proof::config::ProtocolConfig;
//! use optout_proof::dataset::DataGenerator;
//! use optout_proof::protocol::PipelineContext;
//!
//! let config = ProtocolConfig { target_index: 42, ..ProtocolConfig::default() };
//! let backend = CkksBackend::new(&config.ckks_parameters())?;
//! let pipeline = PipelineContext::new(backend, config)?;
//!
//! let report = pipeline.run(&DataGenerator::new(7))?;
//! assert!(report.proof.confirms_deletion(1e-4));
//! # Ok::<(), optout_proof::error::OptOutError>(())
//! ```

pub use error::{OptOutError, Result};

/// OptOut Proof version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Main modules
pub mod backend;
pub mod ckks;
pub mod config;
pub mod crypto;
pub mod dataset;
pub mod error;
pub mod protocol;
pub mod utils;
