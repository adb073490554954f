//! Error types
//!
//! Every fallible operation in the crate returns [`Result`], whose error side
//! is [`OptOutError`].
//!
//! Cryptographic failures are fatal for the phase that raised them.
//! Persistence failures are not errors at the pipeline level: the column store
//! records them in its `PersistReport` and the run continues.

use thiserror::Error;

/// Errors raised by the opt-out protocol and its encryption capability
#[derive(Debug, Error)]
pub enum OptOutError {
    /// Encryption parameters cannot be satisfied
    #[error("invalid encryption parameters: {0}")]
    InvalidParameters(String),

    /// A row index does not address a row of the dataset
    #[error("row index {index} is out of range for a dataset of {n_rows} rows")]
    RowOutOfRange { index: usize, n_rows: usize },

    /// The dataset does not fit in the slots of one ciphertext
    #[error("{n_rows} rows do not fit in {slots} ciphertext slots")]
    TooManyRows { n_rows: usize, slots: usize },

    /// A column or vector does not have the expected number of rows
    #[error("shape mismatch for {what}: expected {expected}, found {found}")]
    ShapeMismatch {
        what: String,
        expected: usize,
        found: usize,
    },

    /// A homomorphic operation failed
    #[error("cryptographic operation failed: {0}")]
    Crypto(String),

    /// No modulus is left to rescale after a multiplication
    #[error("multiplicative depth exhausted: ciphertext is at level {level}")]
    DepthExhausted { level: usize },

    /// A ciphertext could not be encoded or decoded
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Invalid run configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    /// I/O failure
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The worker pool could not be created
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl From<bincode::error::EncodeError> for OptOutError {
    fn from(e: bincode::error::EncodeError) -> Self {
        OptOutError::Serialization(e.to_string())
    }
}

impl From<bincode::error::DecodeError> for OptOutError {
    fn from(e: bincode::error::DecodeError) -> Self {
        OptOutError::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for OptOutError {
    fn from(e: serde_json::Error) -> Self {
        OptOutError::Config(e.to_string())
    }
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, OptOutError>;
