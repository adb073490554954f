//! Run configuration
//!
//! [`ProtocolConfig`] gathers everything one protocol run needs: dataset
//! shape, the row to opt out, the verification row, parallelism, seeding,
//! persistence and the CKKS parameters. It can be loaded from JSON; command
//! line flags override individual fields afterwards.
//!
//! # Example
//!
//! ```rust
//! use optout_proof::config::ProtocolConfig;
//!
//! let config: ProtocolConfig = serde_json::from_str(
//!     r#"{ "n_patients": 4, "n_variables": 2, "target_index": 2 }"#,
//! )?;
//! assert_eq!(config.verify_index(), 2);
//! assert_eq!(config.tolerance, 1e-4);
//! config.validate()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::ckks::CkksParameters;
use crate::error::{OptOutError, Result};

/// Number of rows in the demonstration dataset
pub const DEFAULT_PATIENTS: usize = 3691;

/// Number of columns in the demonstration dataset
pub const DEFAULT_VARIABLES: usize = 480;

/// Largest decrypted magnitude still accepted as zero
pub const DEFAULT_TOLERANCE: f64 = 1e-4;

/// Configuration of one opt-out run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Rows per column
    pub n_patients: usize,
    /// Number of columns
    pub n_variables: usize,
    /// Row to opt out
    pub target_index: usize,
    /// Row selected by the verification indicator; `None` verifies the
    /// opted-out row itself
    pub verify_index: Option<usize>,
    /// Worker threads: 0 = rayon default, 1 = sequential
    pub threads: usize,
    /// Seed for data generation and encryption randomness; fresh when `None`
    pub seed: Option<u64>,
    /// Directory receiving the persisted columns
    pub output_dir: PathBuf,
    /// Write the encrypted dataset to `output_dir`
    pub persist: bool,
    /// Zero tolerance for decrypted proof values
    pub tolerance: f64,
    /// Encryption parameters
    pub ckks: CkksParameters,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            n_patients: DEFAULT_PATIENTS,
            n_variables: DEFAULT_VARIABLES,
            target_index: 0,
            verify_index: None,
            threads: 0,
            seed: None,
            output_dir: PathBuf::from("."),
            persist: true,
            tolerance: DEFAULT_TOLERANCE,
            ckks: CkksParameters::default(),
        }
    }
}

impl ProtocolConfig {
    /// Load a configuration from a JSON file
    ///
    /// Missing fields take their default values.
    ///
    /// # Arguments
    /// * `path` - Path to the JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            OptOutError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        let config: Self = serde_json::from_str(&text)?;
        log::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Row selected by the verification indicator
    pub fn verify_index(&self) -> usize {
        self.verify_index.unwrap_or(self.target_index)
    }

    /// Check shape, indices and tolerance
    ///
    /// # Returns
    /// `Ok(())` if the configuration describes a runnable protocol
    pub fn validate(&self) -> Result<()> {
        if self.n_patients == 0 {
            return Err(OptOutError::Config("n_patients must be positive".to_string()));
        }
        if self.n_variables == 0 {
            return Err(OptOutError::Config("n_variables must be positive".to_string()));
        }
        if self.target_index >= self.n_patients {
            return Err(OptOutError::RowOutOfRange {
                index: self.target_index,
                n_rows: self.n_patients,
            });
        }
        if self.verify_index() >= self.n_patients {
            return Err(OptOutError::RowOutOfRange {
                index: self.verify_index(),
                n_rows: self.n_patients,
            });
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(OptOutError::Config(format!(
                "tolerance must be a positive number, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }

    /// CKKS parameters with the batch size raised to cover every row
    pub fn ckks_parameters(&self) -> CkksParameters {
        let mut params = self.ckks.clone();
        params.batch_size = Some(params.batch_size.unwrap_or(0).max(self.n_patients));
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ProtocolConfig::default();
        assert_eq!(config.n_patients, 3691);
        assert_eq!(config.n_variables, 480);
        assert_eq!(config.verify_index(), 0);
        assert!(config.persist);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_indices() {
        let config = ProtocolConfig {
            n_patients: 4,
            target_index: 4,
            ..ProtocolConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(OptOutError::RowOutOfRange { index: 4, n_rows: 4 })
        ));

        let config = ProtocolConfig {
            n_patients: 4,
            target_index: 1,
            verify_index: Some(9),
            ..ProtocolConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(OptOutError::RowOutOfRange { index: 9, .. })
        ));
    }

    #[test]
    fn test_validate_rejects_empty_shape_and_bad_tolerance() {
        let empty = ProtocolConfig {
            n_variables: 0,
            ..ProtocolConfig::default()
        };
        assert!(matches!(empty.validate(), Err(OptOutError::Config(_))));

        let loose = ProtocolConfig {
            tolerance: f64::NAN,
            ..ProtocolConfig::default()
        };
        assert!(loose.validate().is_err());
    }

    #[test]
    fn test_from_file_partial_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "n_patients": 10, "seed": 5, "ckks": {{ "ring_dimension": 2048 }} }}"#
        )
        .unwrap();

        let config = ProtocolConfig::from_file(file.path()).unwrap();
        assert_eq!(config.n_patients, 10);
        assert_eq!(config.n_variables, DEFAULT_VARIABLES);
        assert_eq!(config.seed, Some(5));
        assert_eq!(config.ckks.ring_dimension, Some(2048));
        assert_eq!(config.ckks.multiplicative_depth, 2);
    }

    #[test]
    fn test_from_file_errors() {
        assert!(matches!(
            ProtocolConfig::from_file("/nonexistent/optout.json"),
            Err(OptOutError::Config(_))
        ));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            ProtocolConfig::from_file(file.path()),
            Err(OptOutError::Config(_))
        ));
    }

    #[test]
    fn test_batch_size_covers_rows() {
        let config = ProtocolConfig {
            n_patients: 5000,
            ..ProtocolConfig::default()
        };
        assert_eq!(config.ckks_parameters().batch_size, Some(5000));
    }
}
