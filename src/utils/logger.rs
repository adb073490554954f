//! Logging utilities
//!
//! This module sets up the `log` facade with `env_logger`.
//! The level given at start-up is the default; `RUST_LOG` overrides it.
//!
//! # Example
//!
//! ```rust,no_run
//! use optout_proof::utils::Logger;
//!
//! // Initialize logger
//! Logger::init();
//!
//! log::info!("pipeline started");
//! ```

use std::str::FromStr;

use log::LevelFilter;

use crate::error::{OptOutError, Result};

/// Logging utilities
pub struct Logger;

impl Logger {
    /// Initialize the logger at `Info`
    ///
    /// Calling it more than once is harmless; later calls are ignored.
    pub fn init() {
        Self::init_with_level(LevelFilter::Info);
    }

    /// Initialize logger with custom log level
    ///
    /// # Arguments
    /// * `level` - Default log level filter
    pub fn init_with_level(level: LevelFilter) {
        let _ = env_logger::Builder::new()
            .filter_level(level)
            .parse_default_env()
            .format_timestamp_millis()
            .try_init();
    }

    /// Parse a level name such as `"debug"` or `"warn"`
    ///
    /// # Arguments
    /// * `name` - Level name, case-insensitive
    ///
    /// # Returns
    /// The matching filter, or a configuration error
    pub fn parse_level(name: &str) -> Result<LevelFilter> {
        LevelFilter::from_str(name)
            .map_err(|_| OptOutError::Config(format!("unknown log level '{name}'")))
    }
}
