//! Utilities module
//!
//! This module provides utilities shared across the pipeline:
//! - Logging set-up
//! - Formatting helpers
//! - Index-range parallel map
//!
//! # Example
//!
//! ```rust
//! use optout_proof::utils::{Helpers, ParallelMap};
//!
//! let map = ParallelMap::sequential();
//! let sizes = map.map(3, |i| Helpers::format_bytes(1024 << i));
//! assert_eq!(sizes[0], "1.00 KB");
//! ```

pub mod helpers;
pub mod logger;
pub mod parallel;

// Re-export main types for convenience
pub use helpers::Helpers;
pub use logger::Logger;
pub use parallel::ParallelMap;
