//! Encrypted dataset module
//!
//! This module provides the encrypted-column data model:
//! - Encrypted columns and the ordered dataset ([`store`])
//! - Column files on disk ([`storage`])
//! - Seeded demonstration data ([`generator`])

pub mod generator;
pub mod storage;
pub mod store;

// Re-export main types for convenience
pub use generator::DataGenerator;
pub use storage::{DatasetStorage, PersistFailure, PersistReport, PersistedColumn};
pub use store::{EncryptedColumn, EncryptedDataset};
