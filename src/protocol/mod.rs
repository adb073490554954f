//! Opt-out protocol
//!
//! This module implements proof of deletion over an encrypted dataset:
//! - Indicator vectors marking the row to opt out ([`indicator`])
//! - Masking every column with the request indicator ([`masker`])
//! - Isolating the opted-out row with the verification indicator
//!   ([`verifier`])
//! - Decrypting the isolated values into the proof ([`extractor`])
//! - Running all phases from one context ([`pipeline`])
//!
//! For a column `d`, target row `t` and verified row `k`:
//!
//! ```text
//! masked[i]       = d[i] · (i == t ? 0 : 1)
//! verification[i] = masked[i] · (i == k ? 1 : 0)
//! proof           = verification[k]
//! ```
//!
//! With `k == t` every proof entry is 0 up to encryption noise.

pub mod extractor;
pub mod indicator;
pub mod masker;
pub mod pipeline;
pub mod verifier;

// Re-export main types for convenience
pub use extractor::{DeletionProof, ProofExtractor};
pub use indicator::IndicatorEncoder;
pub use masker::OptOutMasker;
pub use pipeline::{OptOutOutcome, PhaseTimings, PipelineContext, PipelineReport};
pub use verifier::DeletionVerifier;
