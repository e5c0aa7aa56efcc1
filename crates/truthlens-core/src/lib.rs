//! TruthLens Core
//!
//! Core types and utilities shared across TruthLens components.
//!
//! This crate provides:
//! - Error types and result handling
//! - The canonical label set every probability vector is aligned to
//! - Probability matrices and prediction results

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{
    argmax, round4, LabelSet, ModelBreakdown, ModelVote, PredictionMode, PredictionResult,
    ProbabilityMatrix,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::types::{LabelSet, PredictionMode, PredictionResult, ProbabilityMatrix};
}
