//! TruthLens Classifiers
//!
//! Ensemble fake/real news classification.
//!
//! The pipeline runs in a fixed order:
//! - Text normalization shared by both base models
//! - A classical estimator: stopword removal, stemming, TF-IDF and a random forest
//! - A transformer estimator: fine-tuned DistilBERT on Candle
//! - A meta-classifier fusing both probability vectors into the final label
//!
//! All artifacts are loaded once into an immutable [`InferenceContext`] and
//! validated against a single canonical label order.

pub mod classical;
pub mod classifier;
pub mod config;
pub mod labels;
pub mod meta;
pub mod model_loader;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod preprocess;
pub mod stopwords;
pub mod transformer;
pub mod vectorizer;

pub use classical::ClassicalEstimator;
pub use classifier::ProbabilityEstimator;
pub use config::{ArtifactPaths, EnsembleConfig, InferenceConfig};
pub use labels::{ColumnOrder, LabelEncoder};
pub use meta::{FusedDecision, MetaFusion};
pub use model_loader::{ContextSummary, InferenceContext};
pub use models::{ClassSet, ProbabilisticModel};
pub use normalize::{clean_optional, clean_text, preprocess_corpus, TextNormalizer};
pub use pipeline::{
    confidence_note, EnsemblePipeline, DEFAULT_CONFIDENCE_THRESHOLD, HIGH_CONFIDENCE_NOTE,
    LOW_CONFIDENCE_NOTE,
};
pub use preprocess::{
    preprocess_corpus_for_classical, preprocess_for_classical, tokenize_porter, tokenize_simple,
    ClassicalPreprocessor, PreprocessOptions,
};
pub use transformer::{TransformerCheckpoint, TransformerEstimator};
pub use vectorizer::{SparseVector, TfidfVectorizer};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::classifier::ProbabilityEstimator;
    pub use crate::config::EnsembleConfig;
    pub use crate::model_loader::InferenceContext;
    pub use crate::pipeline::EnsemblePipeline;
    pub use truthlens_core::{PredictionMode, PredictionResult};
}
