//! Pretrained probabilistic models loaded from JSON exports
//!
//! Both the classical classifier and the meta-classifier are one of these.
//! The export declares its class set explicitly, either as label-encoder
//! indices or as raw label strings.

pub mod forest;
pub mod linear;

pub use forest::{DecisionTree, RandomForest};
pub use linear::LogisticRegression;

use crate::labels::LabelEncoder;
use crate::vectorizer::SparseVector;
use serde::Deserialize;
use std::path::Path;
use truthlens_core::{Error, Result};

/// A feature row a model can read from
pub trait FeatureRow {
    /// Number of columns
    fn dim(&self) -> usize;

    /// Value at column `idx` (zero when absent)
    fn value(&self, idx: usize) -> f64;

    /// Dot product with a dense weight row of the same width
    fn dot(&self, weights: &[f64]) -> f64;
}

impl FeatureRow for SparseVector {
    fn dim(&self) -> usize {
        SparseVector::dim(self)
    }

    fn value(&self, idx: usize) -> f64 {
        self.get(idx)
    }

    fn dot(&self, weights: &[f64]) -> f64 {
        self.iter().map(|(idx, v)| v * weights[idx]).sum()
    }
}

impl FeatureRow for [f64] {
    fn dim(&self) -> usize {
        self.len()
    }

    fn value(&self, idx: usize) -> f64 {
        self.get(idx).copied().unwrap_or(0.0)
    }

    fn dot(&self, weights: &[f64]) -> f64 {
        self.iter().zip(weights).map(|(x, w)| x * w).sum()
    }
}

/// Declared class set of a model, in the model's own column order
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "encoding", content = "classes", rename_all = "lowercase")]
pub enum ClassSet {
    /// Integer classes produced by the label encoder
    Encoded(Vec<usize>),
    /// Label strings
    Raw(Vec<String>),
}

impl ClassSet {
    pub fn len(&self) -> usize {
        match self {
            Self::Encoded(classes) => classes.len(),
            Self::Raw(classes) => classes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Label strings in model column order, decoding through `encoder` if needed
    pub fn resolve(&self, encoder: &LabelEncoder) -> Result<Vec<String>> {
        match self {
            Self::Raw(classes) => Ok(classes.clone()),
            Self::Encoded(classes) => encoder.inverse_transform(classes),
        }
    }
}

/// Supported model families
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProbabilisticModel {
    RandomForest(RandomForest),
    LogisticRegression(LogisticRegression),
}

impl ProbabilisticModel {
    /// Load and validate a model export
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::artifact(format!("Failed to read model {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
            .map_err(|e| Error::artifact(format!("Invalid model {}: {}", path.display(), e)))
    }

    /// Parse and validate a model export
    pub fn from_json(json: &str) -> Result<Self> {
        let model: Self = serde_json::from_str(json)?;
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> Result<()> {
        match self {
            Self::RandomForest(m) => m.validate(),
            Self::LogisticRegression(m) => m.validate(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::RandomForest(_) => "random_forest",
            Self::LogisticRegression(_) => "logistic_regression",
        }
    }

    pub fn classes(&self) -> &ClassSet {
        match self {
            Self::RandomForest(m) => &m.classes,
            Self::LogisticRegression(m) => &m.classes,
        }
    }

    pub fn n_features(&self) -> usize {
        match self {
            Self::RandomForest(m) => m.n_features,
            Self::LogisticRegression(m) => m.n_features,
        }
    }

    /// Class probabilities in the model's own column order
    pub fn predict_proba<F: FeatureRow + ?Sized>(&self, x: &F) -> Result<Vec<f64>> {
        if x.dim() != self.n_features() {
            return Err(Error::classifier(format!(
                "{} expects {} features, got {}",
                self.kind(),
                self.n_features(),
                x.dim()
            )));
        }

        Ok(match self {
            Self::RandomForest(m) => m.predict_proba(x),
            Self::LogisticRegression(m) => m.predict_proba(x),
        })
    }
}
