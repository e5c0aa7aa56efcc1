//! Core types for TruthLens

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ordered set of class labels.
///
/// The order is the canonical label order: column `i` of every probability
/// row produced anywhere in the ensemble refers to `labels[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct LabelSet {
    labels: Vec<String>,
}

impl LabelSet {
    /// Create a label set, rejecting empty or duplicated labels
    pub fn new<I, S>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();

        if labels.is_empty() {
            return Err(Error::config("label set must not be empty"));
        }

        for (idx, label) in labels.iter().enumerate() {
            if label.is_empty() {
                return Err(Error::config(format!("label at position {} is empty", idx)));
            }
            if labels[..idx].contains(label) {
                return Err(Error::config(format!("duplicate label '{}'", label)));
            }
        }

        Ok(Self { labels })
    }

    /// Number of labels
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Always false for a constructed set; present for API symmetry
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Label at canonical position `idx`
    pub fn get(&self, idx: usize) -> Option<&str> {
        self.labels.get(idx).map(String::as_str)
    }

    /// Canonical position of `label`
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    /// Check whether `other` holds the same labels, in any order
    pub fn same_members(&self, other: &[String]) -> bool {
        other.len() == self.labels.len() && other.iter().all(|l| self.index_of(l).is_some())
    }

    /// Iterate labels in canonical order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    /// Labels as a slice
    pub fn as_slice(&self) -> &[String] {
        &self.labels
    }
}

impl TryFrom<Vec<String>> for LabelSet {
    type Error = Error;

    fn try_from(labels: Vec<String>) -> Result<Self> {
        Self::new(labels)
    }
}

impl From<LabelSet> for Vec<String> {
    fn from(set: LabelSet) -> Self {
        set.labels
    }
}

impl fmt::Display for LabelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.labels.join(", "))
    }
}

/// Row-major matrix of class probabilities, one row per input text.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityMatrix {
    rows: Vec<Vec<f64>>,
    num_labels: usize,
}

impl ProbabilityMatrix {
    /// Build a matrix, checking that every row has `num_labels` columns
    pub fn new(rows: Vec<Vec<f64>>, num_labels: usize) -> Result<Self> {
        if let Some((idx, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != num_labels) {
            return Err(Error::classifier(format!(
                "probability row {} has {} columns, expected {}",
                idx,
                row.len(),
                num_labels
            )));
        }
        Ok(Self { rows, num_labels })
    }

    /// Number of rows (input texts)
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns (labels)
    pub fn num_labels(&self) -> usize {
        self.num_labels
    }

    /// Row `idx`
    pub fn row(&self, idx: usize) -> Option<&[f64]> {
        self.rows.get(idx).map(Vec::as_slice)
    }

    /// All rows
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Consume into rows
    pub fn into_rows(self) -> Vec<Vec<f64>> {
        self.rows
    }
}

/// Index and value of the largest entry; ties resolve to the lowest index.
pub fn argmax(values: &[f64]) -> Option<(usize, f64)> {
    values
        .iter()
        .copied()
        .enumerate()
        .fold(None, |best, (idx, value)| match best {
            Some((_, best_value)) if best_value >= value => best,
            _ => Some((idx, value)),
        })
}

/// Which model decides the final label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionMode {
    /// Meta-classifier over both base models
    #[default]
    Ensemble,
    /// Classical bag-of-words model alone
    Classical,
    /// Transformer alone
    Transformer,
}

impl PredictionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ensemble => "ensemble",
            Self::Classical => "classical",
            Self::Transformer => "transformer",
        }
    }
}

impl FromStr for PredictionMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ensemble" => Ok(Self::Ensemble),
            "classical" => Ok(Self::Classical),
            "transformer" => Ok(Self::Transformer),
            other => Err(format!(
                "unknown mode '{}' (expected ensemble, classical or transformer)",
                other
            )),
        }
    }
}

impl fmt::Display for PredictionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single base model's decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelVote {
    /// Argmax label
    pub label: String,

    /// Probability of the argmax label
    pub confidence: f64,

    /// Probabilities in canonical label order
    pub probabilities: Vec<f64>,
}

/// Per-model votes behind an ensemble decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelBreakdown {
    pub classical: ModelVote,
    pub transformer: ModelVote,
}

/// Final output of the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Predicted label
    pub final_prediction: String,

    /// Confidence in [0, 1], rounded to 4 decimals
    pub confidence: f64,

    /// Human-readable reliability note
    pub confidence_note: String,

    /// Model that produced `final_prediction`
    pub mode: PredictionMode,

    /// Base model votes (when requested)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<ModelBreakdown>,
}

/// Round to 4 decimal places
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
