//! TF-IDF vectorizer over preprocessed text
//!
//! Loaded from a JSON export of a fitted scikit-learn `TfidfVectorizer`.
//! Transform semantics follow that implementation: token-pattern
//! tokenization, word n-grams joined by one space, raw term counts
//! (optionally binary or sublinear), idf weighting and row normalization.

use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use truthlens_core::{Error, Result};

/// Sparse feature row, indices strictly increasing.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseVector {
    dim: usize,
    indices: Vec<usize>,
    values: Vec<f64>,
}

impl SparseVector {
    /// Build from unsorted `(column, value)` pairs; zero values are dropped
    pub fn from_pairs(dim: usize, mut pairs: Vec<(usize, f64)>) -> Self {
        pairs.sort_by_key(|(idx, _)| *idx);
        let (indices, values): (Vec<usize>, Vec<f64>) =
            pairs.into_iter().filter(|(_, v)| *v != 0.0).unzip();
        Self {
            dim,
            indices,
            values,
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// Value at `idx`, zero when not stored
    pub fn get(&self, idx: usize) -> f64 {
        match self.indices.binary_search(&idx) {
            Ok(pos) => self.values[pos],
            Err(_) => 0.0,
        }
    }

    /// Stored `(column, value)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }
}

/// Row normalization applied after weighting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    #[default]
    L2,
    L1,
    None,
}

/// On-disk representation
#[derive(Debug, Clone, Deserialize)]
struct VectorizerArtifact {
    vocabulary: HashMap<String, usize>,

    #[serde(default)]
    idf: Option<Vec<f64>>,

    #[serde(default = "default_ngram_range")]
    ngram_range: (usize, usize),

    #[serde(default)]
    sublinear_tf: bool,

    #[serde(default)]
    norm: Norm,

    #[serde(default)]
    binary: bool,

    #[serde(default = "default_true")]
    lowercase: bool,

    #[serde(default = "default_token_pattern")]
    token_pattern: String,
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

fn default_true() -> bool {
    true
}

fn default_token_pattern() -> String {
    r"(?u)\b\w\w+\b".to_string()
}

/// Fitted TF-IDF vectorizer (read-only after load)
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Option<Vec<f64>>,
    ngram_range: (usize, usize),
    sublinear_tf: bool,
    norm: Norm,
    binary: bool,
    lowercase: bool,
    token_pattern: Regex,
}

impl TfidfVectorizer {
    /// Load a vectorizer export from disk
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::artifact(format!("Failed to read vectorizer {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
            .map_err(|e| Error::artifact(format!("Invalid vectorizer {}: {}", path.display(), e)))
    }

    /// Parse and validate a vectorizer export
    pub fn from_json(json: &str) -> Result<Self> {
        let artifact: VectorizerArtifact = serde_json::from_str(json)?;
        Self::from_artifact(artifact)
    }

    fn from_artifact(artifact: VectorizerArtifact) -> Result<Self> {
        let dim = artifact.vocabulary.len();

        if dim == 0 {
            return Err(Error::artifact("vectorizer vocabulary is empty"));
        }

        let mut seen = vec![false; dim];
        for (term, &idx) in &artifact.vocabulary {
            if idx >= dim || seen[idx] {
                return Err(Error::artifact(format!(
                    "vocabulary column {} for term '{}' is out of range or duplicated",
                    idx, term
                )));
            }
            seen[idx] = true;
        }

        if let Some(idf) = &artifact.idf {
            if idf.len() != dim {
                return Err(Error::artifact(format!(
                    "idf has {} entries but vocabulary has {}",
                    idf.len(),
                    dim
                )));
            }
        }

        let (min_n, max_n) = artifact.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(Error::artifact(format!(
                "invalid ngram_range ({}, {})",
                min_n, max_n
            )));
        }

        let token_pattern = Regex::new(&artifact.token_pattern).map_err(|e| {
            Error::artifact(format!(
                "invalid token_pattern '{}': {}",
                artifact.token_pattern, e
            ))
        })?;

        Ok(Self {
            vocabulary: artifact.vocabulary,
            idf: artifact.idf,
            ngram_range: artifact.ngram_range,
            sublinear_tf: artifact.sublinear_tf,
            norm: artifact.norm,
            binary: artifact.binary,
            lowercase: artifact.lowercase,
            token_pattern,
        })
    }

    /// Number of feature columns
    pub fn num_features(&self) -> usize {
        self.vocabulary.len()
    }

    /// Transform one document
    pub fn transform_one(&self, document: &str) -> SparseVector {
        let lowered;
        let document = if self.lowercase {
            lowered = document.to_lowercase();
            lowered.as_str()
        } else {
            document
        };

        let tokens: Vec<&str> = self
            .token_pattern
            .find_iter(document)
            .map(|m| m.as_str())
            .collect();

        let mut counts: HashMap<usize, f64> = HashMap::new();
        let (min_n, max_n) = self.ngram_range;
        for n in min_n..=max_n.min(tokens.len()) {
            for window in tokens.windows(n) {
                let gram = window.join(" ");
                if let Some(&idx) = self.vocabulary.get(&gram) {
                    *counts.entry(idx).or_insert(0.0) += 1.0;
                }
            }
        }

        let mut pairs: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(idx, count)| {
                let tf = if self.binary {
                    1.0
                } else if self.sublinear_tf {
                    1.0 + count.ln()
                } else {
                    count
                };
                let weight = self.idf.as_ref().map_or(1.0, |idf| idf[idx]);
                (idx, tf * weight)
            })
            .collect();

        let norm = match self.norm {
            Norm::L2 => pairs.iter().map(|(_, v)| v * v).sum::<f64>().sqrt(),
            Norm::L1 => pairs.iter().map(|(_, v)| v.abs()).sum::<f64>(),
            Norm::None => 1.0,
        };
        if norm > 0.0 {
            for (_, v) in &mut pairs {
                *v /= norm;
            }
        }

        SparseVector::from_pairs(self.num_features(), pairs)
    }

    /// Transform many documents, preserving order
    pub fn transform<S: AsRef<str>>(&self, documents: &[S]) -> Vec<SparseVector> {
        documents
            .iter()
            .map(|d| self.transform_one(d.as_ref()))
            .collect()
    }
}
