//! Label encoder and canonical label alignment
//!
//! Every probability vector in the ensemble is indexed by the canonical
//! label order. The alignment helpers check each artifact's declared order
//! against it once at load time.

use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};
use truthlens_core::{Error, LabelSet, Result};

/// Fitted label encoder: class index `i` encodes `classes[i]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LabelEncoder {
    classes: LabelSet,
}

impl LabelEncoder {
    pub fn new(classes: Vec<String>) -> Result<Self> {
        Ok(Self {
            classes: LabelSet::new(classes)?,
        })
    }

    /// Load `{"classes": [...]}` from disk
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::artifact(format!(
                "Failed to read label encoder {}: {}",
                path.display(),
                e
            ))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            Error::artifact(format!("Invalid label encoder {}: {}", path.display(), e))
        })
    }

    pub fn classes(&self) -> &LabelSet {
        &self.classes
    }

    /// Decode class indices into label strings
    pub fn inverse_transform(&self, encoded: &[usize]) -> Result<Vec<String>> {
        encoded
            .iter()
            .map(|&idx| {
                self.classes.get(idx).map(str::to_string).ok_or_else(|| {
                    Error::label_order(format!(
                        "encoded class {} is outside the label encoder's {} classes",
                        idx,
                        self.classes.len()
                    ))
                })
            })
            .collect()
    }
}

/// Establish the canonical order from the config (if any) and the encoder.
pub fn canonical_labels(configured: Option<&LabelSet>, encoder: &LabelEncoder) -> Result<LabelSet> {
    match configured {
        Some(labels) if labels != encoder.classes() => Err(Error::label_order(format!(
            "configured labels {} differ from label encoder classes {}",
            labels,
            encoder.classes()
        ))),
        Some(labels) => Ok(labels.clone()),
        None => Ok(encoder.classes().clone()),
    }
}

/// Mapping from canonical column to a model's own column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnOrder {
    source_columns: Vec<usize>,
}

impl ColumnOrder {
    pub fn identity(n: usize) -> Self {
        Self {
            source_columns: (0..n).collect(),
        }
    }

    /// Compute the reordering from `model_classes` to `canonical`.
    ///
    /// Both sides must hold the same labels; the order may differ.
    pub fn align(source: &str, canonical: &LabelSet, model_classes: &[String]) -> Result<Self> {
        if !canonical.same_members(model_classes) {
            return Err(Error::label_order(format!(
                "{} classes [{}] do not match canonical labels {}",
                source,
                model_classes.join(", "),
                canonical
            )));
        }

        let source_columns = canonical
            .iter()
            .map(|label| {
                model_classes
                    .iter()
                    .position(|c| c == label)
                    .ok_or_else(|| {
                        Error::label_order(format!("{} has no column for '{}'", source, label))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        let order = Self { source_columns };
        if order.is_identity() {
            info!(source, labels = %canonical, "Class order matches canonical labels");
        } else {
            info!(
                source,
                labels = %canonical,
                columns = ?order.source_columns,
                "Reordering class columns to canonical labels"
            );
        }
        Ok(order)
    }

    pub fn is_identity(&self) -> bool {
        self.source_columns.iter().enumerate().all(|(i, &c)| i == c)
    }

    /// Reorder one probability row from model order to canonical order
    pub fn apply(&self, row: &[f64]) -> Vec<f64> {
        self.source_columns.iter().map(|&c| row[c]).collect()
    }
}

/// Require `model_classes` to equal the canonical order exactly.
pub fn require_exact(source: &str, canonical: &LabelSet, model_classes: &[String]) -> Result<()> {
    if model_classes != canonical.as_slice() {
        return Err(Error::label_order(format!(
            "{} classes [{}] must equal canonical labels {} in order",
            source,
            model_classes.join(", "),
            canonical
        )));
    }
    Ok(())
}

/// Check a transformer head against the canonical labels.
///
/// Without declared labels only the width can be verified.
pub fn check_transformer_labels(
    canonical: &LabelSet,
    num_labels: usize,
    declared: Option<&[String]>,
) -> Result<()> {
    if num_labels != canonical.len() {
        return Err(Error::label_order(format!(
            "transformer has {} output labels, canonical set has {}",
            num_labels,
            canonical.len()
        )));
    }

    match declared {
        Some(labels) => require_exact("transformer", canonical, labels),
        None => {
            warn!(
                labels = %canonical,
                "Transformer checkpoint declares no labels; assuming canonical output order"
            );
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> LabelSet {
        LabelSet::new(["fake", "real"]).unwrap()
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_encoder_from_json() {
        let encoder: LabelEncoder = serde_json::from_str(r#"{"classes": ["fake", "real"]}"#).unwrap();
        assert_eq!(encoder.classes(), &labels());
        assert_eq!(encoder.inverse_transform(&[1, 0]).unwrap(), strings(&["real", "fake"]));
        assert!(encoder.inverse_transform(&[5]).is_err());

        assert!(serde_json::from_str::<LabelEncoder>(r#"{"classes": []}"#).is_err());
    }

    #[test]
    fn test_canonical_labels() {
        let encoder = LabelEncoder::new(strings(&["fake", "real"])).unwrap();
        assert_eq!(canonical_labels(None, &encoder).unwrap(), labels());
        assert_eq!(canonical_labels(Some(&labels()), &encoder).unwrap(), labels());

        let swapped = LabelSet::new(["real", "fake"]).unwrap();
        let err = canonical_labels(Some(&swapped), &encoder).unwrap_err();
        assert!(matches!(err, Error::LabelOrder(_)));
    }

    #[test]
    fn test_column_order_reorders() {
        let order = ColumnOrder::align("classical", &labels(), &strings(&["real", "fake"])).unwrap();
        assert!(!order.is_identity());
        assert_eq!(order.apply(&[0.9, 0.1]), vec![0.1, 0.9]);

        let identity = ColumnOrder::align("classical", &labels(), &strings(&["fake", "real"])).unwrap();
        assert!(identity.is_identity());
        assert_eq!(identity, ColumnOrder::identity(2));
    }

    #[test]
    fn test_column_order_rejects_other_labels() {
        let err = ColumnOrder::align("classical", &labels(), &strings(&["fake", "satire"]));
        assert!(matches!(err, Err(Error::LabelOrder(_))));
        let err = ColumnOrder::align("classical", &labels(), &strings(&["fake"]));
        assert!(err.is_err());
    }

    #[test]
    fn test_require_exact() {
        assert!(require_exact("meta", &labels(), &strings(&["fake", "real"])).is_ok());
        assert!(require_exact("meta", &labels(), &strings(&["real", "fake"])).is_err());
    }

    #[test]
    fn test_transformer_labels() {
        assert!(check_transformer_labels(&labels(), 2, None).is_ok());
        assert!(check_transformer_labels(&labels(), 3, None).is_err());
        let declared = strings(&["real", "fake"]);
        assert!(check_transformer_labels(&labels(), 2, Some(&declared)).is_err());
    }
}
