//! Meta-fusion over the base model probabilities
//!
//! The feature vector is `[classical[0..n], transformer[0..n]]`, both halves
//! in canonical label order.

use crate::labels::{require_exact, LabelEncoder};
use crate::models::ProbabilisticModel;
use tracing::{debug, info};
use truthlens_core::{argmax, Error, LabelSet, Result};

/// Final decision of the meta-classifier
#[derive(Debug, Clone, PartialEq)]
pub struct FusedDecision {
    /// Canonical index of the predicted label
    pub index: usize,

    pub label: String,

    /// Meta-classifier probability of `label` (unrounded)
    pub confidence: f64,

    /// Meta-classifier probabilities in canonical order
    pub probabilities: Vec<f64>,
}

/// Stacked meta-classifier
pub struct MetaFusion {
    model: ProbabilisticModel,
    labels: LabelSet,
}

impl MetaFusion {
    pub fn new(
        model: ProbabilisticModel,
        encoder: &LabelEncoder,
        canonical: &LabelSet,
    ) -> Result<Self> {
        let classes = model.classes().resolve(encoder)?;
        require_exact("meta classifier", canonical, &classes)?;

        let expected = 2 * canonical.len();
        if model.n_features() != expected {
            return Err(Error::artifact(format!(
                "meta classifier expects {} features, fusion produces {}",
                model.n_features(),
                expected
            )));
        }

        info!(kind = model.kind(), "Meta classifier ready");
        Ok(Self {
            model,
            labels: canonical.clone(),
        })
    }

    /// Concatenate the two probability vectors in fixed order
    pub fn features(&self, classical: &[f64], transformer: &[f64]) -> Result<Vec<f64>> {
        let n = self.labels.len();
        if classical.len() != n || transformer.len() != n {
            return Err(Error::classifier(format!(
                "meta features need two vectors of {} probabilities, got {} and {}",
                n,
                classical.len(),
                transformer.len()
            )));
        }
        Ok(classical.iter().chain(transformer).copied().collect())
    }

    /// Fuse one pair of probability vectors
    pub fn fuse(&self, classical: &[f64], transformer: &[f64]) -> Result<FusedDecision> {
        let features = self.features(classical, transformer)?;
        let probabilities = self.model.predict_proba(features.as_slice())?;

        let (index, confidence) = argmax(&probabilities)
            .ok_or_else(|| Error::classifier("meta classifier returned no probabilities"))?;
        let label = self
            .labels
            .get(index)
            .ok_or_else(|| Error::internal(format!("meta class index {} out of range", index)))?
            .to_string();

        debug!(label = %label, confidence, "Meta fusion decision");
        Ok(FusedDecision {
            index,
            label,
            confidence,
            probabilities,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoder() -> LabelEncoder {
        LabelEncoder::new(vec!["fake".into(), "real".into()]).unwrap()
    }

    /// Binary logistic regression with every coefficient set to 1
    fn meta(classes: &str, n_features: usize, intercept: f64) -> Result<MetaFusion> {
        let coef = vec!["1.0"; n_features].join(", ");
        let model = ProbabilisticModel::from_json(&format!(
            r#"{{"kind": "logistic_regression", "n_features": {n_features},
                "classes": {classes}, "coef": [[{coef}]], "intercept": [{intercept}]}}"#
        ))?;
        let encoder = encoder();
        MetaFusion::new(model, &encoder, encoder.classes())
    }

    #[test]
    fn test_feature_order() {
        let fusion = meta(r#"{"encoding": "encoded", "classes": [0, 1]}"#, 4, 0.0).unwrap();
        let features = fusion.features(&[0.1, 0.9], &[0.3, 0.7]).unwrap();
        assert_eq!(features, vec![0.1, 0.9, 0.3, 0.7]);
        assert!(fusion.features(&[1.0], &[0.3, 0.7]).is_err());
    }

    #[test]
    fn test_confidence_is_model_probability() {
        // coefficients sum both vectors to 2.0, so z = 2 + b
        let b = -2.0 + (1.5f64).ln();
        let fusion = meta(r#"{"encoding": "raw", "classes": ["fake", "real"]}"#, 4, b).unwrap();
        let decision = fusion.fuse(&[0.5, 0.5], &[0.2, 0.8]).unwrap();
        assert_eq!(decision.label, "real");
        assert_eq!(decision.index, 1);
        assert!((decision.confidence - 0.6).abs() < 1e-12);
        assert_eq!(decision.confidence, decision.probabilities[1]);
    }

    #[test]
    fn test_tie_resolves_to_first_label() {
        let fusion = meta(r#"{"encoding": "encoded", "classes": [0, 1]}"#, 4, -2.0).unwrap();
        let decision = fusion.fuse(&[0.5, 0.5], &[0.5, 0.5]).unwrap();
        assert_eq!(decision.label, "fake");
        assert_eq!(decision.confidence, 0.5);
    }

    #[test]
    fn test_rejects_reordered_classes() {
        let err = meta(r#"{"encoding": "encoded", "classes": [1, 0]}"#, 4, 0.0);
        assert!(matches!(err, Err(Error::LabelOrder(_))));
    }

    #[test]
    fn test_rejects_wrong_width() {
        let err = meta(r#"{"encoding": "encoded", "classes": [0, 1]}"#, 3, 0.0);
        assert!(matches!(err, Err(Error::Artifact(_))));
    }
}
