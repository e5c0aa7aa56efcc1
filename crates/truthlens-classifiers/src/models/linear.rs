//! Logistic regression
//!
//! Binary models carry a single coefficient row scoring the second class
//! (sigmoid). Models with `k > 2` classes carry `k` rows and use softmax.

use super::{ClassSet, FeatureRow};
use serde::Deserialize;
use truthlens_core::{Error, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct LogisticRegression {
    pub n_features: usize,
    pub classes: ClassSet,
    pub coef: Vec<Vec<f64>>,
    pub intercept: Vec<f64>,
}

impl LogisticRegression {
    pub(crate) fn validate(&self) -> Result<()> {
        let n_classes = self.classes.len();
        if n_classes < 2 {
            return Err(Error::artifact(
                "logistic regression needs at least two classes",
            ));
        }

        let expected_rows = if n_classes == 2 { 1 } else { n_classes };
        if self.coef.len() != expected_rows || self.intercept.len() != expected_rows {
            return Err(Error::artifact(format!(
                "logistic regression with {} classes needs {} coefficient rows and intercepts, got {} and {}",
                n_classes,
                expected_rows,
                self.coef.len(),
                self.intercept.len()
            )));
        }

        if let Some(row) = self.coef.iter().find(|row| row.len() != self.n_features) {
            return Err(Error::artifact(format!(
                "coefficient row has {} weights, expected {}",
                row.len(),
                self.n_features
            )));
        }

        Ok(())
    }

    fn decision_function<F: FeatureRow + ?Sized>(&self, x: &F) -> Vec<f64> {
        self.coef
            .iter()
            .zip(&self.intercept)
            .map(|(w, b)| x.dot(w) + b)
            .collect()
    }

    pub fn predict_proba<F: FeatureRow + ?Sized>(&self, x: &F) -> Vec<f64> {
        let scores = self.decision_function(x);
        if let [z] = scores.as_slice() {
            let p = sigmoid(*z);
            return vec![1.0 - p, p];
        }
        softmax(&scores)
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProbabilisticModel;

    #[test]
    fn test_binary_sigmoid() {
        let model = ProbabilisticModel::from_json(
            r#"{"kind": "logistic_regression", "n_features": 2,
                "classes": {"encoding": "encoded", "classes": [0, 1]},
                "coef": [[2.0, -1.0]], "intercept": [0.5]}"#,
        )
        .unwrap();

        let p = model.predict_proba(&[1.0, 2.5][..]).unwrap();
        // z = 2 - 2.5 + 0.5 = 0
        assert!((p[0] - 0.5).abs() < 1e-12);
        assert!((p[1] - 0.5).abs() < 1e-12);

        let p = model.predict_proba(&[0.0, 0.0][..]).unwrap();
        assert!((p[1] - sigmoid(0.5)).abs() < 1e-12);
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_multiclass_softmax() {
        let model = ProbabilisticModel::from_json(
            r#"{"kind": "logistic_regression", "n_features": 1,
                "classes": {"encoding": "raw", "classes": ["a", "b", "c"]},
                "coef": [[1.0], [0.0], [-1.0]], "intercept": [0.0, 0.0, 0.0]}"#,
        )
        .unwrap();

        let p = model.predict_proba(&[0.0][..]).unwrap();
        for v in &p {
            assert!((v - 1.0 / 3.0).abs() < 1e-12);
        }

        let p = model.predict_proba(&[3.0][..]).unwrap();
        assert!(p[0] > p[1] && p[1] > p[2]);
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_wrong_row_count() {
        let json = r#"{"kind": "logistic_regression", "n_features": 1,
                       "classes": {"encoding": "encoded", "classes": [0, 1]},
                       "coef": [[1.0], [2.0]], "intercept": [0.0, 0.0]}"#;
        assert!(ProbabilisticModel::from_json(json).is_err());
    }

    #[test]
    fn test_rejects_wrong_width() {
        let json = r#"{"kind": "logistic_regression", "n_features": 3,
                       "classes": {"encoding": "encoded", "classes": [0, 1]},
                       "coef": [[1.0]], "intercept": [0.0]}"#;
        assert!(ProbabilisticModel::from_json(json).is_err());
    }
}
