//! Classical bag-of-words estimator
//!
//! preprocess -> TF-IDF -> tree ensemble, with the model's class columns
//! reordered into canonical label order.

use crate::classifier::ProbabilityEstimator;
use crate::labels::{ColumnOrder, LabelEncoder};
use crate::models::ProbabilisticModel;
use crate::preprocess::ClassicalPreprocessor;
use crate::vectorizer::TfidfVectorizer;
use tracing::{debug, info};
use truthlens_core::{Error, LabelSet, ProbabilityMatrix, Result};

pub struct ClassicalEstimator {
    preprocessor: ClassicalPreprocessor,
    vectorizer: TfidfVectorizer,
    model: ProbabilisticModel,
    columns: ColumnOrder,
    num_labels: usize,
}

impl ClassicalEstimator {
    /// Build the estimator, aligning the model's classes to `canonical`.
    ///
    /// Fails when the model's feature width differs from the vectorizer's
    /// vocabulary, or when its classes are not the canonical labels.
    pub fn new(
        preprocessor: ClassicalPreprocessor,
        vectorizer: TfidfVectorizer,
        model: ProbabilisticModel,
        encoder: &LabelEncoder,
        canonical: &LabelSet,
    ) -> Result<Self> {
        if model.n_features() != vectorizer.num_features() {
            return Err(Error::artifact(format!(
                "classical model expects {} features, vectorizer produces {}",
                model.n_features(),
                vectorizer.num_features()
            )));
        }

        let model_classes = model.classes().resolve(encoder)?;
        let columns = ColumnOrder::align("classical model", canonical, &model_classes)?;

        info!(
            kind = model.kind(),
            features = vectorizer.num_features(),
            "Classical estimator ready"
        );

        Ok(Self {
            preprocessor,
            vectorizer,
            model,
            columns,
            num_labels: canonical.len(),
        })
    }

    pub fn preprocessor(&self) -> &ClassicalPreprocessor {
        &self.preprocessor
    }

    pub fn column_order(&self) -> &ColumnOrder {
        &self.columns
    }

    fn predict_one(&self, text: &str) -> Result<Vec<f64>> {
        let tokens = self.preprocessor.preprocess(text);
        let features = self.vectorizer.transform_one(&tokens);
        debug!(nnz = features.nnz(), "Vectorized classical input");
        let raw = self.model.predict_proba(&features)?;
        Ok(self.columns.apply(&raw))
    }
}

impl ProbabilityEstimator for ClassicalEstimator {
    fn predict_proba(&self, texts: &[String]) -> Result<ProbabilityMatrix> {
        let rows = texts
            .iter()
            .map(|text| self.predict_one(text))
            .collect::<Result<Vec<_>>>()?;
        ProbabilityMatrix::new(rows, self.num_labels)
    }

    fn name(&self) -> &str {
        "classical"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VECTORIZER: &str =
        r#"{"vocabulary": {"water": 0, "mar": 1, "hoax": 2}, "idf": [1.0, 1.0, 1.0]}"#;

    /// Splits on "hoax": present -> mostly class 1, absent -> mostly class 0
    fn forest(classes: &str) -> ProbabilisticModel {
        ProbabilisticModel::from_json(&format!(
            r#"{{"kind": "random_forest", "n_features": 3, "classes": {classes},
                "trees": [{{"children_left": [1, -1, -1], "children_right": [2, -1, -1],
                            "feature": [2, -2, -2], "threshold": [0.0, -2.0, -2.0],
                            "value": [[5, 5], [9, 1], [2, 8]]}}]}}"#
        ))
        .unwrap()
    }

    fn estimator(classes: &str) -> ClassicalEstimator {
        let encoder = LabelEncoder::new(vec!["fake".into(), "real".into()]).unwrap();
        let canonical = encoder.classes().clone();
        ClassicalEstimator::new(
            ClassicalPreprocessor::default(),
            TfidfVectorizer::from_json(VECTORIZER).unwrap(),
            forest(classes),
            &encoder,
            &canonical,
        )
        .unwrap()
    }

    #[test]
    fn test_encoded_classes_keep_order() {
        let est = estimator(r#"{"encoding": "encoded", "classes": [0, 1]}"#);
        assert!(est.column_order().is_identity());
        let probs = est.predict_proba(&["Water on Mars".to_string()]).unwrap();
        assert_eq!(probs.row(0).unwrap(), &[0.9, 0.1]);
    }

    #[test]
    fn test_raw_classes_are_reordered() {
        let est = estimator(r#"{"encoding": "raw", "classes": ["real", "fake"]}"#);
        let probs = est
            .predict_proba(&["Water on Mars".to_string(), "total hoax".to_string()])
            .unwrap();
        // model column 0 is "real", so canonical [fake, real] swaps
        assert_eq!(probs.row(0).unwrap(), &[0.1, 0.9]);
        assert_eq!(probs.row(1).unwrap(), &[0.8, 0.2]);
    }

    #[test]
    fn test_rows_sum_to_one() {
        let est = estimator(r#"{"encoding": "encoded", "classes": [1, 0]}"#);
        let texts = vec![String::new(), "hoax hoax".to_string(), "the of".to_string()];
        let probs = est.predict_proba(&texts).unwrap();
        assert_eq!(probs.num_rows(), 3);
        for row in probs.rows() {
            assert_eq!(row.len(), 2);
            assert!((row.iter().sum::<f64>() - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_rejects_feature_mismatch() {
        let encoder = LabelEncoder::new(vec!["fake".into(), "real".into()]).unwrap();
        let vectorizer = TfidfVectorizer::from_json(r#"{"vocabulary": {"water": 0}}"#).unwrap();
        let err = ClassicalEstimator::new(
            ClassicalPreprocessor::default(),
            vectorizer,
            forest(r#"{"encoding": "encoded", "classes": [0, 1]}"#),
            &encoder,
            encoder.classes(),
        );
        assert!(matches!(err, Err(Error::Artifact(_))));
    }

    #[test]
    fn test_rejects_unknown_class() {
        let encoder = LabelEncoder::new(vec!["fake".into(), "real".into()]).unwrap();
        let err = ClassicalEstimator::new(
            ClassicalPreprocessor::default(),
            TfidfVectorizer::from_json(VECTORIZER).unwrap(),
            forest(r#"{"encoding": "raw", "classes": ["fake", "satire"]}"#),
            &encoder,
            encoder.classes(),
        );
        assert!(matches!(err, Err(Error::LabelOrder(_))));
    }
}
