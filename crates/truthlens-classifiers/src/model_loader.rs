//! One-time artifact loading into an immutable inference context
//!
//! Every artifact is loaded and cross-checked against the canonical label
//! order before any request is served. Any failure here is fatal: the
//! context is never partially built.

use crate::classical::ClassicalEstimator;
use crate::classifier::ProbabilityEstimator;
use crate::config::EnsembleConfig;
use crate::labels::{canonical_labels, check_transformer_labels, LabelEncoder};
use crate::meta::MetaFusion;
use crate::models::ProbabilisticModel;
use crate::preprocess::ClassicalPreprocessor;
use crate::transformer::{get_device, TransformerEstimator};
use crate::vectorizer::TfidfVectorizer;
use serde::Serialize;
use std::time::Instant;
use tracing::info;
use truthlens_core::{Error, LabelSet, Result};

/// Short description of the loaded artifacts
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextSummary {
    pub labels: Vec<String>,
    pub classical: String,
    pub transformer: String,
    pub meta_classifier: String,
}

/// Read-only handle over every pretrained artifact
pub struct InferenceContext {
    labels: LabelSet,
    classical: Box<dyn ProbabilityEstimator>,
    transformer: Box<dyn ProbabilityEstimator>,
    meta: MetaFusion,
    summary: ContextSummary,
}

impl InferenceContext {
    /// Load all five artifacts named by `config`
    pub fn load(config: &EnsembleConfig) -> Result<Self> {
        let start = Instant::now();
        let paths = &config.artifacts;
        info!("Loading artifacts from {}", paths.models_dir.display());

        let encoder = LabelEncoder::from_file(paths.label_encoder_path())?;
        let labels = canonical_labels(config.labels.as_ref(), &encoder)?;
        info!(labels = %labels, "Canonical label order established");

        let vectorizer = TfidfVectorizer::from_file(paths.vectorizer_path())?;
        let classical_model = ProbabilisticModel::from_file(paths.classical_model_path())?;
        let classical_desc = format!(
            "{} over {} tf-idf features",
            classical_model.kind(),
            vectorizer.num_features()
        );
        let classical = ClassicalEstimator::new(
            ClassicalPreprocessor::new(config.preprocessing),
            vectorizer,
            classical_model,
            &encoder,
            &labels,
        )?;

        let device = get_device(&config.inference.device)?;
        let transformer = TransformerEstimator::load(paths.transformer_dir(), &device)?;
        let checkpoint = transformer.checkpoint();
        check_transformer_labels(&labels, checkpoint.num_labels, checkpoint.labels.as_deref())?;
        let transformer_desc = format!(
            "distilbert {} (max_len {})",
            checkpoint.model_name, checkpoint.max_len
        );

        let meta_model = ProbabilisticModel::from_file(paths.meta_classifier_path())?;
        let meta_desc = format!("{} over {} features", meta_model.kind(), meta_model.n_features());
        let meta = MetaFusion::new(meta_model, &encoder, &labels)?;

        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            "All artifacts loaded"
        );

        let summary = ContextSummary {
            labels: labels.as_slice().to_vec(),
            classical: classical_desc,
            transformer: transformer_desc,
            meta_classifier: meta_desc,
        };

        Ok(Self {
            labels,
            classical: Box::new(classical),
            transformer: Box::new(transformer),
            meta,
            summary,
        })
    }

    /// Assemble a context from already-built parts
    pub fn from_parts(
        labels: LabelSet,
        classical: Box<dyn ProbabilityEstimator>,
        transformer: Box<dyn ProbabilityEstimator>,
        meta: MetaFusion,
    ) -> Self {
        let summary = ContextSummary {
            labels: labels.as_slice().to_vec(),
            classical: classical.name().to_string(),
            transformer: transformer.name().to_string(),
            meta_classifier: "meta".to_string(),
        };
        Self {
            labels,
            classical,
            transformer,
            meta,
            summary,
        }
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    pub fn classical(&self) -> &dyn ProbabilityEstimator {
        self.classical.as_ref()
    }

    pub fn transformer(&self) -> &dyn ProbabilityEstimator {
        self.transformer.as_ref()
    }

    pub fn meta(&self) -> &MetaFusion {
        &self.meta
    }

    pub fn summary(&self) -> &ContextSummary {
        &self.summary
    }

    /// Probabilities of one cleaned text from one estimator
    pub(crate) fn single_row(
        &self,
        estimator: &dyn ProbabilityEstimator,
        text: &str,
    ) -> Result<Vec<f64>> {
        let probs = estimator.predict_proba(&[text.to_string()])?;
        if probs.num_rows() != 1 || probs.num_labels() != self.labels.len() {
            return Err(Error::classifier(format!(
                "{} returned a {}x{} probability matrix for one text",
                estimator.name(),
                probs.num_rows(),
                probs.num_labels()
            )));
        }
        Ok(probs.into_rows().remove(0))
    }
}
