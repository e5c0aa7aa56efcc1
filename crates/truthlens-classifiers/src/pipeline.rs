//! Ensemble orchestrator
//!
//! normalize -> classical probabilities -> transformer probabilities ->
//! meta-fusion -> confidence note. Processing is synchronous; a request
//! either returns a full result or the first error raised along the way.

use crate::config::EnsembleConfig;
use crate::model_loader::InferenceContext;
use crate::normalize::clean_text;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;
use truthlens_core::{
    argmax, round4, Error, LabelSet, ModelBreakdown, ModelVote, PredictionMode,
    PredictionResult, Result,
};

/// Note attached at or above the confidence threshold
pub const HIGH_CONFIDENCE_NOTE: &str = "High confidence prediction";

/// Note attached below the confidence threshold
pub const LOW_CONFIDENCE_NOTE: &str =
    "Low confidence prediction. Input may belong to a different domain or be ambiguous.";

pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.6;

/// Confidence note for a reported confidence (threshold inclusive)
pub fn confidence_note(confidence: f64, threshold: f64) -> &'static str {
    if confidence >= threshold {
        HIGH_CONFIDENCE_NOTE
    } else {
        LOW_CONFIDENCE_NOTE
    }
}

/// Fake/real news classifier over a loaded [`InferenceContext`]
#[derive(Clone)]
pub struct EnsemblePipeline {
    context: Arc<InferenceContext>,
    confidence_threshold: f64,
    include_breakdown: bool,
}

impl EnsemblePipeline {
    pub fn new(context: InferenceContext) -> Self {
        Self::from_shared(Arc::new(context))
    }

    /// Share one context between several pipelines
    pub fn from_shared(context: Arc<InferenceContext>) -> Self {
        Self {
            context,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            include_breakdown: false,
        }
    }

    /// Load every artifact named by `config` and apply its inference settings
    pub fn from_config(config: &EnsembleConfig) -> Result<Self> {
        config.validate()?;
        let context = InferenceContext::load(config)?;
        Self::new(context)
            .with_confidence_threshold(config.inference.confidence_threshold)
            .map(|p| p.with_breakdown(config.inference.include_breakdown))
    }

    pub fn with_confidence_threshold(mut self, threshold: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(Error::config(format!(
                "confidence threshold must be within [0, 1], got {}",
                threshold
            )));
        }
        self.confidence_threshold = threshold;
        Ok(self)
    }

    pub fn with_breakdown(mut self, include: bool) -> Self {
        self.include_breakdown = include;
        self
    }

    pub fn context(&self) -> &InferenceContext {
        &self.context
    }

    pub fn labels(&self) -> &LabelSet {
        self.context.labels()
    }

    pub fn confidence_threshold(&self) -> f64 {
        self.confidence_threshold
    }

    /// Classify one raw text with the ensemble
    pub fn predict_news(&self, text: &str) -> Result<PredictionResult> {
        self.predict_with_mode(text, PredictionMode::Ensemble)
    }

    /// Classify possibly-absent input; `None` is treated as the empty string
    pub fn predict_optional(&self, text: Option<&str>) -> Result<PredictionResult> {
        self.predict_news(text.unwrap_or_default())
    }

    /// Classify one raw text, letting `mode` pick the deciding model
    pub fn predict_with_mode(&self, text: &str, mode: PredictionMode) -> Result<PredictionResult> {
        let start = Instant::now();
        let cleaned = clean_text(text);
        debug!(chars = cleaned.len(), mode = %mode, "Normalized input");

        let need_classical = self.include_breakdown || mode != PredictionMode::Transformer;
        let need_transformer = self.include_breakdown || mode != PredictionMode::Classical;

        let classical = if need_classical {
            Some(self.context.single_row(self.context.classical(), &cleaned)?)
        } else {
            None
        };
        let transformer = if need_transformer {
            Some(self.context.single_row(self.context.transformer(), &cleaned)?)
        } else {
            None
        };

        let (label, raw_confidence) = match (mode, &classical, &transformer) {
            (PredictionMode::Ensemble, Some(c), Some(t)) => {
                let decision = self.context.meta().fuse(c, t)?;
                (decision.label, decision.confidence)
            }
            (PredictionMode::Classical, Some(c), _) => {
                let vote = self.vote(c)?;
                (vote.label, vote.confidence)
            }
            (PredictionMode::Transformer, _, Some(t)) => {
                let vote = self.vote(t)?;
                (vote.label, vote.confidence)
            }
            _ => return Err(Error::internal("base model probabilities missing")),
        };

        let breakdown = match (self.include_breakdown, classical, transformer) {
            (true, Some(c), Some(t)) => Some(ModelBreakdown {
                classical: self.vote(&c)?,
                transformer: self.vote(&t)?,
            }),
            _ => None,
        };

        let confidence = round4(raw_confidence);
        let note = confidence_note(confidence, self.confidence_threshold);

        let elapsed_us = start.elapsed().as_micros() as u64;
        metrics::counter!(
            "truthlens_predictions_total",
            "label" => label.clone(),
            "mode" => mode.as_str()
        )
        .increment(1);
        metrics::histogram!("truthlens_prediction_latency_us").record(elapsed_us as f64);

        debug!(
            label = %label,
            confidence,
            latency_us = elapsed_us,
            "Prediction complete"
        );

        Ok(PredictionResult {
            final_prediction: label,
            confidence,
            confidence_note: note.to_string(),
            mode,
            breakdown,
        })
    }

    fn vote(&self, probabilities: &[f64]) -> Result<ModelVote> {
        let (idx, confidence) = argmax(probabilities)
            .ok_or_else(|| Error::classifier("empty probability vector"))?;
        let label = self
            .labels()
            .get(idx)
            .ok_or_else(|| Error::internal(format!("class index {} out of range", idx)))?;
        Ok(ModelVote {
            label: label.to_string(),
            confidence: round4(confidence),
            probabilities: probabilities.to_vec(),
        })
    }
}
