//! Probability estimator trait

use truthlens_core::{ProbabilityMatrix, Result};

/// A base model producing class probabilities in canonical label order
pub trait ProbabilityEstimator: Send + Sync {
    /// Probability rows for a batch of cleaned texts, one row per text
    fn predict_proba(&self, texts: &[String]) -> Result<ProbabilityMatrix>;

    /// Get the estimator name
    fn name(&self) -> &str;
}

impl<T: ProbabilityEstimator + ?Sized> ProbabilityEstimator for Box<T> {
    fn predict_proba(&self, texts: &[String]) -> Result<ProbabilityMatrix> {
        (**self).predict_proba(texts)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
