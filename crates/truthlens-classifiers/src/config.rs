//! Ensemble configuration (YAML)

use crate::preprocess::PreprocessOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;
use truthlens_core::{Error, LabelSet, Result};

/// Default config file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "truthlens.yaml";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnsembleConfig {
    /// Explicit canonical label order; the label encoder must agree
    #[serde(default)]
    pub labels: Option<LabelSet>,

    #[serde(default)]
    pub artifacts: ArtifactPaths,

    #[serde(default)]
    pub preprocessing: PreprocessOptions,

    #[serde(default)]
    pub inference: InferenceConfig,
}

/// Locations of the pretrained artifacts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactPaths {
    /// Base directory for relative artifact paths
    #[serde(default = "default_models_dir")]
    pub models_dir: PathBuf,

    #[serde(default = "default_label_encoder")]
    pub label_encoder: PathBuf,

    #[serde(default = "default_vectorizer")]
    pub vectorizer: PathBuf,

    #[serde(default = "default_classical_model")]
    pub classical_model: PathBuf,

    /// Transformer checkpoint directory
    #[serde(default = "default_transformer")]
    pub transformer: PathBuf,

    #[serde(default = "default_meta_classifier")]
    pub meta_classifier: PathBuf,
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self {
            models_dir: default_models_dir(),
            label_encoder: default_label_encoder(),
            vectorizer: default_vectorizer(),
            classical_model: default_classical_model(),
            transformer: default_transformer(),
            meta_classifier: default_meta_classifier(),
        }
    }
}

impl ArtifactPaths {
    /// Artifacts rooted at `models_dir` with the default file names
    pub fn in_dir(models_dir: impl Into<PathBuf>) -> Self {
        Self {
            models_dir: models_dir.into(),
            ..Self::default()
        }
    }

    /// Resolve a configured path against `models_dir`
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.models_dir.join(path)
        }
    }

    pub fn label_encoder_path(&self) -> PathBuf {
        self.resolve(&self.label_encoder)
    }

    pub fn vectorizer_path(&self) -> PathBuf {
        self.resolve(&self.vectorizer)
    }

    pub fn classical_model_path(&self) -> PathBuf {
        self.resolve(&self.classical_model)
    }

    pub fn transformer_dir(&self) -> PathBuf {
        self.resolve(&self.transformer)
    }

    pub fn meta_classifier_path(&self) -> PathBuf {
        self.resolve(&self.meta_classifier)
    }
}

/// Inference settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Device to run on (cpu, cuda, metal)
    #[serde(default = "default_device")]
    pub device: String,

    /// Confidence at or above which a prediction is "high confidence"
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,

    /// Attach per-model votes to every result
    #[serde(default)]
    pub include_breakdown: bool,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
            confidence_threshold: default_confidence_threshold(),
            include_breakdown: false,
        }
    }
}

fn default_models_dir() -> PathBuf {
    PathBuf::from("./models")
}

fn default_label_encoder() -> PathBuf {
    PathBuf::from("label_encoder.json")
}

fn default_vectorizer() -> PathBuf {
    PathBuf::from("vectorizer.json")
}

fn default_classical_model() -> PathBuf {
    PathBuf::from("classical_model.json")
}

fn default_transformer() -> PathBuf {
    PathBuf::from("transformer")
}

fn default_meta_classifier() -> PathBuf {
    PathBuf::from("meta_classifier.json")
}

fn default_device() -> String {
    "cpu".to_string()
}

fn default_confidence_threshold() -> f64 {
    0.6
}

impl EnsembleConfig {
    /// Parse and validate YAML
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("Invalid configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&content)
    }

    /// Load an explicit config file, or search the default locations.
    ///
    /// An explicit path must exist. Without one, `./truthlens.yaml` and then
    /// `<config dir>/truthlens/truthlens.yaml` are tried, falling back to
    /// defaults when neither exists.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }

        match Self::default_locations().into_iter().find(|p| p.exists()) {
            Some(found) => {
                info!("Loading configuration from {}", found.display());
                Self::from_file(found)
            }
            None => {
                info!("No configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    fn default_locations() -> Vec<PathBuf> {
        let mut locations = vec![PathBuf::from(DEFAULT_CONFIG_FILE)];
        if let Some(dir) = dirs::config_dir() {
            locations.push(dir.join("truthlens").join(DEFAULT_CONFIG_FILE));
        }
        locations
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        let threshold = self.inference.confidence_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(Error::config(format!(
                "confidence_threshold must be within [0, 1], got {}",
                threshold
            )));
        }

        if self.inference.device.trim().is_empty() {
            return Err(Error::config("inference.device must not be empty"));
        }

        Ok(())
    }
}
