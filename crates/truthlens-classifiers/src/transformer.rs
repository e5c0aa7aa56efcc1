//! DistilBERT sequence-classification estimator (Candle)
//!
//! A checkpoint directory holds:
//!
//! - `checkpoint.json`: `{"model_name", "num_labels", "max_len", "labels"?}`
//! - `model.safetensors`: fine-tuned weights (`distilbert.*`, optional
//!   `pre_classifier.*`, `classifier.*`)
//! - `config.json` and `tokenizer.json` (or `vocab.txt`)
//!
//! When the config or tokenizer is missing locally it is fetched from the
//! Hugging Face Hub under `model_name`. The weights are never downloaded.

use crate::classifier::ProbabilityEstimator;
use candle_core::{DType, Device, IndexOp, Tensor, D};
use candle_nn::{Linear, Module, VarBuilder};
use candle_transformers::models::distilbert::{Config as DistilBertConfig, DistilBertModel};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};
use tracing::{debug, info};
use truthlens_core::{Error, ProbabilityMatrix, Result};

/// Contents of `checkpoint.json`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TransformerCheckpoint {
    /// Base model identifier on the Hugging Face Hub
    pub model_name: String,

    /// Width of the classification head
    pub num_labels: usize,

    /// Fixed sequence length used for truncation and padding
    pub max_len: usize,

    /// Output column labels, when the exporter recorded them
    #[serde(default)]
    pub labels: Option<Vec<String>>,
}

impl TransformerCheckpoint {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::artifact(format!("Failed to read checkpoint {}: {}", path.display(), e))
        })?;
        let checkpoint: Self = serde_json::from_str(&content).map_err(|e| {
            Error::artifact(format!("Invalid checkpoint {}: {}", path.display(), e))
        })?;

        if checkpoint.num_labels == 0 || checkpoint.max_len < 2 {
            return Err(Error::artifact(format!(
                "checkpoint {} has num_labels={} max_len={}",
                path.display(),
                checkpoint.num_labels,
                checkpoint.max_len
            )));
        }
        Ok(checkpoint)
    }
}

/// Map a device name to a Candle device
pub fn get_device(device_str: &str) -> Result<Device> {
    match device_str.to_lowercase().as_str() {
        "cuda" | "cuda:0" => Device::new_cuda(0)
            .map_err(|e| Error::config(format!("Failed to initialize CUDA: {}", e))),
        "mps" | "metal" => Device::new_metal(0)
            .map_err(|e| Error::config(format!("Failed to initialize Metal: {}", e))),
        "cpu" => Ok(Device::Cpu),
        other => Err(Error::config(format!("Unknown device '{}'", other))),
    }
}

/// Fine-tuned DistilBERT with a sequence-classification head
pub struct TransformerEstimator {
    name: String,
    tokenizer: Tokenizer,
    model: DistilBertModel,
    pre_classifier: Option<Linear>,
    classifier: Linear,
    device: Device,
    checkpoint: TransformerCheckpoint,
}

impl TransformerEstimator {
    /// Load a checkpoint directory
    pub fn load(dir: impl AsRef<Path>, device: &Device) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(Error::artifact(format!(
                "transformer checkpoint directory not found: {}",
                dir.display()
            )));
        }

        let checkpoint = TransformerCheckpoint::from_file(dir.join("checkpoint.json"))?;
        info!(
            model = %checkpoint.model_name,
            num_labels = checkpoint.num_labels,
            max_len = checkpoint.max_len,
            "Loading transformer checkpoint from {}",
            dir.display()
        );

        let config_path = resolve_file(dir, &checkpoint.model_name, "config.json")?;
        let config_json = std::fs::read_to_string(&config_path).map_err(|e| {
            Error::artifact(format!("Failed to read {}: {}", config_path.display(), e))
        })?;

        let tokenizer = load_tokenizer(dir, &checkpoint.model_name)?;
        let vb = load_var_builder(dir, device)?;

        Self::from_parts(checkpoint, &config_json, tokenizer, vb, device)
    }

    /// Assemble from already-loaded parts
    pub fn from_parts(
        checkpoint: TransformerCheckpoint,
        config_json: &str,
        mut tokenizer: Tokenizer,
        vb: VarBuilder,
        device: &Device,
    ) -> Result<Self> {
        let config_value: serde_json::Value = serde_json::from_str(config_json)
            .map_err(|e| Error::artifact(format!("Failed to parse config JSON: {}", e)))?;

        let hidden_size = config_value
            .get("dim")
            .and_then(|v| v.as_u64())
            .ok_or_else(|| Error::artifact("config.json has no DistilBERT 'dim'"))?
            as usize;
        let config_pad_id = config_value
            .get("pad_token_id")
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as u32;

        let config: DistilBertConfig = serde_json::from_value(config_value)
            .map_err(|e| Error::artifact(format!("Failed to parse DistilBERT config: {}", e)))?;

        let model = DistilBertModel::load(vb.pp("distilbert"), &config)
            .map_err(|e| Error::artifact(format!("Failed to load DistilBERT model: {}", e)))?;

        // Some exports drop the pre-classifier; a present but unloadable one is fatal
        let pre_classifier = if vb.contains_tensor("pre_classifier.weight") {
            let layer = candle_nn::linear(hidden_size, hidden_size, vb.pp("pre_classifier"))
                .map_err(|e| {
                    Error::artifact(format!(
                        "Failed to load pre_classifier ({} -> {}): {}",
                        hidden_size, hidden_size, e
                    ))
                })?;
            debug!(hidden_size, "Loaded pre_classifier layer");
            Some(layer)
        } else {
            debug!("No pre_classifier in checkpoint, using the CLS embedding directly");
            None
        };

        let classifier =
            candle_nn::linear(hidden_size, checkpoint.num_labels, vb.pp("classifier")).map_err(
                |e| {
                    Error::artifact(format!(
                        "Failed to load classification head ({} -> {}): {}",
                        hidden_size, checkpoint.num_labels, e
                    ))
                },
            )?;

        let pad_token = "[PAD]".to_string();
        let pad_id = tokenizer.token_to_id(&pad_token).unwrap_or(config_pad_id);
        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::Fixed(checkpoint.max_len),
            pad_id,
            pad_token,
            ..Default::default()
        }));
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: checkpoint.max_len,
                ..Default::default()
            }))
            .map_err(|e| Error::artifact(format!("Failed to configure truncation: {}", e)))?;

        info!(
            model = %checkpoint.model_name,
            hidden_size,
            num_labels = checkpoint.num_labels,
            "Loaded DistilBERT classifier"
        );

        Ok(Self {
            name: format!("transformer:{}", checkpoint.model_name),
            tokenizer,
            model,
            pre_classifier,
            classifier,
            device: device.clone(),
            checkpoint,
        })
    }

    pub fn checkpoint(&self) -> &TransformerCheckpoint {
        &self.checkpoint
    }

    pub fn num_labels(&self) -> usize {
        self.checkpoint.num_labels
    }

    fn logits(&self, texts: &[String]) -> Result<Tensor> {
        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| Error::classifier(format!("Tokenization failed: {}", e)))?;

        let batch = encodings.len();
        let seq_len = self.checkpoint.max_len;
        let mut ids: Vec<i64> = Vec::with_capacity(batch * seq_len);
        let mut mask: Vec<u8> = Vec::with_capacity(batch * seq_len);
        for encoding in &encodings {
            if encoding.len() != seq_len {
                return Err(Error::classifier(format!(
                    "encoded length {} differs from max_len {}",
                    encoding.len(),
                    seq_len
                )));
            }
            ids.extend(encoding.get_ids().iter().map(|&id| id as i64));
            // DistilBERT masks positions where the mask tensor is 1
            mask.extend(
                encoding
                    .get_attention_mask()
                    .iter()
                    .map(|&m| if m == 0 { 1u8 } else { 0u8 }),
            );
        }

        let input_ids = Tensor::from_vec(ids, (batch, seq_len), &self.device)
            .map_err(|e| Error::classifier(format!("Failed to create input tensor: {}", e)))?;
        let attention_mask = Tensor::from_vec(mask, (batch, 1, 1, seq_len), &self.device)
            .map_err(|e| Error::classifier(format!("Failed to create attention mask: {}", e)))?;

        let hidden_states = self
            .model
            .forward(&input_ids, &attention_mask)
            .map_err(|e| Error::classifier(format!("Model forward pass failed: {}", e)))?;

        let cls_embedding = hidden_states
            .i((.., 0))
            .map_err(|e| Error::classifier(format!("Failed to get CLS token: {}", e)))?;

        let pooled_output = match &self.pre_classifier {
            Some(pre_classifier) => pre_classifier
                .forward(&cls_embedding)
                .and_then(|t| t.relu())
                .map_err(|e| Error::classifier(format!("Pre-classifier failed: {}", e)))?,
            None => cls_embedding,
        };

        self.classifier
            .forward(&pooled_output)
            .map_err(|e| Error::classifier(format!("Classification head failed: {}", e)))
    }
}

impl ProbabilityEstimator for TransformerEstimator {
    fn predict_proba(&self, texts: &[String]) -> Result<ProbabilityMatrix> {
        let num_labels = self.num_labels();
        if texts.is_empty() {
            return ProbabilityMatrix::new(Vec::new(), num_labels);
        }

        let logits = self.logits(texts)?;
        let rows: Vec<Vec<f32>> = candle_nn::ops::softmax(&logits, D::Minus1)
            .and_then(|p| p.to_dtype(DType::F32))
            .and_then(|p| p.to_vec2())
            .map_err(|e| Error::classifier(format!("Softmax failed: {}", e)))?;

        debug!(batch = texts.len(), "Transformer probabilities computed");

        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(f64::from).collect())
            .collect();
        ProbabilityMatrix::new(rows, num_labels)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Local file when present, otherwise the Hub copy of `model_name`
fn resolve_file(dir: &Path, model_name: &str, file: &str) -> Result<PathBuf> {
    let local = dir.join(file);
    if local.exists() {
        return Ok(local);
    }

    info!("{} not in checkpoint, fetching from Hugging Face Hub: {}", file, model_name);
    let api = hf_hub::api::sync::Api::new()
        .map_err(|e| Error::artifact(format!("Failed to initialize HuggingFace API: {}", e)))?;
    api.repo(hf_hub::Repo::model(model_name.to_string()))
        .get(file)
        .map_err(|e| Error::artifact(format!("Failed to download {} for {}: {}", file, model_name, e)))
}

fn load_tokenizer(dir: &Path, model_name: &str) -> Result<Tokenizer> {
    let vocab_path = dir.join("vocab.txt");
    if !dir.join("tokenizer.json").exists() && vocab_path.exists() {
        debug!("Building tokenizer from vocab.txt");
        return wordpiece_tokenizer(&vocab_path);
    }

    let path = resolve_file(dir, model_name, "tokenizer.json")?;
    Tokenizer::from_file(&path)
        .map_err(|e| Error::artifact(format!("Failed to load {}: {}", path.display(), e)))
}

/// BERT-style WordPiece tokenizer over a `vocab.txt`
pub fn wordpiece_tokenizer(vocab_path: &Path) -> Result<Tokenizer> {
    use tokenizers::models::wordpiece::WordPiece;
    use tokenizers::normalizers::BertNormalizer;
    use tokenizers::pre_tokenizers::bert::BertPreTokenizer;
    use tokenizers::processors::bert::BertProcessing;
    use tokenizers::Model;

    let wordpiece = WordPiece::from_file(vocab_path.to_string_lossy().as_ref())
        .unk_token("[UNK]".to_string())
        .build()
        .map_err(|e| Error::artifact(format!("Failed to build WordPiece model: {}", e)))?;

    let special = |token: &str| {
        wordpiece
            .token_to_id(token)
            .ok_or_else(|| Error::artifact(format!("vocab.txt has no {} token", token)))
    };
    let sep = ("[SEP]".to_string(), special("[SEP]")?);
    let cls = ("[CLS]".to_string(), special("[CLS]")?);

    let mut tokenizer = Tokenizer::new(wordpiece);
    tokenizer.with_normalizer(Some(BertNormalizer::default()));
    tokenizer.with_pre_tokenizer(Some(BertPreTokenizer));
    tokenizer.with_post_processor(Some(BertProcessing::new(sep, cls)));

    Ok(tokenizer)
}

fn load_var_builder(dir: &Path, device: &Device) -> Result<VarBuilder<'static>> {
    let weights_path = dir.join("model.safetensors");
    if !weights_path.exists() {
        return Err(Error::artifact(format!(
            "model.safetensors not found in {}",
            dir.display()
        )));
    }

    // SAFETY: the weights file is not modified while mapped.
    let vb = unsafe {
        VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, device)
            .map_err(|e| Error::artifact(format!("Failed to load weights: {}", e)))?
    };
    Ok(vb)
}
