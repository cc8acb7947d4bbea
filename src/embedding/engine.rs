// Embedding engine - local sentence embeddings via candle
use anyhow::{Context, Result};
use candle_core::{DType, Device, IndexOp, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{self, BertModel};
use candle_transformers::models::distilbert::{self, DistilBertModel};
use hf_hub::{api::sync::Api, Repo, RepoType};
use tokenizers::{Tokenizer, TruncationParams};
use tracing::{debug, info};

use super::{Embedder, Pooling};

/// Default sentence encoder
pub const DEFAULT_MODEL_ID: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Default Hub revision
pub const DEFAULT_REVISION: &str = "main";

/// BERT position limit; longer inputs are truncated
const MAX_TOKENS: usize = 512;

/// Where to fetch the model from and how to pool it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub model_id: String,
    pub revision: String,
    pub pooling: Pooling,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model_id: DEFAULT_MODEL_ID.to_string(),
            revision: DEFAULT_REVISION.to_string(),
            pooling: Pooling::default(),
        }
    }
}

/// Encoder architecture named by `model_type` in config.json
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFamily {
    Bert,
    DistilBert,
}

/// What config.json says about the encoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelShape {
    pub family: ModelFamily,
    /// Width of the hidden states, and so of every pooled vector
    pub dimension: usize,
}

impl ModelShape {
    /// Read the family and hidden width from config.json contents
    ///
    /// A missing `model_type` is treated as BERT. Families other than BERT
    /// and DistilBERT are rejected.
    pub fn parse(config_contents: &str) -> Result<Self> {
        let raw: serde_json::Value =
            serde_json::from_str(config_contents).context("Failed to parse model config")?;

        let family = match raw.get("model_type").and_then(|v| v.as_str()) {
            None | Some("bert") => ModelFamily::Bert,
            Some("distilbert") => ModelFamily::DistilBert,
            Some(other) => anyhow::bail!(
                "Unsupported model_type '{}' (supported: bert, distilbert)",
                other
            ),
        };

        let key = match family {
            ModelFamily::Bert => "hidden_size",
            ModelFamily::DistilBert => "dim",
        };
        let dimension = raw
            .get(key)
            .and_then(|v| v.as_u64())
            .map(|v| v as usize)
            .with_context(|| format!("Model config has no {}", key))?;

        Ok(Self { family, dimension })
    }
}

/// Loaded transformer, one variant per supported family
enum Encoder {
    Bert(BertModel),
    DistilBert(DistilBertModel),
}

impl Encoder {
    fn load(shape: ModelShape, config_contents: &str, vb: VarBuilder) -> Result<Self> {
        match shape.family {
            ModelFamily::Bert => {
                let config: bert::Config = serde_json::from_str(config_contents)
                    .context("Failed to parse BERT config")?;
                let model = BertModel::load(vb, &config).context("Failed to create BERT model")?;
                Ok(Encoder::Bert(model))
            }
            ModelFamily::DistilBert => {
                let config: distilbert::Config = serde_json::from_str(config_contents)
                    .context("Failed to parse DistilBERT config")?;
                let model = DistilBertModel::load(vb, &config)
                    .context("Failed to create DistilBERT model")?;
                Ok(Encoder::DistilBert(model))
            }
        }
    }

    /// Hidden states, shaped (1, seq_len, hidden)
    fn forward(&self, token_ids: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        match self {
            Encoder::Bert(model) => {
                let token_type_ids = token_ids.zeros_like()?;
                Ok(model.forward(token_ids, &token_type_ids, Some(attention_mask))?)
            }
            Encoder::DistilBert(model) => {
                // Nonzero entries are masked out; one unpadded sequence masks nothing
                let seq_len = token_ids.dim(1)?;
                let mask = Tensor::zeros((seq_len, seq_len), DType::U8, token_ids.device())?;
                Ok(model.forward(token_ids, &mask)?)
            }
        }
    }
}

/// BERT-family sentence encoder running on CPU
pub struct EmbeddingEngine {
    encoder: Encoder,
    tokenizer: Tokenizer,
    device: Device,
    pooling: Pooling,
    dimension: usize,
    model_id: String,
}

impl EmbeddingEngine {
    /// Download (or reuse the Hub cache) and load model, tokenizer and weights
    pub fn load(config: &EngineConfig) -> Result<Self> {
        let device = Device::Cpu;

        let api = Api::new().context("Failed to create HuggingFace API client")?;
        let repo = api.repo(Repo::with_revision(
            config.model_id.clone(),
            RepoType::Model,
            config.revision.clone(),
        ));

        info!(model = %config.model_id, revision = %config.revision, "fetching model files");
        let config_path = repo
            .get("config.json")
            .context("Failed to download model config")?;
        let config_contents =
            std::fs::read_to_string(config_path).context("Failed to read config file")?;
        // Reject unsupported families before fetching the weights
        let shape = ModelShape::parse(&config_contents)?;

        let tokenizer_path = repo
            .get("tokenizer.json")
            .context("Failed to download tokenizer")?;
        let weights_path = repo
            .get("model.safetensors")
            .context("Failed to download model weights")?;

        let mut tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;
        tokenizer
            .with_padding(None)
            .with_truncation(Some(TruncationParams {
                max_length: MAX_TOKENS,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("Failed to configure truncation: {}", e))?;

        // SAFETY: the safetensors file is owned by the Hub cache and not
        // modified while mapped.
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, &device)
                .context("Failed to load model weights")?
        };
        let encoder = Encoder::load(shape, &config_contents, vb)?;

        info!(
            family = ?shape.family,
            dimension = shape.dimension,
            pooling = config.pooling.as_str(),
            "embedding model ready"
        );

        Ok(Self {
            encoder,
            tokenizer,
            device,
            pooling: config.pooling,
            dimension: shape.dimension,
            model_id: config.model_id.clone(),
        })
    }

    /// Mean pooling with attention mask
    fn mean_pool(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let mask_expanded = attention_mask
            .unsqueeze(2)?
            .expand(hidden.shape())?
            .to_dtype(hidden.dtype())?;

        let summed = (hidden * &mask_expanded)?.sum(1)?;
        let counts = mask_expanded.sum(1)?.clamp(1e-9, f64::MAX)?;

        Ok(summed.broadcast_div(&counts)?)
    }

    pub fn pooling(&self) -> Pooling {
        self.pooling
    }
}

impl Embedder for EmbeddingEngine {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))?;

        let ids = encoding.get_ids();
        if ids.is_empty() {
            anyhow::bail!("Tokenizer produced no tokens");
        }
        debug!(tokens = ids.len(), "encoded text");

        let token_ids = Tensor::new(ids, &self.device)?.unsqueeze(0)?;
        let attention_mask = Tensor::new(encoding.get_attention_mask(), &self.device)?.unsqueeze(0)?;

        let hidden = self.encoder.forward(&token_ids, &attention_mask)?;

        let pooled = match self.pooling {
            Pooling::Mean => Self::mean_pool(&hidden, &attention_mask)?,
            Pooling::Cls => hidden.i((.., 0))?,
        };

        let vector = pooled.squeeze(0)?.to_vec1::<f32>()?;
        if vector.len() != self.dimension {
            anyhow::bail!(
                "Model returned {} values, expected {}",
                vector.len(),
                self.dimension
            );
        }
        Ok(vector)
    }

    fn name(&self) -> &str {
        &self.model_id
    }
}
