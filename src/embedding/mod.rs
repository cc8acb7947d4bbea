//! Embedding adapters
//!
//! The pipeline only sees the [`Embedder`] trait. Two implementations ship
//! with the crate:
//! - [`EmbeddingEngine`]: a BERT or DistilBERT sentence encoder run locally with candle
//! - [`HashEmbedder`]: deterministic feature hashing, used offline and in tests

pub mod engine;
pub mod hashing;

pub use engine::{EmbeddingEngine, EngineConfig, ModelFamily, ModelShape};
pub use hashing::HashEmbedder;

use serde::{Deserialize, Serialize};

/// Turns a text into one fixed-length vector
///
/// Implementations must be deterministic for a given loaded instance and
/// must return vectors of length [`Embedder::dimension`] on every call.
pub trait Embedder: Send + Sync {
    /// Length of every vector this embedder produces
    fn dimension(&self) -> usize;

    /// Embed a single text
    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>>;

    /// Short human-readable name for logs
    fn name(&self) -> &str;
}

impl<E: Embedder + ?Sized> Embedder for Box<E> {
    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        (**self).embed(text)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// How token states are reduced to a single vector
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Pooling {
    /// Attention-mask weighted mean over all tokens
    #[default]
    Mean,
    /// Hidden state of the first ([CLS]) token
    Cls,
}

/// Which embedder backs a run
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum EmbedderKind {
    /// Transformer model from the Hugging Face Hub
    #[default]
    Model,
    /// Offline feature-hashing embedder
    Hash,
}

impl Pooling {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pooling::Mean => "mean",
            Pooling::Cls => "cls",
        }
    }
}
