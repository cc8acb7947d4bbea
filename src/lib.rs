//! docseek - semantic passage search over a single document
//!
//! Extracts a document's text, splits it into bounded passages, embeds each
//! passage and the query, and returns the passages closest to the query.
//!
//! # Architecture
//!
//! - **chunking**: greedy word-accumulating passage splitter
//! - **embedding**: `Embedder` trait, candle BERT engine, hashing embedder
//! - **ranking**: cosine similarity and deterministic top-k
//! - **pipeline**: state machine and orchestrator for one run

pub mod errors;
pub use errors::{EmbeddingOwner, PipelineError, Result};

pub mod chunking;
pub mod embedding;
pub mod extraction;
pub mod ranking;
pub mod pipeline;

// Binary surface
pub mod cli;
pub mod config;
pub mod display;
pub mod input;
pub mod telemetry;

pub use chunking::{chunk, Chunker, Passage};
pub use embedding::Embedder;
pub use pipeline::{Pipeline, PipelineConfig, PipelineState, SearchReport};
pub use ranking::{cosine_similarity, rank, Embedding, ScoredResult};
