//! Error types for docseek
//!
//! Every pipeline error is fatal for the run that raised it. Variants carry
//! enough context to name the failing stage and, where one exists, the
//! passage or query that caused it.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Identifies whose text an embedding belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmbeddingOwner {
    /// Passage at the given index
    Passage(usize),

    /// The user query
    Query,
}

impl fmt::Display for EmbeddingOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmbeddingOwner::Passage(index) => write!(f, "passage {}", index),
            EmbeddingOwner::Query => write!(f, "query"),
        }
    }
}

/// Main error type for the retrieval pipeline
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Document could not be read or parsed
    #[error("Failed to extract text from {path}: {reason}")]
    ExtractionFailure { path: PathBuf, reason: String },

    /// Embedding backend could not be loaded
    #[error("Failed to load embedding model '{model}': {reason}")]
    ModelLoadFailure { model: String, reason: String },

    /// A single text could not be embedded
    #[error("Failed to embed {owner}: {reason}")]
    EmbeddingFailure { owner: EmbeddingOwner, reason: String },

    /// Internal invariant violated between stages
    #[error("Internal consistency fault: {0}")]
    ConsistencyFault(String),

    /// State machine transition errors
    #[error("Invalid state transition from {from} to {to}: {reason}")]
    InvalidTransition {
        from: String,
        to: String,
        reason: String,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Query input errors
    #[error("Input error: {0}")]
    InputError(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl PipelineError {
    /// Process exit code for this error kind
    pub fn exit_code(&self) -> u8 {
        match self {
            PipelineError::ConfigError(_) | PipelineError::InputError(_) => 2,
            PipelineError::ExtractionFailure { .. } | PipelineError::IoError(_) => 3,
            PipelineError::ModelLoadFailure { .. } => 4,
            PipelineError::EmbeddingFailure { .. } => 5,
            PipelineError::ConsistencyFault(_) | PipelineError::InvalidTransition { .. } => 70,
        }
    }

    /// True for faults raised by the pipeline itself rather than by a collaborator
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            PipelineError::ConsistencyFault(_) | PipelineError::InvalidTransition { .. }
        )
    }
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;
