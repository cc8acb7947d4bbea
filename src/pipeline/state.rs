//! Pipeline state machine
//!
//! A strictly linear sequence of stages with a single failure terminal:
//!
//! Idle → Loading → Extracting → Chunking → Embedding → Ranking → Presenting → Done
//!
//! `Failed` is reachable from every non-Idle, non-terminal state. Nothing is
//! retried and nothing moves backwards.

use crate::errors::{PipelineError, Result};
use serde::{Deserialize, Serialize};

/// Pipeline execution states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PipelineState {
    /// Nothing started yet
    Idle,

    /// Embedding backend is being loaded
    Loading,

    /// Document text is being extracted
    Extracting,

    /// Text is being split into passages
    Chunking,

    /// Passages and query are being embedded
    Embedding,

    /// Passages are being scored against the query
    Ranking,

    /// Results are being handed to the presenter
    Presenting,

    /// Run completed successfully (terminal)
    Done,

    /// Run aborted (terminal)
    Failed,
}

/// Events that trigger state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateEvent {
    /// Run requested
    Start,

    /// Embedder ready
    ModelLoaded,

    /// Document text available
    TextExtracted,

    /// Passage sequence produced
    PassagesReady,

    /// Every passage and the query embedded
    EmbeddingsComplete,

    /// Top-k selected
    RankingComplete,

    /// Results rendered
    Presented,

    /// Current stage failed
    StageFailed,
}

impl PipelineState {
    /// Check if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed)
    }

    /// Attempt state transition with validation
    ///
    /// Valid transitions:
    /// 1. Idle       → Loading     (on: Start)
    /// 2. Loading    → Extracting  (on: ModelLoaded)
    /// 3. Extracting → Chunking    (on: TextExtracted)
    /// 4. Chunking   → Embedding   (on: PassagesReady)
    /// 5. Embedding  → Ranking     (on: EmbeddingsComplete)
    /// 6. Ranking    → Presenting  (on: RankingComplete)
    /// 7. Presenting → Done        (on: Presented)
    /// 8. any active → Failed      (on: StageFailed)
    /// 9. Done/Failed self-loop
    pub fn transition(&self, event: StateEvent) -> Result<PipelineState> {
        use PipelineState::*;
        use StateEvent::*;

        let next_state = match (self, event) {
            (Idle, Start) => Loading,
            (Loading, ModelLoaded) => Extracting,
            (Extracting, TextExtracted) => Chunking,
            (Chunking, PassagesReady) => Embedding,
            (Embedding, EmbeddingsComplete) => Ranking,
            (Ranking, RankingComplete) => Presenting,
            (Presenting, Presented) => Done,

            (Loading | Extracting | Chunking | Embedding | Ranking | Presenting, StageFailed) => {
                Failed
            }

            // Terminal states (self-loops)
            (Done, _) => Done,
            (Failed, _) => Failed,

            (from, event) => {
                return Err(PipelineError::InvalidTransition {
                    from: format!("{:?}", from),
                    to: format!("(via {:?})", event),
                    reason: format!("No valid transition from {:?} on {:?}", from, event),
                });
            }
        };

        Ok(next_state)
    }

    /// Event that completes this stage successfully
    pub fn completion_event(&self) -> Option<StateEvent> {
        use PipelineState::*;
        use StateEvent::*;

        match self {
            Idle => Some(Start),
            Loading => Some(ModelLoaded),
            Extracting => Some(TextExtracted),
            Chunking => Some(PassagesReady),
            Embedding => Some(EmbeddingsComplete),
            Ranking => Some(RankingComplete),
            Presenting => Some(Presented),
            Done | Failed => None,
        }
    }

    /// Human-readable state name
    pub fn display_name(&self) -> &'static str {
        match self {
            PipelineState::Idle => "Idle",
            PipelineState::Loading => "Loading model",
            PipelineState::Extracting => "Extracting text",
            PipelineState::Chunking => "Chunking",
            PipelineState::Embedding => "Embedding",
            PipelineState::Ranking => "Ranking",
            PipelineState::Presenting => "Presenting",
            PipelineState::Done => "Done",
            PipelineState::Failed => "Failed",
        }
    }
}
