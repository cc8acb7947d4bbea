//! Retrieval pipeline
//!
//! The state machine, the orchestrator that drives it, and the report handed
//! to presenters.

pub mod orchestrator;
pub mod report;
pub mod state;

pub use orchestrator::{Pipeline, PipelineConfig};
pub use report::{Presenter, RankedPassage, SearchReport};
pub use state::{PipelineState, StateEvent};
