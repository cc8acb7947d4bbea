// Search results and the presentation seam
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::errors::{EmbeddingOwner, Result};

/// A ranked passage with its text attached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedPassage {
    pub passage_index: usize,
    pub similarity: f64,
    pub text: String,
}

/// Everything a presenter needs to render one query's results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchReport {
    pub query: String,
    pub document: PathBuf,
    /// Number of passages the document was split into
    pub passage_count: usize,
    /// Embedding dimensionality used for the run
    pub dimension: usize,
    /// Best matches first
    pub results: Vec<RankedPassage>,
}

impl SearchReport {
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Receives progress while embedding and the final ranking
///
/// Only `present` is required; progress hooks default to no-ops.
pub trait Presenter {
    fn embedding_started(&mut self, _total: usize) {}

    fn text_embedded(&mut self, _owner: EmbeddingOwner) {}

    fn embedding_finished(&mut self) {}

    fn present(&mut self, report: &SearchReport) -> Result<()>;
}

impl<P: Presenter + ?Sized> Presenter for &mut P {
    fn embedding_started(&mut self, total: usize) {
        (**self).embedding_started(total)
    }

    fn text_embedded(&mut self, owner: EmbeddingOwner) {
        (**self).text_embedded(owner)
    }

    fn embedding_finished(&mut self) {
        (**self).embedding_finished()
    }

    fn present(&mut self, report: &SearchReport) -> Result<()> {
        (**self).present(report)
    }
}
