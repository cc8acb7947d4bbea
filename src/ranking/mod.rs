//! Similarity ranking of passage embeddings against a query
//!
//! Cosine similarity in `f64`, descending order, ties broken by ascending
//! passage index, truncated to the top `k`.

use serde::{Deserialize, Serialize};

use crate::errors::EmbeddingOwner;

/// Default number of results returned
pub const DEFAULT_TOP_K: usize = 5;

/// Similarity assigned when cosine is undefined (zero norm, length
/// mismatch, non-finite input). Lower than every valid cosine value.
pub const UNDEFINED_SIMILARITY: f64 = -2.0;

/// A vector tagged with the text it was computed from
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    pub owner: EmbeddingOwner,
    pub vector: Vec<f32>,
}

impl Embedding {
    pub fn passage(index: usize, vector: Vec<f32>) -> Self {
        Self {
            owner: EmbeddingOwner::Passage(index),
            vector,
        }
    }

    pub fn query(vector: Vec<f32>) -> Self {
        Self {
            owner: EmbeddingOwner::Query,
            vector,
        }
    }

    /// Passage index, or `None` for the query embedding
    pub fn passage_index(&self) -> Option<usize> {
        match self.owner {
            EmbeddingOwner::Passage(index) => Some(index),
            EmbeddingOwner::Query => None,
        }
    }
}

/// One ranked passage reference
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredResult {
    pub passage_index: usize,
    pub similarity: f64,
}

/// Cosine similarity `dot(a, b) / (|a| * |b|)`
///
/// Returns [`UNDEFINED_SIMILARITY`] when either vector has zero norm, the
/// lengths differ, or the computation is not finite.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return UNDEFINED_SIMILARITY;
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (x as f64, y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return UNDEFINED_SIMILARITY;
    }

    let similarity = dot / (norm_a.sqrt() * norm_b.sqrt());
    if !similarity.is_finite() {
        return UNDEFINED_SIMILARITY;
    }
    similarity.clamp(-1.0, 1.0)
}

/// Rank passage embeddings against `query`, returning at most `k` results
///
/// Embeddings without a passage owner are skipped.
pub fn rank(query: &[f32], passages: &[Embedding], k: usize) -> Vec<ScoredResult> {
    let mut scored: Vec<ScoredResult> = passages
        .iter()
        .filter_map(|embedding| {
            embedding.passage_index().map(|passage_index| ScoredResult {
                passage_index,
                similarity: cosine_similarity(query, &embedding.vector),
            })
        })
        .collect();

    scored.sort_by(|a, b| {
        b.similarity
            .total_cmp(&a.similarity)
            .then_with(|| a.passage_index.cmp(&b.passage_index))
    });
    scored.truncate(k);
    scored
}
