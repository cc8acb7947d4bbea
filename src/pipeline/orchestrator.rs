//! Pipeline orchestrator - main coordinator
//!
//! Drives one query through the stages in order:
//! - Loading: build the embedder (blocking pool)
//! - Extracting: read document text (blocking pool)
//! - Chunking: in-process
//! - Embedding: one blocking task for every text, progress streamed back
//! - Ranking: in-process
//! - Presenting: hand the report to the presenter
//!
//! Any stage error moves the machine to `Failed` and is returned as-is.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::chunking::{Chunker, Passage, DEFAULT_CHUNK_SIZE};
use crate::embedding::Embedder;
use crate::errors::{EmbeddingOwner, PipelineError, Result};
use crate::extraction::TextExtractor;
use crate::pipeline::report::{Presenter, RankedPassage, SearchReport};
use crate::pipeline::{PipelineState, StateEvent};
use crate::ranking::{rank, Embedding, DEFAULT_TOP_K};
use crate::telemetry::{PipelineEvent, TelemetryCollector};

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Document to search
    pub document: PathBuf,

    /// Passage size threshold in characters
    pub chunk_size: usize,

    /// Number of results to return
    pub top_k: usize,

    /// Name of the embedding backend, used in load diagnostics
    pub model_label: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            document: PathBuf::from(crate::config::DEFAULT_DOCUMENT),
            chunk_size: DEFAULT_CHUNK_SIZE,
            top_k: DEFAULT_TOP_K,
            model_label: crate::embedding::engine::DEFAULT_MODEL_ID.to_string(),
        }
    }
}

/// Single-run retrieval pipeline
pub struct Pipeline<P: Presenter> {
    config: PipelineConfig,
    chunker: Chunker,
    extractor: Arc<dyn TextExtractor>,
    presenter: P,
    state: PipelineState,
    telemetry: TelemetryCollector,
}

impl<P: Presenter> Pipeline<P> {
    /// Create a pipeline; rejects a zero chunk size or result count
    pub fn new(config: PipelineConfig, extractor: Arc<dyn TextExtractor>, presenter: P) -> Result<Self> {
        if config.top_k == 0 {
            return Err(PipelineError::ConfigError(
                "result count must be greater than zero".to_string(),
            ));
        }
        let chunker = Chunker::new(config.chunk_size)?;

        Ok(Self {
            config,
            chunker,
            extractor,
            presenter,
            state: PipelineState::Idle,
            telemetry: TelemetryCollector::new(),
        })
    }

    /// Attach an existing collector
    pub fn with_telemetry(mut self, telemetry: TelemetryCollector) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Get current state
    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn telemetry(&self) -> &TelemetryCollector {
        &self.telemetry
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    /// Transition to new state
    fn transition(&mut self, event: StateEvent) -> Result<()> {
        let new_state = self.state.transition(event)?;
        debug!(from = ?self.state, to = ?new_state, "state transition");

        self.state = new_state;
        if !new_state.is_terminal() {
            self.telemetry.record(PipelineEvent::StageEntered {
                stage: new_state,
                timestamp: Instant::now(),
            });
        }
        Ok(())
    }

    /// Run the whole pipeline for one query
    ///
    /// `loader` builds the embedder and runs before any document work, so a
    /// load failure leaves the document untouched. A pipeline runs once.
    pub async fn run<L, E>(&mut self, loader: L, query: &str) -> Result<SearchReport>
    where
        L: FnOnce() -> anyhow::Result<E> + Send + 'static,
        E: Embedder + 'static,
    {
        if self.state != PipelineState::Idle {
            return Err(PipelineError::InvalidTransition {
                from: format!("{:?}", self.state),
                to: format!("(via {:?})", StateEvent::Start),
                reason: "A pipeline can only run once".to_string(),
            });
        }

        self.transition(StateEvent::Start)?;
        match self.execute(loader, query).await {
            Ok(report) => Ok(report),
            Err(err) => {
                self.fail(&err);
                Err(err)
            }
        }
    }

    fn fail(&mut self, err: &PipelineError) {
        let stage = self.state;
        warn!(stage = stage.display_name(), error = %err, "pipeline stage failed");
        self.telemetry.record(PipelineEvent::StageFailed {
            stage,
            error: err.to_string(),
            timestamp: Instant::now(),
        });
        // Every non-Idle state accepts StageFailed
        if let Ok(next) = self.state.transition(StateEvent::StageFailed) {
            self.state = next;
        }
    }

    async fn execute<L, E>(&mut self, loader: L, query: &str) -> Result<SearchReport>
    where
        L: FnOnce() -> anyhow::Result<E> + Send + 'static,
        E: Embedder + 'static,
    {
        let embedder = self.load_embedder(loader).await?;
        self.transition(StateEvent::ModelLoaded)?;

        let text = self.extract_text().await?;
        self.transition(StateEvent::TextExtracted)?;

        let passages = self.chunker.chunk(&text);
        info!(
            passages = passages.len(),
            chunk_size = self.chunker.max_len(),
            "document chunked"
        );
        self.transition(StateEvent::PassagesReady)?;

        let dimension = embedder.dimension();
        let (query_embedding, embeddings) = self.embed_all(embedder, &passages, query).await?;
        verify_embeddings(&passages, &embeddings, &query_embedding, dimension)?;
        self.transition(StateEvent::EmbeddingsComplete)?;

        let results: Vec<RankedPassage> = rank(&query_embedding.vector, &embeddings, self.config.top_k)
            .into_iter()
            .map(|scored| RankedPassage {
                passage_index: scored.passage_index,
                similarity: scored.similarity,
                text: passages[scored.passage_index].text.clone(),
            })
            .collect();
        self.transition(StateEvent::RankingComplete)?;

        let report = SearchReport {
            query: query.to_string(),
            document: self.config.document.clone(),
            passage_count: passages.len(),
            dimension,
            results,
        };
        self.presenter.present(&report)?;
        self.transition(StateEvent::Presented)?;

        self.telemetry.record(PipelineEvent::RunCompleted {
            results: report.results.len(),
            timestamp: Instant::now(),
        });
        Ok(report)
    }

    async fn load_embedder<L, E>(&self, loader: L) -> Result<E>
    where
        L: FnOnce() -> anyhow::Result<E> + Send + 'static,
        E: Embedder + 'static,
    {
        let model = self.config.model_label.clone();
        info!(model = %model, "loading embedding model");

        let embedder = tokio::task::spawn_blocking(loader)
            .await
            .map_err(|e| PipelineError::ModelLoadFailure {
                model: model.clone(),
                reason: format!("loader task aborted: {}", e),
            })?
            .map_err(|e| PipelineError::ModelLoadFailure {
                model,
                reason: format!("{:#}", e),
            })?;

        info!(embedder = embedder.name(), dimension = embedder.dimension(), "embedder ready");
        Ok(embedder)
    }

    async fn extract_text(&self) -> Result<String> {
        let path = self.config.document.clone();
        let extractor = Arc::clone(&self.extractor);
        info!(document = %path.display(), "extracting text");

        let task_path = path.clone();
        let text = tokio::task::spawn_blocking(move || extractor.extract(&task_path))
            .await
            .map_err(|e| PipelineError::ExtractionFailure {
                path: path.clone(),
                reason: format!("extraction task aborted: {}", e),
            })?
            .map_err(|e| PipelineError::ExtractionFailure {
                path,
                reason: format!("{:#}", e),
            })?;

        debug!(chars = text.chars().count(), "text extracted");
        Ok(text)
    }

    /// Embed every passage in order, then the query
    ///
    /// The embedder moves onto the blocking pool for the whole loop and is
    /// dropped there. Progress comes back over a channel so the presenter and
    /// telemetry are only touched from this task.
    async fn embed_all<E: Embedder + 'static>(
        &mut self,
        embedder: E,
        passages: &[Passage],
        query: &str,
    ) -> Result<(Embedding, Vec<Embedding>)> {
        let texts: Vec<(EmbeddingOwner, String)> = passages
            .iter()
            .map(|p| (EmbeddingOwner::Passage(p.index), p.text.clone()))
            .chain(std::iter::once((EmbeddingOwner::Query, query.to_string())))
            .collect();
        let owners: Vec<EmbeddingOwner> = texts.iter().map(|(owner, _)| *owner).collect();

        self.presenter.embedding_started(texts.len());

        let (progress_tx, mut progress_rx) = mpsc::unbounded_channel();
        let worker = tokio::task::spawn_blocking(move || -> Result<Vec<Embedding>> {
            let mut embeddings = Vec::with_capacity(texts.len());
            for (owner, text) in texts {
                let started = Instant::now();
                let vector = embedder
                    .embed(&text)
                    .map_err(|e| PipelineError::EmbeddingFailure {
                        owner,
                        reason: format!("{:#}", e),
                    })?;
                // Receiver outlives the task unless the run was dropped
                let _ = progress_tx.send((owner, started.elapsed().as_millis() as u64));
                embeddings.push(Embedding { owner, vector });
            }
            Ok(embeddings)
        });

        let mut completed = 0usize;
        while let Some((owner, duration_ms)) = progress_rx.recv().await {
            self.record_embedded(owner, duration_ms);
            completed += 1;
        }

        let mut embeddings = match worker.await {
            Ok(result) => result?,
            Err(e) => {
                let owner = owners.get(completed).copied().unwrap_or(EmbeddingOwner::Query);
                return Err(PipelineError::EmbeddingFailure {
                    owner,
                    reason: format!("embedding task aborted: {}", e),
                });
            }
        };

        let query_embedding = match embeddings.pop() {
            Some(embedding) if embedding.owner == EmbeddingOwner::Query => embedding,
            _ => {
                return Err(PipelineError::ConsistencyFault(
                    "query embedding missing".to_string(),
                ))
            }
        };
        self.presenter.embedding_finished();

        Ok((query_embedding, embeddings))
    }

    fn record_embedded(&mut self, owner: EmbeddingOwner, duration_ms: u64) {
        debug!(%owner, duration_ms, "embedded");
        if let EmbeddingOwner::Passage(index) = owner {
            self.telemetry.record(PipelineEvent::PassageEmbedded {
                index,
                duration_ms,
                timestamp: Instant::now(),
            });
        }
        self.presenter.text_embedded(owner);
    }
}

/// Check that every passage has exactly one embedding of the right size
fn verify_embeddings(
    passages: &[Passage],
    embeddings: &[Embedding],
    query: &Embedding,
    dimension: usize,
) -> Result<()> {
    if passages.len() != embeddings.len() {
        return Err(PipelineError::ConsistencyFault(format!(
            "{} passages but {} embeddings",
            passages.len(),
            embeddings.len()
        )));
    }

    for (position, (passage, embedding)) in passages.iter().zip(embeddings).enumerate() {
        if passage.index != position || embedding.passage_index() != Some(position) {
            return Err(PipelineError::ConsistencyFault(format!(
                "embedding at position {} belongs to {}, passage index is {}",
                position, embedding.owner, passage.index
            )));
        }
        if embedding.vector.len() != dimension {
            return Err(PipelineError::ConsistencyFault(format!(
                "{} has {} dimensions, expected {}",
                embedding.owner,
                embedding.vector.len(),
                dimension
            )));
        }
    }

    if query.vector.len() != dimension {
        return Err(PipelineError::ConsistencyFault(format!(
            "query has {} dimensions, expected {}",
            query.vector.len(),
            dimension
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passages(n: usize) -> Vec<Passage> {
        (0..n)
            .map(|index| Passage {
                index,
                text: format!("passage {}", index),
            })
            .collect()
    }

    #[test]
    fn test_verify_accepts_matching_set() {
        let embeddings = vec![
            Embedding::passage(0, vec![1.0, 0.0]),
            Embedding::passage(1, vec![0.0, 1.0]),
        ];
        let query = Embedding::query(vec![1.0, 1.0]);
        assert!(verify_embeddings(&passages(2), &embeddings, &query, 2).is_ok());
    }

    #[test]
    fn test_verify_rejects_count_mismatch() {
        let embeddings = vec![Embedding::passage(0, vec![1.0])];
        let query = Embedding::query(vec![1.0]);
        let result = verify_embeddings(&passages(2), &embeddings, &query, 1);
        assert!(matches!(result, Err(PipelineError::ConsistencyFault(_))));
    }

    #[test]
    fn test_verify_rejects_misordered_embeddings() {
        let embeddings = vec![
            Embedding::passage(1, vec![1.0]),
            Embedding::passage(0, vec![1.0]),
        ];
        let query = Embedding::query(vec![1.0]);
        let result = verify_embeddings(&passages(2), &embeddings, &query, 1);
        assert!(matches!(result, Err(PipelineError::ConsistencyFault(_))));
    }

    #[test]
    fn test_verify_rejects_dimension_drift() {
        let embeddings = vec![Embedding::passage(0, vec![1.0, 0.0, 0.0])];
        let query = Embedding::query(vec![1.0, 0.0]);
        let result = verify_embeddings(&passages(1), &embeddings, &query, 2);
        assert!(matches!(result, Err(PipelineError::ConsistencyFault(_))));

        let embeddings = vec![Embedding::passage(0, vec![1.0, 0.0])];
        let query = Embedding::query(vec![1.0]);
        let result = verify_embeddings(&passages(1), &embeddings, &query, 2);
        assert!(matches!(result, Err(PipelineError::ConsistencyFault(_))));
    }

    #[test]
    fn test_new_rejects_zero_parameters() {
        let extractor: Arc<dyn TextExtractor> = Arc::new(crate::extraction::PlainTextExtractor);

        let config = PipelineConfig {
            top_k: 0,
            ..Default::default()
        };
        assert!(matches!(
            Pipeline::new(config, Arc::clone(&extractor), crate::display::SilentPresenter),
            Err(PipelineError::ConfigError(_))
        ));

        let config = PipelineConfig {
            chunk_size: 0,
            ..Default::default()
        };
        assert!(matches!(
            Pipeline::new(config, extractor, crate::display::SilentPresenter),
            Err(PipelineError::ConfigError(_))
        ));
    }
}
