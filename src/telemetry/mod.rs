//! Telemetry for pipeline runs
//!
//! Collects stage events and per-passage timings; the binary prints a
//! summary at `-v`.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::pipeline::PipelineState;

/// Telemetry event types
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    StageEntered {
        stage: PipelineState,
        timestamp: Instant,
    },
    PassageEmbedded {
        index: usize,
        duration_ms: u64,
        timestamp: Instant,
    },
    StageFailed {
        stage: PipelineState,
        error: String,
        timestamp: Instant,
    },
    RunCompleted {
        results: usize,
        timestamp: Instant,
    },
}

/// Telemetry statistics
#[derive(Debug, Clone, Default)]
pub struct TelemetryStats {
    pub stage_transitions: usize,
    pub passages_embedded: usize,
    pub embedding_time_ms: u64,
    pub failures: usize,
    pub results_returned: usize,
}

/// Telemetry collector
#[derive(Clone)]
pub struct TelemetryCollector {
    events: Arc<Mutex<Vec<PipelineEvent>>>,
    stats: Arc<Mutex<TelemetryStats>>,
    start_time: Instant,
}

impl TelemetryCollector {
    /// Create a new telemetry collector
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            stats: Arc::new(Mutex::new(TelemetryStats::default())),
            start_time: Instant::now(),
        }
    }

    /// Record an event
    pub fn record(&self, event: PipelineEvent) {
        if let Ok(mut stats) = self.stats.lock() {
            match &event {
                PipelineEvent::StageEntered { .. } => stats.stage_transitions += 1,
                PipelineEvent::PassageEmbedded { duration_ms, .. } => {
                    stats.passages_embedded += 1;
                    stats.embedding_time_ms += duration_ms;
                }
                PipelineEvent::StageFailed { .. } => stats.failures += 1,
                PipelineEvent::RunCompleted { results, .. } => stats.results_returned = *results,
            }
        }

        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }

    /// Get current statistics
    pub fn get_stats(&self) -> TelemetryStats {
        self.stats
            .lock()
            .map(|stats| stats.clone())
            .unwrap_or_default()
    }

    /// Get elapsed time since start
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Get event count
    pub fn event_count(&self) -> usize {
        self.events.lock().map(|events| events.len()).unwrap_or(0)
    }

    /// Stages entered so far, in order
    pub fn stages(&self) -> Vec<PipelineState> {
        self.events
            .lock()
            .map(|events| {
                events
                    .iter()
                    .filter_map(|e| match e {
                        PipelineEvent::StageEntered { stage, .. } => Some(*stage),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Mean embedding latency per passage
    pub fn mean_embedding_ms(&self) -> f64 {
        let stats = self.get_stats();
        if stats.passages_embedded == 0 {
            0.0
        } else {
            stats.embedding_time_ms as f64 / stats.passages_embedded as f64
        }
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Simple telemetry display
pub struct TelemetryDisplay {
    collector: TelemetryCollector,
}

impl TelemetryDisplay {
    pub fn new(collector: TelemetryCollector) -> Self {
        Self { collector }
    }

    /// Display summary statistics on stderr
    pub fn display_summary(&self) {
        let stats = self.collector.get_stats();

        eprintln!("\nRun Summary");
        eprintln!("─────────────────────────────────────");
        eprintln!("Duration:          {:?}", self.collector.elapsed());
        eprintln!("Stages entered:    {}", stats.stage_transitions);
        eprintln!("Texts embedded:    {}", stats.passages_embedded);
        eprintln!("Mean embed time:   {:.1}ms", self.collector.mean_embedding_ms());
        eprintln!("Results returned:  {}", stats.results_returned);
        eprintln!("Failures:          {}", stats.failures);
        eprintln!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_accumulate() {
        let collector = TelemetryCollector::new();
        collector.record(PipelineEvent::StageEntered {
            stage: PipelineState::Loading,
            timestamp: Instant::now(),
        });
        collector.record(PipelineEvent::PassageEmbedded {
            index: 0,
            duration_ms: 10,
            timestamp: Instant::now(),
        });
        collector.record(PipelineEvent::PassageEmbedded {
            index: 1,
            duration_ms: 30,
            timestamp: Instant::now(),
        });

        let stats = collector.get_stats();
        assert_eq!(stats.stage_transitions, 1);
        assert_eq!(stats.passages_embedded, 2);
        assert_eq!(collector.mean_embedding_ms(), 20.0);
        assert_eq!(collector.event_count(), 3);
        assert_eq!(collector.stages(), vec![PipelineState::Loading]);
    }

    #[test]
    fn test_clones_share_state() {
        let collector = TelemetryCollector::new();
        let clone = collector.clone();
        clone.record(PipelineEvent::StageFailed {
            stage: PipelineState::Extracting,
            error: "missing".to_string(),
            timestamp: Instant::now(),
        });
        assert_eq!(collector.get_stats().failures, 1);
    }

    #[test]
    fn test_mean_without_embeddings() {
        assert_eq!(TelemetryCollector::new().mean_embedding_ms(), 0.0);
    }
}
