//! Terminal presentation
//!
//! Ranked passages go to stdout; the embedding progress bar and diagnostics
//! go to stderr.

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::time::Duration;

use crate::errors::{EmbeddingOwner, PipelineError, Result};
use crate::pipeline::{Presenter, RankedPassage, SearchReport};

/// Header line for a result listing
pub fn format_header(query: &str) -> String {
    format!("Results for \"{}\":", query)
}

/// One result line: index, similarity to 4 decimals, passage text
pub fn format_result(result: &RankedPassage) -> String {
    format!(
        "Passage {} (similarity: {:.4}): {}",
        result.passage_index, result.similarity, result.text
    )
}

/// Presenter writing to the terminal
pub struct TerminalPresenter {
    show_progress: bool,
    bar: Option<ProgressBar>,
}

impl TerminalPresenter {
    pub fn new(show_progress: bool) -> Self {
        Self {
            show_progress,
            bar: None,
        }
    }

    /// Print a fatal diagnostic to stderr
    pub fn show_error(error: &PipelineError) {
        eprintln!("{} {}", "Error:".red().bold(), error.to_string().red());
    }

    fn finish_bar(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

impl Presenter for TerminalPresenter {
    fn embedding_started(&mut self, total: usize) {
        if !self.show_progress {
            return;
        }
        let bar = ProgressBar::new(total as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.cyan} Embedding [{bar:40.cyan/blue}] {pos}/{len} | ETA: {eta}")
        {
            bar.set_style(style.progress_chars("=>-"));
        }
        bar.enable_steady_tick(Duration::from_millis(100));
        self.bar = Some(bar);
    }

    fn text_embedded(&mut self, _owner: EmbeddingOwner) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    fn embedding_finished(&mut self) {
        self.finish_bar();
    }

    fn present(&mut self, report: &SearchReport) -> Result<()> {
        self.finish_bar();

        let stdout = io::stdout();
        let mut out = stdout.lock();
        writeln!(out, "{}", format_header(&report.query).bold())?;

        if report.is_empty() {
            writeln!(out, "{}", "No passages found in the document.".yellow())?;
        }
        for result in &report.results {
            writeln!(out, "{}", format_result(result))?;
        }
        out.flush()?;
        Ok(())
    }
}

impl Drop for TerminalPresenter {
    fn drop(&mut self) {
        self.finish_bar();
    }
}

/// Presenter that renders nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentPresenter;

impl Presenter for SilentPresenter {
    fn present(&mut self, _report: &SearchReport) -> Result<()> {
        Ok(())
    }
}
