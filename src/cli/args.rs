//! Command-line argument parsing for docseek
//!
//! Provides clap-based CLI with a config subcommand and verbosity control.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;
use crate::embedding::{EmbedderKind, Pooling};

/// docseek - Ask questions of a document and get its most relevant passages
#[derive(Parser, Debug)]
#[command(name = "docseek")]
#[command(version)]
#[command(about = "Semantic passage search over a single document", long_about = None)]
pub struct Args {
    /// Document to search (PDF or plain text)
    #[arg(value_name = "DOCUMENT")]
    pub document: Option<PathBuf>,

    /// Query text; prompts on the terminal when omitted
    #[arg(short = 'Q', long)]
    pub query: Option<String>,

    /// Passage size threshold in characters
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Number of passages to return
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Hugging Face model id for the embedding model
    #[arg(short, long)]
    pub model: Option<String>,

    /// Pooling policy for the embedding model
    #[arg(long, value_enum)]
    pub pooling: Option<Pooling>,

    /// Embedding backend
    #[arg(long, value_enum)]
    pub embedder: Option<EmbedderKind>,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Verbosity level: -q (quiet), default (normal), -v (verbose), -vv (very verbose)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress everything except results and errors)
    #[arg(short, long)]
    pub quiet: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Display the effective configuration
    Config {
        /// Also write it to the default config location
        #[arg(long)]
        save: bool,
    },
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }

    /// Overlay command-line values onto a loaded configuration
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(document) = &self.document {
            config.document.path = document.clone();
        }
        if let Some(chunk_size) = self.chunk_size {
            config.retrieval.chunk_size = chunk_size;
        }
        if let Some(top_k) = self.top_k {
            config.retrieval.top_k = top_k;
        }
        if let Some(model) = &self.model {
            config.model.id = model.clone();
        }
        if let Some(pooling) = self.pooling {
            config.model.pooling = pooling;
        }
        if let Some(embedder) = self.embedder {
            config.model.embedder = embedder;
        }
    }
}

impl Verbosity {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "quiet",
            Verbosity::Normal => "normal",
            Verbosity::Verbose => "verbose",
            Verbosity::VeryVerbose => "very_verbose",
        }
    }

    /// Check if should show progress bars
    pub fn show_progress(&self) -> bool {
        !matches!(self, Verbosity::Quiet)
    }

    /// Check if should print the run summary
    pub fn show_summary(&self) -> bool {
        matches!(self, Verbosity::Verbose | Verbosity::VeryVerbose)
    }

    /// Default log filter for this level
    pub fn log_filter(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "off",
            Verbosity::Normal => "error",
            Verbosity::Verbose => "info",
            Verbosity::VeryVerbose => "debug",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_verbosity_quiet() {
        assert_eq!(parse(&["docseek", "-q"]).verbosity(), Verbosity::Quiet);
    }

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(parse(&["docseek"]).verbosity(), Verbosity::Normal);
        assert_eq!(parse(&["docseek", "-v"]).verbosity(), Verbosity::Verbose);
        assert_eq!(parse(&["docseek", "-vv"]).verbosity(), Verbosity::VeryVerbose);
    }

    #[test]
    fn test_full_invocation() {
        let args = parse(&[
            "docseek",
            "guide.pdf",
            "--query",
            "what is testing",
            "--chunk-size",
            "300",
            "-k",
            "3",
            "--pooling",
            "cls",
            "--embedder",
            "hash",
        ]);
        assert_eq!(args.document, Some(PathBuf::from("guide.pdf")));
        assert_eq!(args.query.as_deref(), Some("what is testing"));
        assert_eq!(args.chunk_size, Some(300));
        assert_eq!(args.top_k, Some(3));
        assert_eq!(args.pooling, Some(Pooling::Cls));
        assert_eq!(args.embedder, Some(EmbedderKind::Hash));
    }

    #[test]
    fn test_config_subcommand() {
        let args = parse(&["docseek", "config", "--save"]);
        assert_eq!(args.command, Some(Commands::Config { save: true }));
    }

    #[test]
    fn test_apply_overrides_only_given_values() {
        let args = parse(&["docseek", "notes.txt", "-k", "2"]);
        let mut config = Config::default();
        args.apply_to(&mut config);

        assert_eq!(config.document.path, PathBuf::from("notes.txt"));
        assert_eq!(config.retrieval.top_k, 2);
        assert_eq!(config.retrieval.chunk_size, 500);
        assert_eq!(config.model.embedder, EmbedderKind::Model);
    }

    #[test]
    fn test_verbosity_methods() {
        assert!(!Verbosity::Quiet.show_progress());
        assert!(Verbosity::Normal.show_progress());

        assert!(!Verbosity::Normal.show_summary());
        assert!(Verbosity::Verbose.show_summary());

        assert_eq!(Verbosity::Quiet.log_filter(), "off");
        assert_eq!(Verbosity::VeryVerbose.log_filter(), "debug");
    }
}
