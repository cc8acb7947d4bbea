//! docseek - Main CLI Entry Point

use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use docseek::{
    cli::{Args, Commands, Verbosity},
    config::Config,
    display::TerminalPresenter,
    embedding::{EmbedderKind, EmbeddingEngine, HashEmbedder},
    extraction::{DocumentExtractor, TextExtractor},
    input::{normalize_query, QueryPrompt},
    pipeline::Pipeline,
    telemetry::{TelemetryCollector, TelemetryDisplay},
    PipelineError,
};

fn init_tracing(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.log_filter()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(args: &Args) -> Result<Config, PipelineError> {
    let mut config = Config::load(args.config.as_deref())
        .map_err(|e| PipelineError::ConfigError(format!("{:#}", e)))?;
    args.apply_to(&mut config);
    config.validate()?;
    Ok(config)
}

/// Print the effective configuration, optionally persisting it
fn show_config(config: &Config, save: bool) -> Result<(), PipelineError> {
    let rendered = config
        .to_toml()
        .map_err(|e| PipelineError::ConfigError(format!("{:#}", e)))?;
    println!("{}", rendered);

    if save {
        let path = Config::config_path()
            .map_err(|e| PipelineError::ConfigError(format!("{:#}", e)))?;
        config
            .save(&path)
            .map_err(|e| PipelineError::ConfigError(format!("{:#}", e)))?;
        eprintln!("Saved to {}", path.display());
    }
    Ok(())
}

/// Read the query, then run the pipeline once
async fn search(config: &Config, args: &Args, verbosity: Verbosity) -> Result<(), PipelineError> {
    let query = match &args.query {
        Some(query) => normalize_query(query)?,
        None => QueryPrompt::new(&config.document.path)?.read_query()?,
    };

    let telemetry = TelemetryCollector::new();
    let extractor: Arc<dyn TextExtractor> = Arc::new(DocumentExtractor::new());
    let presenter = TerminalPresenter::new(verbosity.show_progress());
    let mut pipeline = Pipeline::new(config.pipeline_config(), extractor, presenter)?
        .with_telemetry(telemetry.clone());

    let outcome = match config.model.embedder {
        EmbedderKind::Model => {
            let engine_config = config.engine_config();
            pipeline
                .run(move || EmbeddingEngine::load(&engine_config), &query)
                .await
        }
        EmbedderKind::Hash => {
            let dimension = config.model.hash_dimension;
            pipeline
                .run(move || HashEmbedder::new(dimension), &query)
                .await
        }
    };

    if verbosity.show_summary() {
        TelemetryDisplay::new(telemetry).display_summary();
    }

    outcome.map(|report| info!(results = report.results.len(), "search complete"))
}

async fn run(args: &Args, verbosity: Verbosity) -> Result<(), PipelineError> {
    let config = load_config(args)?;

    match &args.command {
        Some(Commands::Config { save }) => show_config(&config, *save),
        None => search(&config, args, verbosity).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let verbosity = args.verbosity();
    init_tracing(verbosity);
    info!(verbosity = verbosity.as_str(), "starting docseek");

    match run(&args, verbosity).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            TerminalPresenter::show_error(&err);
            ExitCode::from(err.exit_code())
        }
    }
}
