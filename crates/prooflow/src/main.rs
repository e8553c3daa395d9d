//! # Prooflow CLI
//!
//! Command-line interface for the Prooflow correction-batch engine.
//!
//! Prooflow splits long documents into bounded-size chunks for an external
//! correction engine and tracks their asynchronous completion as a single
//! batch. This binary inspects chunk plans and exercises the engine end to
//! end with a built-in echo corrector.
//!
//! ## Commands
//!
//! - `prooflow split <FILE>` - Print the chunk plan for a document
//! - `prooflow run <FILE>` - Split, admit, and drive a batch to completion
//! - `prooflow config show|init|path` - Manage configuration
//!
//! ## Examples
//!
//! ```bash
//! # Inspect how a document would be chunked
//! prooflow split draft.txt --max-chunk-size 500
//!
//! # Drive a batch with injected failures, JSON output
//! prooflow run draft.txt --fail-every 3 --format json
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use prooflow_batch::{run_batch, BatchController, BatchEvent, Reaper};
use prooflow_core::{BatchProgress, SplitPlan};
use prooflow_splitter::split;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

mod config;
mod echo;

use config::Config;
use echo::EchoCorrector;

#[derive(Parser)]
#[command(name = "prooflow")]
#[command(about = "Chunking and batch progress engine for text correction")]
#[command(version)]
struct Cli {
    /// Path to config file (default: ~/.config/prooflow/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the chunk plan for a document
    Split {
        /// Document to split
        file: PathBuf,

        /// Override the maximum chunk size (characters)
        #[arg(long)]
        max_chunk_size: Option<usize>,

        /// Override the overlap between adjacent chunks (characters)
        #[arg(long)]
        overlap: Option<usize>,
    },

    /// Split a document and drive the batch with the echo corrector
    Run {
        /// Document to process
        file: PathBuf,

        /// Max concurrent correction calls
        #[arg(long)]
        concurrency: Option<usize>,

        /// Fail every nth chunk to exercise the failure path
        #[arg(long)]
        fail_every: Option<usize>,

        /// Simulated per-chunk latency in milliseconds
        #[arg(long, default_value = "0")]
        chunk_delay_ms: u64,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Print sample configuration file
    Init,
    /// Show config file path
    Path,
}

/// Output structure for the split command.
#[derive(Serialize)]
struct SplitOutput {
    total_characters: usize,
    chunk_count: usize,
    max_chunk_size: usize,
    chunks: Vec<ChunkItem>,
}

#[derive(Serialize)]
struct ChunkItem {
    index: usize,
    id: String,
    start: usize,
    end: usize,
    length: usize,
    is_final: bool,
    preview: String,
}

/// Output structure for the run command.
#[derive(Serialize)]
struct RunOutput {
    batch_id: String,
    status: String,
    total_chunks: usize,
    processed_chunks: usize,
    completed: usize,
    failed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_ms: Option<i64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = if let Some(ref path) = cli.config {
        Config::load_from(Some(path.clone()))
            .with_context(|| format!("failed to load config from {}", path.display()))?
    } else {
        Config::load().context("failed to load config")?
    };

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        config.logging.level.parse().unwrap_or(Level::INFO)
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    match cli.command {
        Commands::Split {
            file,
            max_chunk_size,
            overlap,
        } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;

            let mut split_config = config.chunking.to_split_config();
            if let Some(size) = max_chunk_size {
                split_config.max_chunk_size = size;
            }
            if let Some(overlap) = overlap {
                split_config.overlap_size = overlap;
            }

            let plan = split(&text, &split_config)?;
            print_plan(&plan, cli.format);
        }

        Commands::Run {
            file,
            concurrency,
            fail_every,
            chunk_delay_ms,
        } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;

            let plan = split(&text, &config.chunking.to_split_config())?;
            info!(
                chunks = plan.chunk_count,
                characters = plan.total_characters,
                "document split"
            );

            let controller = Arc::new(BatchController::new(config.batch.to_batch_config()));
            let reaper = Reaper::new(Arc::clone(&controller));
            reaper.start().await;

            // Stream lifecycle events to the log while the batch runs.
            let mut events = controller.subscribe();
            let event_task = tokio::spawn(async move {
                while let Ok(event) = events.recv().await {
                    report_event(&event);
                }
            });

            let batch_id = controller.admit(&plan).await?;
            let corrector = Arc::new(EchoCorrector::new(
                Duration::from_millis(chunk_delay_ms),
                fail_every,
            ));
            let concurrency =
                concurrency.unwrap_or(config.batch.correction_concurrency);

            let progress =
                run_batch(&controller, batch_id, &plan, corrector, concurrency).await?;

            reaper.stop().await;
            controller.shutdown().await;
            event_task.abort();

            print_run_result(&progress, cli.format)?;
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => match cli.format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&config)
                            .context("failed to serialize config")?
                    );
                }
                OutputFormat::Text => {
                    println!(
                        "{}",
                        toml::to_string_pretty(&config).context("failed to serialize config")?
                    );
                }
            },
            ConfigAction::Init => {
                println!("{}", Config::sample_toml());
            }
            ConfigAction::Path => {
                if let Some(path) = Config::config_path() {
                    println!("{}", path.display());
                } else {
                    println!("Could not determine config directory");
                }
            }
        },
    }

    Ok(())
}

/// Log one lifecycle event.
fn report_event(event: &BatchEvent) {
    let progress = event.progress();
    match event {
        BatchEvent::Created { batch_id, .. } => {
            info!(%batch_id, total_chunks = progress.total_chunks, "batch created");
        }
        BatchEvent::Started { batch_id, .. } => {
            info!(%batch_id, "batch started");
        }
        BatchEvent::Progress { batch_id, .. } => {
            info!(
                %batch_id,
                processed = progress.processed_chunks(),
                total = progress.total_chunks,
                "progress"
            );
        }
        BatchEvent::Completed { batch_id, .. } => {
            info!(%batch_id, status = %progress.status, "batch settled");
        }
        BatchEvent::TimedOut { batch_id, .. } => {
            warn!(%batch_id, "batch timed out");
        }
        BatchEvent::Cancelled { batch_id, .. } => {
            warn!(%batch_id, "batch cancelled");
        }
    }
}

/// Print a chunk plan.
fn print_plan(plan: &SplitPlan, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let output = SplitOutput {
                total_characters: plan.total_characters,
                chunk_count: plan.chunk_count,
                max_chunk_size: plan.max_chunk_size,
                chunks: plan
                    .chunks
                    .iter()
                    .enumerate()
                    .map(|(index, chunk)| ChunkItem {
                        index,
                        id: chunk.id.to_string(),
                        start: chunk.original_range.start,
                        end: chunk.original_range.end,
                        length: chunk.length,
                        is_final: chunk.is_final,
                        preview: truncate(&chunk.content, 80),
                    })
                    .collect(),
            };
            match serde_json::to_string_pretty(&output) {
                Ok(json) => println!("{json}"),
                Err(e) => eprintln!("failed to serialize plan: {e}"),
            }
        }
        OutputFormat::Text => {
            println!(
                "{} characters -> {} chunks (max {})\n",
                plan.total_characters, plan.chunk_count, plan.max_chunk_size
            );
            for (i, chunk) in plan.chunks.iter().enumerate() {
                let marker = if chunk.is_final { " [final]" } else { "" };
                println!(
                    "{:>3}. [{}..{}] {} chars{}",
                    i + 1,
                    chunk.original_range.start,
                    chunk.original_range.end,
                    chunk.length,
                    marker
                );
                println!("     {}", truncate(&chunk.content, 100));
            }
        }
    }
}

/// Print the final progress of a run.
fn print_run_result(progress: &BatchProgress, format: OutputFormat) -> Result<()> {
    let duration_ms = match (progress.started_at, progress.finished_at) {
        (Some(start), Some(end)) => Some((end - start).num_milliseconds()),
        _ => None,
    };

    match format {
        OutputFormat::Json => {
            let output = RunOutput {
                batch_id: progress.batch_id.to_string(),
                status: progress.status.to_string(),
                total_chunks: progress.total_chunks,
                processed_chunks: progress.processed_chunks(),
                completed: progress.completed.len(),
                failed: progress.failed.len(),
                duration_ms,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => {
            println!("Batch {}", progress.batch_id);
            println!("  Status:    {}", progress.status);
            println!(
                "  Chunks:    {}/{} processed",
                progress.processed_chunks(),
                progress.total_chunks
            );
            println!("  Succeeded: {}", progress.completed.len());
            println!("  Failed:    {}", progress.failed.len());
            if let Some(ms) = duration_ms {
                println!("  Duration:  {ms} ms");
            }
        }
    }
    Ok(())
}

/// Truncate a string to max length, adding ellipsis if needed.
fn truncate(s: &str, max_len: usize) -> String {
    let s = s.replace('\n', " ").replace('\r', "");
    if s.chars().count() <= max_len {
        s
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}
