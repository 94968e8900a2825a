//! Background Removal Client CLI
//!
//! Command-line interface over the batch session: single-image removal,
//! batch processing with archive bundling, and recompositing of stored
//! results.

use crate::services::BatchObserver;
use crate::types::{ItemId, ItemStatus, RunSummary};
use crate::{BatchSession, ClientConfig, Engine, HttpBackend, ImageFile};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Background removal client CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "bgremove-client")]
pub struct Cli {
    /// Base URL of the background removal service
    #[arg(long, global = true, default_value = "http://127.0.0.1:8000")]
    pub base_url: String,

    /// Remote engine to process with
    #[arg(short, long, global = true, value_enum, default_value_t = CliEngine::Withoutbg)]
    pub engine: CliEngine,

    /// Request timeout in seconds
    #[arg(long, global = true, default_value_t = 300)]
    pub timeout: u64,

    /// Enable verbose logging (-v: INFO, -vv: DEBUG, -vvv: TRACE)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Remove the background from a single image
    Single {
        /// Input image file
        input: PathBuf,

        /// Download the processed result to this file instead of printing its URL
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,
    },

    /// Process a batch of images and bundle the results into one archive
    Batch {
        /// Input image files
        #[arg(value_name = "INPUT", required = true)]
        inputs: Vec<PathBuf>,

        /// Directory to save the result archive into [default: current directory]
        #[arg(short, long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// Skip archive bundling after the run
        #[arg(long)]
        no_bundle: bool,
    },

    /// Recomposite a processed result against a color or background image
    Composite {
        /// Result filename returned by an earlier removal
        filename: String,

        /// Solid background color, e.g. "#ff0000"
        #[arg(long, conflicts_with = "background")]
        color: Option<String>,

        /// Background image file
        #[arg(long, value_name = "IMAGE")]
        background: Option<PathBuf>,

        /// Download the composited result to this file instead of printing its URL
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum CliEngine {
    Withoutbg,
    Rembg,
}

impl From<CliEngine> for Engine {
    fn from(engine: CliEngine) -> Self {
        match engine {
            CliEngine::Withoutbg => Engine::WithoutBg,
            CliEngine::Rembg => Engine::Rembg,
        }
    }
}

pub async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose).context("Failed to initialize tracing")?;

    let config = ClientConfig::builder()
        .base_url(&cli.base_url)
        .engine(cli.engine.into())
        .timeout(Duration::from_secs(cli.timeout))
        .build()
        .context("Invalid client configuration")?;

    match cli.command {
        Command::Single { input, output } => run_single(&config, &input, output.as_deref()).await,
        Command::Batch {
            inputs,
            output_dir,
            no_bundle,
        } => run_batch(&config, &inputs, output_dir, no_bundle).await,
        Command::Composite {
            filename,
            color,
            background,
            output,
        } => {
            run_composite(
                &config,
                &filename,
                color.as_deref(),
                background.as_deref(),
                output.as_deref(),
            )
            .await
        },
    }
}

/// Initialize tracing based on verbosity level
fn init_tracing(verbose_count: u8) -> Result<()> {
    use tracing_subscriber::EnvFilter;

    let level = match verbose_count {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to set tracing subscriber: {e}"))?;

    if verbose_count > 0 {
        debug!(log_level = %level, "Tracing initialized");
    }
    Ok(())
}

async fn run_single(
    config: &ClientConfig,
    input: &std::path::Path,
    output: Option<&std::path::Path>,
) -> Result<()> {
    let result = crate::remove_background(input, config)
        .await
        .with_context(|| format!("Failed to process {}", input.display()))?;
    info!("Processed '{}' -> '{}'", input.display(), result.filename);
    save_or_print(config, &result.filename, &result.result_url, output).await
}

async fn run_batch(
    config: &ClientConfig,
    inputs: &[PathBuf],
    output_dir: Option<PathBuf>,
    no_bundle: bool,
) -> Result<()> {
    let mut files = Vec::with_capacity(inputs.len());
    for path in inputs {
        files.push(
            ImageFile::from_path(path)
                .with_context(|| format!("Failed to read {}", path.display()))?,
        );
    }
    let candidates = files.len();

    let progress = batch_progress_bar(candidates as u64);
    let session = BatchSession::new(config)
        .context("Failed to create batch session")?
        .with_observer(Arc::new(IndicatifObserver::new(progress.clone())));

    let accepted = session.enqueue(files);
    if accepted < candidates {
        warn!(
            "Skipped {} file(s) with unsupported media types",
            candidates - accepted
        );
    }
    if accepted == 0 {
        anyhow::bail!("No supported image files among the inputs");
    }
    progress.set_length(accepted as u64);

    let summary = session.run().await.context("Batch run failed")?;
    print_summary(&summary, &session);

    if summary.completed.is_empty() {
        anyhow::bail!("All items failed; nothing to bundle");
    }
    if no_bundle {
        return Ok(());
    }

    let dir = output_dir.unwrap_or_else(|| PathBuf::from("."));
    match session.bundle_to_dir(&dir).await.context("Bundling failed")? {
        Some(path) => println!("Archive saved to {}", path.display()),
        None => println!("No results to bundle"),
    }
    Ok(())
}

async fn run_composite(
    config: &ClientConfig,
    filename: &str,
    color: Option<&str>,
    background: Option<&std::path::Path>,
    output: Option<&std::path::Path>,
) -> Result<()> {
    let bg_image = match background {
        Some(path) => Some(
            ImageFile::from_path(path)
                .with_context(|| format!("Failed to read {}", path.display()))?,
        ),
        None => None,
    };

    let backend = HttpBackend::new(config).context("Failed to create HTTP client")?;
    let result = backend
        .composite(filename, color, bg_image.as_ref())
        .await
        .with_context(|| format!("Failed to composite '{filename}'"))?;
    info!("Composited '{}' -> '{}'", filename, result.filename);
    save_or_print(config, &result.filename, &result.result_url, output).await
}

/// Download the result to `output` when given, otherwise print its URL
async fn save_or_print(
    config: &ClientConfig,
    filename: &str,
    result_url: &str,
    output: Option<&std::path::Path>,
) -> Result<()> {
    match output {
        Some(path) => {
            let backend = HttpBackend::new(config).context("Failed to create HTTP client")?;
            let bytes = backend
                .download(filename)
                .await
                .with_context(|| format!("Failed to download '{filename}'"))?;
            std::fs::write(path, bytes)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Saved result to {}", path.display());
        },
        None => println!("{result_url}"),
    }
    Ok(())
}

fn batch_progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}

fn print_summary(summary: &RunSummary, session: &BatchSession) {
    println!(
        "Batch finished: {} succeeded, {} failed, {} skipped",
        summary.completed.len(),
        summary.failed,
        summary.skipped
    );
    for item in session.items() {
        if let Some(reason) = item.error() {
            println!("  failed: {} ({reason})", item.file().name());
        }
    }
}

/// Observer rendering batch progress through an indicatif bar
struct IndicatifObserver {
    bar: ProgressBar,
}

impl IndicatifObserver {
    fn new(bar: ProgressBar) -> Self {
        Self { bar }
    }
}

impl BatchObserver for IndicatifObserver {
    fn on_status(&self, _id: ItemId, name: &str, status: ItemStatus) {
        match status {
            ItemStatus::Processing => self.bar.set_message(format!("Processing {name}")),
            ItemStatus::Error => self.bar.set_message(format!("Failed {name}")),
            _ => {},
        }
    }

    fn on_progress(&self, visited: usize, _total: usize) {
        self.bar.set_position(visited as u64);
    }

    fn on_finished(&self, summary: &RunSummary) {
        self.bar.finish_with_message(format!(
            "{} succeeded, {} failed",
            summary.completed.len(),
            summary.failed
        ));
    }
}
