mod history;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pagelift_client::{HtmdCleaner, ReqwestFetcher};
use pagelift_core::models::{HistoryEntry, LayerState, LayerStatus, ProgressSnapshot};
use pagelift_core::traits::{HistoryStore, NullHistory, ProgressReporter};
use pagelift_core::{PipelineConfig, ScrapePipeline, catalogue, derive_title};

use crate::history::JsonLinesHistory;

const EXIT_EXHAUSTED: u8 = 2;

const EXHAUSTED_MESSAGE: &str = "Could not retrieve this page.\n\
Every retrieval strategy failed: public CORS proxies, the JS-rendering reader service, \
the search engine cache, the web archive and the paywall bypass.\n\
The site may block automated access or require a login. Try again later or save the page \
from a browser.";

#[derive(Parser)]
#[command(name = "pagelift", version, about = "Fetch any web page as clean Markdown")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Retrieve a page through the strategy cascade and print it as Markdown
    Scrape {
        /// Target URL to scrape
        #[arg(short, long)]
        url: String,

        /// Write the result to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Emit the full result as JSON instead of Markdown
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Append successful scrapes to this JSON-lines file
        #[arg(long, env = "PAGELIFT_HISTORY_FILE")]
        history: Option<PathBuf>,

        /// Do not print progress or the summary
        #[arg(short, long, default_value_t = false)]
        quiet: bool,
    },

    /// Show recently scraped pages
    History {
        /// JSON-lines history file
        #[arg(long, env = "PAGELIFT_HISTORY_FILE")]
        history: PathBuf,

        /// Number of entries to show
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },

    /// List the retrieval strategies in the order they are tried
    Strategies,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("pagelift=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scrape {
            url,
            output,
            json,
            history,
            quiet,
        } => {
            let config = PipelineConfig::from_env().map_err(|e| anyhow::anyhow!(e))?;
            let options = ScrapeOptions {
                output,
                json,
                quiet,
            };
            let outcome = match history {
                Some(path) => {
                    let store = JsonLinesHistory::new(path);
                    cmd_scrape(&config, &url, &options, &store).await?
                }
                None => cmd_scrape(&config, &url, &options, &NullHistory).await?,
            };
            if outcome == ScrapeOutcome::Exhausted {
                return Ok(ExitCode::from(EXIT_EXHAUSTED));
            }
        }
        Commands::History { history, limit } => {
            cmd_history(&JsonLinesHistory::new(history), limit)?;
        }
        Commands::Strategies => cmd_strategies()?,
    }

    Ok(ExitCode::SUCCESS)
}

struct ScrapeOptions {
    output: Option<PathBuf>,
    json: bool,
    quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScrapeOutcome {
    Saved,
    Exhausted,
}

async fn cmd_scrape(
    config: &PipelineConfig,
    url: &str,
    options: &ScrapeOptions,
    history: &dyn HistoryStore,
) -> Result<ScrapeOutcome> {
    let fetcher = ReqwestFetcher::from_config(config).context("Failed to create HTTP client")?;
    let pipeline = ScrapePipeline::new(fetcher, HtmdCleaner::new(), config);

    let progress = StderrProgress {
        quiet: options.quiet,
    };
    let result = match pipeline.run(url, &progress).await {
        Ok(result) => result,
        Err(e) if e.is_exhaustion() => {
            eprintln!("\n{EXHAUSTED_MESSAGE}");
            return Ok(ScrapeOutcome::Exhausted);
        }
        Err(e) => return Err(anyhow::anyhow!(e)),
    };

    let rendered = if options.json {
        serde_json::to_string_pretty(&result)?
    } else {
        result.markdown.clone()
    };

    match &options.output {
        Some(path) => std::fs::write(path, &rendered)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => println!("{rendered}"),
    }

    let title = derive_title(&result.markdown, url);
    let entry = HistoryEntry {
        url: url.to_string(),
        title: title.clone(),
        scraped_at: result.scraped_at,
    };
    // Best effort: the page is already written.
    if let Err(e) = history.record(&entry) {
        tracing::warn!(error = %e, "Failed to record history");
    }

    if !options.quiet {
        eprintln!(
            "\n{title}: {} words, ~{} min read, via {} ({}/{})",
            result.word_count,
            result.read_time,
            result.strategy_name,
            result.strategy_index_used,
            result.layers.len()
        );
        if let Some(path) = &options.output {
            eprintln!("Saved to {}", path.display());
        }
    }

    Ok(ScrapeOutcome::Saved)
}

fn cmd_history(history: &JsonLinesHistory, limit: usize) -> Result<()> {
    let entries = history.recent(limit).map_err(|e| anyhow::anyhow!(e))?;

    if entries.is_empty() {
        println!("No history in {}", history.path().display());
        return Ok(());
    }

    for entry in &entries {
        println!(
            "  {}  {}  <{}>",
            entry.scraped_at.format("%Y-%m-%d %H:%M:%S UTC"),
            entry.title,
            entry.url
        );
    }

    println!("\nTotal: {} entries", entries.len());

    Ok(())
}

fn cmd_strategies() -> Result<()> {
    let config = PipelineConfig::from_env().map_err(|e| anyhow::anyhow!(e))?;

    for (i, strategy) in catalogue(&config).iter().enumerate() {
        println!(
            "{:>2}. {:<16} timeout {:>5.1}s  min length {}",
            i + 1,
            strategy.name,
            strategy.timeout.as_secs_f64(),
            strategy.min_length
        );
    }

    Ok(())
}

/// Prints one line per layer transition to stderr.
struct StderrProgress {
    quiet: bool,
}

impl ProgressReporter for StderrProgress {
    fn report(&self, snapshot: ProgressSnapshot) {
        if self.quiet {
            return;
        }
        if let Some(line) = progress_line(&snapshot) {
            eprintln!("{line}");
        }
    }
}

/// Render the latest transition, e.g. `[3/8] codetabs ... failed`.
fn progress_line(layers: &[LayerStatus]) -> Option<String> {
    let layer = layers
        .iter()
        .rev()
        .find(|l| l.state != LayerState::Pending)?;
    Some(format!(
        "[{}/{}] {} ... {}",
        layer.index,
        layers.len(),
        layer.name,
        layer.state
    ))
}
