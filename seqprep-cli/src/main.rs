//! SeqPrep CLI — prepare and cache management commands.
//!
//! Commands:
//! - `prepare`: resolve a ticker's daily history (Yahoo Finance, then the
//!   local cache), then resample, standardize, and split as requested
//! - `cache status`: report cached tickers and their date ranges

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use seqprep_core::data::{CsvCache, SourceResolver, YahooSource};
use seqprep_core::export::write_file;
use seqprep_core::{prepare, DegeneratePolicy, FrequencySetting, PrepConfig, PrepSummary};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "seqprep",
    about = "SeqPrep CLI — turn daily OHLCV history into model-ready data"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch (or load from cache) a ticker's history and prepare it.
    Prepare(PrepareArgs),
    /// Cache management commands.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(clap::Args)]
struct PrepareArgs {
    /// Ticker symbol (e.g., SPY). Optional when --config names one.
    ticker: Option<String>,

    /// Start date (YYYY-MM-DD), inclusive.
    #[arg(long)]
    start: Option<String>,

    /// End date (YYYY-MM-DD), inclusive.
    #[arg(long)]
    end: Option<String>,

    /// Standardize every column to zero mean and unit variance.
    #[arg(long, default_value_t = false)]
    normalize: bool,

    /// Resample frequency: daily, weekly, monthly, quarterly, annual, or 1-5.
    #[arg(long)]
    frequency: Option<String>,

    /// Split into train (<= date) and test (> date) tensors.
    #[arg(long)]
    split_date: Option<String>,

    /// What to do with a zero-variance column when normalizing.
    #[arg(long, value_enum)]
    degenerate: Option<DegenerateArg>,

    /// Path to a TOML config file. Explicit flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Cache directory. Defaults to ./data.
    #[arg(long, default_value = "data")]
    cache_dir: PathBuf,

    /// Offline mode: read the cache only, no network access.
    #[arg(long, default_value_t = false)]
    offline: bool,

    /// Write the prepared rows to a .parquet or .csv file.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Print the summary as JSON.
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum DegenerateArg {
    Error,
    ZeroFill,
}

impl From<DegenerateArg> for DegeneratePolicy {
    fn from(arg: DegenerateArg) -> Self {
        match arg {
            DegenerateArg::Error => DegeneratePolicy::Error,
            DegenerateArg::ZeroFill => DegeneratePolicy::ZeroFill,
        }
    }
}

#[derive(Subcommand)]
enum CacheAction {
    /// Report cached date ranges and row counts for the given tickers.
    Status {
        /// Tickers to check (e.g., SPY QQQ).
        #[arg(required = true)]
        tickers: Vec<String>,

        /// Cache directory. Defaults to ./data.
        #[arg(long, default_value = "data")]
        cache_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Prepare(args) => run_prepare(args),
        Commands::Cache { action } => match action {
            CacheAction::Status { tickers, cache_dir } => run_cache_status(&tickers, &cache_dir),
        },
    }
}

/// Layer explicit flags over the config file (or defaults).
fn build_config(args: &PrepareArgs) -> Result<PrepConfig> {
    let mut config = match &args.config {
        Some(path) => PrepConfig::from_file(path)?,
        None => PrepConfig::default(),
    };

    if let Some(ticker) = &args.ticker {
        config.ticker = ticker.clone();
    }
    if let Some(start) = &args.start {
        config.start = start.clone();
    }
    if let Some(end) = &args.end {
        config.end = end.clone();
    }
    if args.normalize {
        config.normalize = true;
    }
    if let Some(frequency) = &args.frequency {
        config.frequency = Some(FrequencySetting::Name(frequency.clone()));
    }
    if let Some(split_date) = &args.split_date {
        config.split = true;
        config.split_date = Some(split_date.clone());
    }
    if let Some(policy) = args.degenerate {
        config.degenerate = policy.into();
    }

    if config.ticker.trim().is_empty() {
        bail!("a ticker is required (positional argument or `ticker` in --config)");
    }
    if config.start.is_empty() || config.end.is_empty() {
        bail!("--start and --end are required unless --config provides them");
    }
    Ok(config)
}

fn run_prepare(args: PrepareArgs) -> Result<()> {
    let config = build_config(&args)?;
    let plan = config.validate()?;

    let cache = CsvCache::new(&args.cache_dir);
    let yahoo = if args.offline {
        None
    } else {
        Some(YahooSource::new().context("failed to build HTTP client")?)
    };
    let mut resolver = SourceResolver::new(&cache);
    if let Some(source) = &yahoo {
        resolver = resolver.with_source(source);
    }

    let prepared = prepare(&resolver, &plan)?;

    if let Some(path) = &args.output {
        write_file(&prepared.rows, path)?;
        info!(path = %path.display(), rows = prepared.rows.len(), "wrote prepared rows");
    }

    let summary = prepared.summary();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn run_cache_status(tickers: &[String], cache_dir: &Path) -> Result<()> {
    if !cache_dir.exists() {
        println!("Cache directory does not exist: {}", cache_dir.display());
        return Ok(());
    }

    let cache = CsvCache::new(cache_dir);
    let refs: Vec<&str> = tickers.iter().map(|t| t.as_str()).collect();

    println!("Cache: {}", cache.cache_dir().display());
    println!();
    println!("{:<8} {:<25} {:>10}", "Ticker", "Date Range", "Rows");
    println!("{}", "-".repeat(45));
    for status in cache.status(&refs) {
        let (range, rows) = match (status.cached, status.start_date, status.end_date) {
            (false, _, _) => ("(not cached)".to_string(), String::new()),
            (true, Some(start), Some(end)) => (
                format!("{start} to {end}"),
                status.row_count.map(|n| n.to_string()).unwrap_or_default(),
            ),
            (true, _, _) => ("(no meta)".to_string(), String::new()),
        };
        println!("{:<8} {:<25} {:>10}", status.ticker, range, rows);
    }

    Ok(())
}

fn print_summary(summary: &PrepSummary) {
    println!();
    println!("=== Prepared Data ===");
    println!("Ticker:         {}", summary.ticker);
    println!("Source:         {}", summary.source);
    println!("Rows:           {}", summary.rows);
    if let (Some(first), Some(last)) = (summary.first_date, summary.last_date) {
        println!("Period:         {first} to {last}");
    }
    match summary.frequency {
        Some(frequency) => println!("Frequency:      {frequency}"),
        None => println!("Frequency:      daily (as fetched)"),
    }
    println!("Normalized:     {}", if summary.normalized { "yes" } else { "no" });
    if let Some(split) = &summary.split {
        println!();
        println!("--- Split at {} ---", split.split_date);
        println!("X_train:        {:?}", split.x_train_shape);
        println!("y_train:        [{}]", split.y_train_len);
        println!("X_test:         {:?}", split.x_test_shape);
        println!("y_test:         [{}]", split.y_test_len);
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> PrepareArgs {
        match Cli::parse_from(args).command {
            Commands::Prepare(a) => a,
            Commands::Cache { .. } => panic!("expected prepare"),
        }
    }

    #[test]
    fn flags_build_a_config() {
        let args = parse(&[
            "seqprep",
            "prepare",
            "SPY",
            "--start",
            "2020-01-01",
            "--end",
            "2020-12-31",
            "--normalize",
            "--frequency",
            "weekly",
            "--split-date",
            "2020-06-30",
            "--degenerate",
            "zero-fill",
        ]);
        let config = build_config(&args).unwrap();
        assert_eq!(config.ticker, "SPY");
        assert!(config.normalize);
        assert!(config.split);
        assert_eq!(config.degenerate, DegeneratePolicy::ZeroFill);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_dates_rejected() {
        let args = parse(&["seqprep", "prepare", "SPY"]);
        assert!(build_config(&args).is_err());
    }
}
