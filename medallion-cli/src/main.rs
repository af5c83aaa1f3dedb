//! Medallion CLI: run batches and re-run single pipeline stages.
//!
//! Commands:
//! - `run`: extract → Bronze → Silver → Gold for a list of tickers
//! - `silver`: rebuild Silver from a Bronze object (latest one by default)
//! - `gold`: rebuild Gold from Silver objects (all of a ticker's by default)
//! - `list`: list stored objects under a key prefix

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{Duration, NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::prelude::*;

use medallion_core::data::{CsvSource, MarketDataSource, SyntheticSource};
use medallion_core::domain::DateRange;
use medallion_core::storage::keys::{is_silver_table_key, ticker_prefix, BRONZE, SILVER};
use medallion_core::storage::{latest_key, ObjectStore};
use medallion_pipeline::{Pipeline, PipelineConfig};

#[derive(Parser)]
#[command(name = "medallion", about = "Medallion: Bronze/Silver/Gold market data pipeline")]
struct Cli {
    /// Path to a TOML config file. `MEDALLION_*` variables override it.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum SourceKind {
    /// Deterministic random walk per ticker.
    Synthetic,
    /// `<TICKER>.csv` files in --csv-dir.
    Csv,
}

#[derive(Subcommand)]
enum Commands {
    /// Process tickers through every stage and print the batch report.
    Run {
        /// Tickers to process (e.g., SPY QQQ AAPL).
        #[arg(required = true)]
        tickers: Vec<String>,

        /// Start date (YYYY-MM-DD). Defaults to one year ago.
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        end: Option<String>,

        /// Process tickers one at a time.
        #[arg(long, default_value_t = false)]
        sequential: bool,

        #[arg(long, value_enum, default_value = "synthetic")]
        source: SourceKind,

        /// Directory of CSV files for `--source csv`.
        #[arg(long, default_value = "data")]
        csv_dir: PathBuf,
    },
    /// Rebuild the Silver objects of a ticker from one Bronze object.
    Silver {
        ticker: String,

        /// Bronze key. Defaults to the most recent Bronze object of the ticker.
        #[arg(long)]
        bronze_key: Option<String>,
    },
    /// Rebuild the Gold objects of a ticker.
    Gold {
        ticker: String,

        /// Silver keys. Defaults to every Silver table of the ticker.
        #[arg(long)]
        silver_key: Vec<String>,
    },
    /// List stored objects under a key prefix.
    List {
        #[arg(default_value = "")]
        prefix: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = PipelineConfig::load(cli.config.as_deref()).context("loading configuration")?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.observability.log_level.as_str().into()),
        )
        .init();

    let pipeline = Pipeline::from_config(config);

    match cli.command {
        Commands::Run {
            tickers,
            start,
            end,
            sequential,
            source,
            csv_dir,
        } => run_batch(&pipeline, tickers, start, end, !sequential, source, csv_dir),
        Commands::Silver { ticker, bronze_key } => run_silver(&pipeline, &ticker, bronze_key),
        Commands::Gold { ticker, silver_key } => run_gold(&pipeline, &ticker, silver_key),
        Commands::List { prefix } => run_list(&pipeline, &prefix),
    }
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("invalid date '{s}', expected YYYY-MM-DD"))
}

fn run_batch(
    pipeline: &Pipeline,
    tickers: Vec<String>,
    start: Option<String>,
    end: Option<String>,
    parallel: bool,
    source: SourceKind,
    csv_dir: PathBuf,
) -> Result<()> {
    let today = Utc::now().date_naive();
    let end = match end {
        Some(s) => parse_date(&s)?,
        None => today,
    };
    let start = match start {
        Some(s) => parse_date(&s)?,
        None => end - Duration::days(365),
    };
    let range = DateRange::new(start, end)?;

    let source: Arc<dyn MarketDataSource> = match source {
        SourceKind::Synthetic => Arc::new(SyntheticSource::new()),
        SourceKind::Csv => {
            if !csv_dir.is_dir() {
                bail!("CSV directory {} does not exist", csv_dir.display());
            }
            Arc::new(CsvSource::new(csv_dir))
        }
    };

    info!(tickers = tickers.len(), %start, %end, parallel, source = source.name(), "running batch");
    let report = pipeline.orchestrator(source).run(&tickers, range, parallel)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn run_silver(pipeline: &Pipeline, ticker: &str, bronze_key: Option<String>) -> Result<()> {
    let bronze_key = match bronze_key {
        Some(k) => k,
        None => match latest_key(pipeline.store().as_ref(), &ticker_prefix(BRONZE, ticker))? {
            Some(k) => k,
            None => bail!("no Bronze objects for {ticker}"),
        },
    };
    let out = pipeline.silver().process(ticker, &bronze_key)?;
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn run_gold(pipeline: &Pipeline, ticker: &str, silver_keys: Vec<String>) -> Result<()> {
    let keys = if silver_keys.is_empty() {
        pipeline
            .store()
            .list(&ticker_prefix(SILVER, ticker))?
            .into_iter()
            .map(|m| m.key)
            .filter(|k| is_silver_table_key(k))
            .collect()
    } else {
        silver_keys
    };
    if keys.is_empty() {
        bail!("no Silver objects for {ticker}");
    }
    let out = pipeline.gold().aggregate(ticker, &keys)?;
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn run_list(pipeline: &Pipeline, prefix: &str) -> Result<()> {
    let entries = pipeline.store().list(prefix)?;
    for meta in &entries {
        println!("{}  {}", meta.last_modified.format("%Y-%m-%d %H:%M:%S"), meta.key);
    }
    println!("{} object(s)", entries.len());
    Ok(())
}
