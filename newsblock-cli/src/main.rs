//! Newsblock CLI: one command per data-preparation step.
//!
//! Commands:
//! - `merge-series`: outer-merge per-ticker CSV series on `Timestamp`
//! - `prepare-articles`: text fallback, de-duplication, numbering, timestamps
//! - `time-blocks`: expand articles onto the dense 4h block calendar
//! - `merge-company`: join 4h-aggregated prices onto article blocks
//! - `align`: `time-blocks` followed by `merge-company`, in one pass
//! - `sector-panel`: long `Date, Sector, Return` panel from sector closes

use anyhow::Result;
use clap::{Parser, Subcommand};
use newsblock_core::data::{EntitySpec, LogProgress};
use newsblock_runner::{
    manifest_path, run_align, run_merge_company, run_merge_series, run_prepare_articles,
    run_sector_panel, run_time_blocks, Manifest, PipelineConfig,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "newsblock",
    about = "Newsblock: 4-hour time bucketing and alignment of news and price tables"
)]
struct Cli {
    /// Path to a TOML pipeline config. Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level (overridden by RUST_LOG).
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge per-ticker CSV files into one wide table on `Timestamp`.
    MergeSeries {
        /// Directory holding `{TICKER}.csv` files.
        #[arg(long)]
        dir: PathBuf,

        /// Output table (.csv or .parquet).
        #[arg(long)]
        output: PathBuf,

        /// Entities as `TICKER` or `Label=TICKER` (e.g. AAPL "S&P 500=^GSPC").
        #[arg(required = true)]
        entities: Vec<EntitySpec>,
    },
    /// Prepare scraped articles: text fallback, de-duplication, numbering.
    PrepareArticles {
        #[arg(long)]
        input: PathBuf,

        #[arg(long)]
        output: PathBuf,

        /// Keep every row in input order (no drop, no merge).
        #[arg(long, default_value_t = false)]
        keep_all: bool,
    },
    /// Expand prepared articles onto the dense 4h block calendar.
    TimeBlocks {
        #[arg(long)]
        input: PathBuf,

        #[arg(long)]
        output: PathBuf,
    },
    /// Join 4h-aggregated prices onto article blocks.
    MergeCompany {
        /// Article block table (output of `time-blocks`).
        #[arg(long)]
        articles: PathBuf,

        /// Wide price table with `{TICKER}_Open/High/Low/Close/Volume` columns.
        #[arg(long)]
        prices: PathBuf,

        #[arg(long)]
        output: PathBuf,
    },
    /// Bucket prepared articles and align prices in one pass.
    Align {
        /// Prepared article table (output of `prepare-articles`).
        #[arg(long)]
        articles: PathBuf,

        #[arg(long)]
        prices: PathBuf,

        #[arg(long)]
        output: PathBuf,
    },
    /// Build the `Date, Sector, Return` panel from sector closes.
    SectorPanel {
        /// Table with a date column and `{TICKER}_Close` columns.
        #[arg(long)]
        input: PathBuf,

        #[arg(long)]
        output: PathBuf,
    },
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };

    let manifest = match cli.command {
        Commands::MergeSeries {
            dir,
            output,
            entities,
        } => run_merge_series(&config, &dir, &entities, &output, &LogProgress)?,
        Commands::PrepareArticles {
            input,
            output,
            keep_all,
        } => run_prepare_articles(&config, &input, &output, keep_all)?,
        Commands::TimeBlocks { input, output } => run_time_blocks(&config, &input, &output)?,
        Commands::MergeCompany {
            articles,
            prices,
            output,
        } => run_merge_company(&config, &articles, &prices, &output)?,
        Commands::Align {
            articles,
            prices,
            output,
        } => run_align(&config, &articles, &prices, &output)?,
        Commands::SectorPanel { input, output } => run_sector_panel(&config, &input, &output)?,
    };

    print_summary(&manifest);
    Ok(())
}

fn print_summary(manifest: &Manifest) {
    println!();
    println!("=== {} ===", manifest.step);
    println!(
        "Wrote {} rows x {} columns to {}",
        manifest.rows,
        manifest.columns,
        manifest.path.display()
    );
    if let (Some(first), Some(last)) = (&manifest.first, &manifest.last) {
        println!("Range:    {first} .. {last}");
    }
    println!("Data:     {}", manifest.data_hash);
    println!("Config:   {}", manifest.config_hash);
    println!("Manifest: {}", manifest_path(&manifest.path).display());
}
