//! Pipeline steps: read inputs, run one core transform, save the result.
//!
//! Each step takes explicit input and output paths; nothing is read from or
//! written to a fixed location.

use crate::collect::collect_series;
use crate::config::PipelineConfig;
use crate::export::{save_table, Manifest};
use anyhow::{bail, Context, Result};
use newsblock_core::align::{bucket_and_align, merge_company_blocks, time_block_transform};
use newsblock_core::articles::prepare_articles;
use newsblock_core::data::{
    merge_series, read_table, CsvDirectoryProvider, EntitySpec, FetchProgress,
};
use newsblock_core::sector::sector_panel;
use polars::prelude::DataFrame;
use std::path::Path;

pub const MERGE_SERIES: &str = "merge-series";
pub const PREPARE_ARTICLES: &str = "prepare-articles";
pub const TIME_BLOCKS: &str = "time-blocks";
pub const MERGE_COMPANY: &str = "merge-company";
pub const ALIGN: &str = "align";
pub const SECTOR_PANEL: &str = "sector-panel";

fn load(path: &Path) -> Result<DataFrame> {
    let table = read_table(path).with_context(|| format!("failed to read {}", path.display()))?;
    tracing::debug!(path = %path.display(), rows = table.height(), "loaded table");
    Ok(table)
}

fn save(
    table: &DataFrame,
    output: &Path,
    step: &str,
    config: &PipelineConfig,
) -> Result<Manifest> {
    let hash = config.config_hash().context("failed to hash configuration")?;
    save_table(table, output, step, &hash)
}

/// Collect `{dir}/{TICKER}.csv` for each entity and outer-merge them on
/// `Timestamp`. Entities that fail are skipped; the step fails only when all
/// of them do.
pub fn run_merge_series(
    config: &PipelineConfig,
    dir: &Path,
    entities: &[EntitySpec],
    output: &Path,
    progress: &dyn FetchProgress,
) -> Result<Manifest> {
    if entities.is_empty() {
        bail!("no entities given");
    }
    let provider = CsvDirectoryProvider::new(dir);
    let summary = collect_series(&provider, entities, progress);
    if summary.all_failed() {
        let reasons: Vec<String> = summary
            .errors
            .iter()
            .map(|(entity, e)| format!("{entity}: {e}"))
            .collect();
        bail!("every entity failed: {}", reasons.join("; "));
    }

    let merged = merge_series(&summary.series)?;
    save(&merged, output, MERGE_SERIES, config)
}

/// Select text, merge duplicates and number the scraped articles.
/// `keep_all` overrides the configured de-duplication.
pub fn run_prepare_articles(
    config: &PipelineConfig,
    input: &Path,
    output: &Path,
    keep_all: bool,
) -> Result<Manifest> {
    let raw = load(input)?;
    let mut articles = config.articles.clone();
    articles.deduplicate = articles.deduplicate && !keep_all;
    let prepared = prepare_articles(&raw, &articles)?;
    save(&prepared, output, PREPARE_ARTICLES, config)
}

/// Expand prepared articles onto the dense 4h block calendar.
pub fn run_time_blocks(config: &PipelineConfig, input: &Path, output: &Path) -> Result<Manifest> {
    let articles = load(input)?;
    let blocks = time_block_transform(&articles, &config.time_block_config())?;
    save(&blocks, output, TIME_BLOCKS, config)
}

/// Join 4h-aggregated prices onto article blocks.
pub fn run_merge_company(
    config: &PipelineConfig,
    article_blocks: &Path,
    prices: &Path,
    output: &Path,
) -> Result<Manifest> {
    let blocks = load(article_blocks)?;
    let prices = load(prices)?;
    let merged = merge_company_blocks(&blocks, &prices, &config.company_config())?;
    save(&merged, output, MERGE_COMPANY, config)
}

/// Prepared articles and raw prices to the aligned block table in one go.
pub fn run_align(
    config: &PipelineConfig,
    articles: &Path,
    prices: &Path,
    output: &Path,
) -> Result<Manifest> {
    let articles = load(articles)?;
    let prices = load(prices)?;
    let aligned = bucket_and_align(&articles, &prices, &config.align_config())?;
    save(&aligned, output, ALIGN, config)
}

/// Long `Date, Sector, Return` panel from a table of sector closes.
pub fn run_sector_panel(config: &PipelineConfig, input: &Path, output: &Path) -> Result<Manifest> {
    let closes = load(input)?;
    let panel = sector_panel(&closes, &config.columns.sector_date, &config.sectors)?;
    save(&panel, output, SECTOR_PANEL, config)
}
