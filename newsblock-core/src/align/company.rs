//! Company 4h merge: aggregated prices joined onto article blocks.

use super::aggregate::aggregate_blocks;
use super::merge::{merge_tables, JoinKind, MergeConfig, Side};
use super::sort::sort_by_block;
use crate::domain::{DATE, INTERVAL_4H};
use crate::error::Result;
use crate::frame::require_non_empty;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanyMergeConfig {
    /// Price timestamp column.
    pub timestamp_column: String,
    /// Add `{TICKER}_Return` per block.
    pub returns: bool,
    /// Article blocks (left) with aggregated prices (right).
    pub merge: MergeConfig,
}

impl Default for CompanyMergeConfig {
    fn default() -> Self {
        Self {
            timestamp_column: "Timestamp".into(),
            returns: true,
            merge: MergeConfig::new(JoinKind::Left)
                .preferring(DATE, Side::Left)
                .preferring(INTERVAL_4H, Side::Left),
        }
    }
}

/// Aggregate `prices` into 4h blocks and left-join them onto
/// `article_blocks`, then order by date and interval.
pub fn merge_company_blocks(
    article_blocks: &DataFrame,
    prices: &DataFrame,
    config: &CompanyMergeConfig,
) -> Result<DataFrame> {
    require_non_empty(article_blocks, "article blocks")?;
    let aggregated = aggregate_blocks(prices, &config.timestamp_column, config.returns)?;

    let merged = merge_tables(article_blocks, &aggregated, &config.merge)?;
    let sorted = sort_by_block(&merged, DATE, INTERVAL_4H)?;

    tracing::debug!(
        article_rows = article_blocks.height(),
        price_blocks = aggregated.height(),
        rows = sorted.height(),
        "merged prices onto article blocks"
    );
    Ok(sorted)
}
