//! Bucketing and alignment of articles and prices on 4h blocks.
//!
//! - [`assign_blocks`] annotates rows with `Interval_4h`, `Date`, `Time_Block`
//! - [`dense_calendar`] enumerates every block on a set of dates
//! - [`aggregate_blocks`] downsamples OHLCV columns into blocks
//! - [`merge_tables`] joins two block tables with explicit collision rules
//! - [`sort_by_block`] orders rows by date then interval
//!
//! [`time_block_transform`] and [`merge_company_blocks`] compose these into
//! the two pipeline stages; [`bucket_and_align`] runs both.

pub mod aggregate;
pub mod assign;
pub mod calendar;
pub mod company;
pub mod merge;
pub mod sort;
pub mod time_blocks;

pub use aggregate::aggregate_blocks;
pub use assign::assign_blocks;
pub use calendar::{calendar_table, dense_calendar};
pub use company::{merge_company_blocks, CompanyMergeConfig};
pub use merge::{merge_tables, ColumnPreference, JoinKind, MergeConfig, Side};
pub use sort::sort_by_block;
pub use time_blocks::{time_block_transform, TimeBlockConfig};

use crate::error::Result;
use crate::frame::require_non_empty;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignConfig {
    pub time_blocks: TimeBlockConfig,
    pub company: CompanyMergeConfig,
}

/// Bucket `articles` onto the dense block calendar and join the 4h-aggregated
/// `prices` onto it. Both tables must be non-empty.
pub fn bucket_and_align(
    articles: &DataFrame,
    prices: &DataFrame,
    config: &AlignConfig,
) -> Result<DataFrame> {
    require_non_empty(articles, "articles")?;
    require_non_empty(prices, "prices")?;

    let blocks = time_block_transform(articles, &config.time_blocks)?;
    let aligned = merge_company_blocks(&blocks, prices, &config.company)?;
    tracing::info!(
        articles = articles.height(),
        prices = prices.height(),
        rows = aligned.height(),
        columns = aligned.width(),
        "aligned articles and prices on 4h blocks"
    );
    Ok(aligned)
}
