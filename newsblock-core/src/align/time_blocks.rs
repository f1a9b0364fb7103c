//! Article time-block transform.
//!
//! Buckets each article, lays the articles over a dense calendar of every
//! block on every article date, and numbers the blocks. Blocks without any
//! article still get one row (with `Article_Count = 0`), so downstream models
//! see quiet periods.

use super::assign::assign_blocks;
use super::calendar::{calendar_table, dense_calendar};
use super::merge::{merge_tables, JoinKind, MergeConfig, Side};
use crate::domain::{TimeBlock, DATE, INTERVAL_4H, TIME_BLOCK};
use crate::error::{PipelineError, Result};
use crate::frame::{has_column, move_to_front, require_non_empty, string_values};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeBlockConfig {
    /// Article timestamp column.
    pub timestamp_column: String,
    /// Per-block article count column written by the transform.
    pub count_column: String,
    /// 1-based chronological block number column.
    pub ordinal_column: String,
    /// Integer columns whose nulls (empty blocks) become 0, when present.
    pub zero_fill: Vec<String>,
    /// Articles (left) onto the calendar (right).
    pub merge: MergeConfig,
}

impl Default for TimeBlockConfig {
    fn default() -> Self {
        Self {
            timestamp_column: "Timestamp".into(),
            count_column: "Article_Count".into(),
            ordinal_column: "Time_Block_Count".into(),
            zero_fill: vec!["Article_Number".into()],
            merge: MergeConfig::new(JoinKind::Right)
                .preferring(DATE, Side::Right)
                .preferring(INTERVAL_4H, Side::Right)
                .preferring("Article_Count", Side::Right),
        }
    }
}

impl TimeBlockConfig {
    /// The ordinal, interval and count columns must be distinct.
    fn check_outputs(&self) -> Result<()> {
        let outputs = [
            self.ordinal_column.as_str(),
            INTERVAL_4H,
            self.count_column.as_str(),
        ];
        for (i, name) in outputs.iter().enumerate() {
            if outputs[..i].contains(name) {
                return Err(PipelineError::ColumnConflict(name.to_string()));
            }
        }
        Ok(())
    }
}

/// Bucket articles and expand them onto the dense block calendar.
///
/// Output columns: the ordinal column, `Interval_4h`, the count column, then
/// the article columns (with `Date` and `Time_Block`) in their original
/// order. Rows are in calendar order; articles sharing a block keep their
/// input order.
pub fn time_block_transform(
    articles: &DataFrame,
    config: &TimeBlockConfig,
) -> Result<DataFrame> {
    config.check_outputs()?;
    require_non_empty(articles, "articles")?;

    let mut annotated = articles.clone();
    let blocks = assign_blocks(&mut annotated, &config.timestamp_column)?;

    let calendar = dense_calendar(blocks.iter().map(|b| b.date));
    let mut counts: HashMap<TimeBlock, i64> = HashMap::new();
    for block in &blocks {
        *counts.entry(*block).or_default() += 1;
    }

    let mut calendar_rows = calendar_table(blocks.iter().map(|b| b.date))?;
    let block_counts: Vec<i64> = calendar
        .iter()
        .map(|b| counts.get(b).copied().unwrap_or(0))
        .collect();
    calendar_rows.with_column(Series::new(config.count_column.as_str().into(), block_counts))?;

    let mut merged = merge_tables(&annotated, &calendar_rows, &config.merge)?;

    let ordinals: HashMap<String, i64> = calendar
        .iter()
        .zip(1..)
        .map(|(b, n)| (b.key(), n))
        .collect();
    let block_ordinals: Vec<Option<i64>> = string_values(&merged, "time blocks", TIME_BLOCK)?
        .into_iter()
        .map(|key| {
            let block = TimeBlock::parse_key(&key?).ok()?;
            ordinals.get(&block.key()).copied()
        })
        .collect();
    merged.with_column(Series::new(config.ordinal_column.as_str().into(), block_ordinals))?;

    let fills: Vec<Expr> = config
        .zero_fill
        .iter()
        .filter(|c| has_column(&merged, c))
        .map(|c| col(c.as_str()).cast(DataType::Int64).fill_null(lit(0i64)))
        .collect();
    if !fills.is_empty() {
        merged = merged.lazy().with_columns(fills).collect()?;
    }

    let out = move_to_front(
        &merged,
        &[
            config.ordinal_column.as_str(),
            INTERVAL_4H,
            config.count_column.as_str(),
        ],
    )?;

    let empty_blocks = calendar.len() - counts.len();
    tracing::debug!(
        articles = articles.height(),
        blocks = calendar.len(),
        empty_blocks,
        rows = out.height(),
        "expanded articles onto block calendar"
    );
    Ok(out)
}
