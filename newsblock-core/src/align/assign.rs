//! Annotate rows with their 4h block.

use crate::data::timestamp::timestamp_column;
use crate::domain::{TimeBlock, DATE, INTERVAL_4H, TIME_BLOCK};
use crate::error::Result;
use crate::frame::{date_series, datetime_series};
use polars::prelude::*;

/// Parse `timestamp_col`, rewrite it as a naive `Datetime` column, and set
/// the `Interval_4h`, `Date` and `Time_Block` columns (replacing any
/// existing ones in place). Returns the block of every row, top to bottom.
///
/// A missing or unparseable timestamp fails the whole table.
pub fn assign_blocks(df: &mut DataFrame, timestamp_col: &str) -> Result<Vec<TimeBlock>> {
    let stamps = timestamp_column(df, timestamp_col)?;
    let blocks: Vec<TimeBlock> = stamps.iter().map(|ts| TimeBlock::of(*ts)).collect();

    let labels: Vec<&str> = blocks.iter().map(|b| b.interval.label()).collect();
    let keys: Vec<String> = blocks.iter().map(TimeBlock::key).collect();

    df.with_column(datetime_series(timestamp_col, &stamps)?)?;
    df.with_column(Series::new(INTERVAL_4H.into(), labels))?;
    df.with_column(date_series(DATE, blocks.iter().map(|b| Some(b.date)))?)?;
    df.with_column(Series::new(TIME_BLOCK.into(), keys))?;
    Ok(blocks)
}
