//! Chronological ordering of block tables.

use crate::data::timestamp::date_column;
use crate::domain::Interval4h;
use crate::error::Result;
use crate::frame::{column_names, require_column, string_values};
use chrono::Datelike;
use polars::prelude::*;

const NULL_KEY: &str = "__null_block";
const DAY_KEY: &str = "__block_day";
const ORDINAL_KEY: &str = "__block_ordinal";

/// Stable sort by `date_col`, then by the categorical order of
/// `interval_col` (never lexically). Rows with a null date or interval go
/// last in their original order.
///
/// A non-null value that is not a date or an interval label is an error.
pub fn sort_by_block(df: &DataFrame, date_col: &str, interval_col: &str) -> Result<DataFrame> {
    require_column(df, "blocks", date_col)?;
    let dates = date_column(df, date_col)?;
    let labels = string_values(df, "blocks", interval_col)?;

    let mut nulls = Vec::with_capacity(df.height());
    let mut days = Vec::with_capacity(df.height());
    let mut ordinals = Vec::with_capacity(df.height());
    for (date, label) in dates.into_iter().zip(labels) {
        let interval = label.as_deref().map(Interval4h::parse_label).transpose()?;
        match (date, interval) {
            (Some(date), Some(interval)) => {
                nulls.push(false);
                days.push(date.num_days_from_ce());
                ordinals.push(interval.ordinal() as u32);
            }
            _ => {
                nulls.push(true);
                days.push(0);
                ordinals.push(0);
            }
        }
    }

    let original: Vec<Expr> = column_names(df).iter().map(|c| col(c.as_str())).collect();
    let mut keyed = df.clone();
    keyed.with_column(Series::new(NULL_KEY.into(), nulls))?;
    keyed.with_column(Series::new(DAY_KEY.into(), days))?;
    keyed.with_column(Series::new(ORDINAL_KEY.into(), ordinals))?;

    let sorted = keyed
        .lazy()
        .sort(
            [NULL_KEY, DAY_KEY, ORDINAL_KEY],
            SortMultipleOptions::default().with_maintain_order(true),
        )
        .select(original)
        .collect()?;
    Ok(sorted)
}
