//! Dense block calendar: every date × all six intervals.

use crate::domain::{Interval4h, TimeBlock, DATE, INTERVAL_4H, TIME_BLOCK};
use crate::error::Result;
use crate::frame::date_series;
use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::BTreeSet;

const INTERVAL_ORDINAL: &str = "__interval_ordinal";

/// Six blocks per distinct date, chronological. Duplicate dates collapse.
pub fn dense_calendar(dates: impl IntoIterator<Item = NaiveDate>) -> Vec<TimeBlock> {
    dates
        .into_iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .flat_map(|date| Interval4h::ALL.map(|interval| TimeBlock::new(date, interval)))
        .collect()
}

/// The dense calendar as a `Date`, `Interval_4h`, `Time_Block` frame: the
/// distinct dates cross-joined with the six intervals, in block order.
pub fn calendar_table(dates: impl IntoIterator<Item = NaiveDate>) -> Result<DataFrame> {
    let days: BTreeSet<NaiveDate> = dates.into_iter().collect();
    let blocks = dense_calendar(days.iter().copied());

    let day_frame = DataFrame::new(vec![date_series(DATE, days.iter().copied().map(Some))?.into()])?;
    let interval_frame = df!(
        INTERVAL_4H => Interval4h::ALL.map(Interval4h::label),
        INTERVAL_ORDINAL => Interval4h::ALL.map(|i| i.ordinal() as u32),
    )?;

    let mut calendar = day_frame
        .lazy()
        .cross_join(interval_frame.lazy(), None)
        .sort(
            [DATE, INTERVAL_ORDINAL],
            SortMultipleOptions::default().with_maintain_order(true),
        )
        .select([col(DATE), col(INTERVAL_4H)])
        .collect()?;

    // Rows are now in `dense_calendar` order.
    let keys: Vec<String> = blocks.iter().map(TimeBlock::key).collect();
    calendar.with_column(Series::new(TIME_BLOCK.into(), keys))?;
    Ok(calendar)
}
