//! Multi-entity series merge onto a common timeline.
//!
//! Given price series for several entities, produce one wide table with a
//! `Timestamp` column over the union of all timestamps and five
//! `{label}_{Field}` columns per entity. An entity without a bar at a
//! timestamp gets nulls there (no forward-fill of price data).

use super::provider::{EntitySeries, PriceBar};
use super::schema::OhlcvField;
use crate::error::{PipelineError, Result};
use crate::frame::datetime_series;
use chrono::NaiveDateTime;
use polars::prelude::*;
use std::collections::{BTreeSet, HashMap};

pub const TIMESTAMP: &str = "Timestamp";

fn field_value(bar: &PriceBar, field: OhlcvField) -> Option<f64> {
    match field {
        OhlcvField::Open => bar.open,
        OhlcvField::High => bar.high,
        OhlcvField::Low => bar.low,
        OhlcvField::Close => bar.close,
        OhlcvField::Volume => bar.volume,
    }
}

/// Outer-merge entity series on timestamp, ascending.
///
/// Entities keep the order they are given in. Duplicate timestamps within
/// one series keep the last bar.
pub fn merge_series(series: &[EntitySeries]) -> Result<DataFrame> {
    if series.is_empty() {
        return Err(PipelineError::EmptySource("series".into()));
    }

    let timeline: Vec<NaiveDateTime> = series
        .iter()
        .flat_map(|s| s.bars.iter().map(|b| b.timestamp))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut columns: Vec<Column> = Vec::with_capacity(1 + 5 * series.len());
    columns.push(datetime_series(TIMESTAMP, &timeline)?.into());
    for s in series {
        let lookup: HashMap<NaiveDateTime, &PriceBar> =
            s.bars.iter().map(|b| (b.timestamp, b)).collect();
        for field in OhlcvField::ALL {
            let values: Vec<Option<f64>> = timeline
                .iter()
                .map(|ts| lookup.get(ts).and_then(|bar| field_value(bar, field)))
                .collect();
            columns.push(Column::new(field.column_for(&s.label).into(), values));
        }
    }

    Ok(DataFrame::new(columns)?)
}
