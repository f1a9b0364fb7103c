//! DataFrame helpers shared by the transforms.
//!
//! `what` arguments name the table in error messages ("articles",
//! "prices", ...).

use crate::error::{PipelineError, Result};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use polars::prelude::*;

/// Days from 0001-01-01 (CE) to 1970-01-01, for polars' `Date` encoding.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names().iter().map(|n| n.to_string()).collect()
}

pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_index(name).is_some()
}

pub fn require_column(df: &DataFrame, what: &str, name: &str) -> Result<()> {
    if has_column(df, name) {
        Ok(())
    } else {
        Err(PipelineError::missing_column(what, name))
    }
}

pub fn require_non_empty(df: &DataFrame, what: &str) -> Result<()> {
    if df.height() == 0 {
        return Err(PipelineError::EmptySource(what.to_string()));
    }
    Ok(())
}

/// The named column as a series, or `MissingColumn`.
pub fn series<'a>(df: &'a DataFrame, what: &str, name: &str) -> Result<&'a Series> {
    require_column(df, what, name)?;
    Ok(df.column(name)?.as_materialized_series())
}

/// Values of a column rendered as text. Empty and whitespace-only strings
/// read as null.
pub fn string_values(df: &DataFrame, what: &str, name: &str) -> Result<Vec<Option<String>>> {
    let text = series(df, what, name)?.cast(&DataType::String)?;
    Ok(text
        .str()?
        .into_iter()
        .map(|v| v.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string))
        .collect())
}

/// Values of a column as `f64`. Text that does not parse as a number reads
/// as null.
pub fn float_values(df: &DataFrame, what: &str, name: &str) -> Result<Vec<Option<f64>>> {
    let values = series(df, what, name)?.cast(&DataType::Float64)?;
    Ok(values.f64()?.into_iter().map(|v| v.filter(|x| !x.is_nan())).collect())
}

/// Millisecond-precision naive `Datetime` series.
pub fn datetime_series(name: &str, values: &[NaiveDateTime]) -> Result<Series> {
    let millis: Vec<i64> = values
        .iter()
        .map(|ts| ts.and_utc().timestamp_millis())
        .collect();
    Ok(Series::new(name.into(), millis)
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?)
}

pub fn date_series(
    name: &str,
    values: impl IntoIterator<Item = Option<NaiveDate>>,
) -> Result<Series> {
    let days: Vec<Option<i32>> = values
        .into_iter()
        .map(|d| d.map(|d| d.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE))
        .collect();
    Ok(Series::new(name.into(), days).cast(&DataType::Date)?)
}

pub fn date_from_epoch_days(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)?)
}

/// Reorder columns so `front` comes first, in the given order. Names that
/// are absent are skipped and repeated names are placed once.
pub fn move_to_front(df: &DataFrame, front: &[&str]) -> Result<DataFrame> {
    let mut order: Vec<String> = Vec::with_capacity(df.width());
    for name in front {
        if has_column(df, name) && !order.iter().any(|o| o == name) {
            order.push(name.to_string());
        }
    }
    for name in column_names(df) {
        if !order.contains(&name) {
            order.push(name);
        }
    }
    Ok(df.select(order)?)
}
