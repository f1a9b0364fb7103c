//! Per-entity OHLCV column schema.
//!
//! Wide price tables carry one column per (entity, field), named
//! `{ENTITY}_{Field}`. Suffix matching is case-insensitive so both
//! `AAPL_open` and `S&P 500_Open` are recognised.

use crate::error::{PipelineError, Result};
use crate::frame::column_names;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One of the five OHLCV fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OhlcvField {
    Open,
    High,
    Low,
    Close,
    Volume,
}

/// How a field is downsampled into a coarser bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggRule {
    /// First non-null value in chronological order.
    First,
    Max,
    Min,
    /// Last non-null value in chronological order.
    Last,
    Sum,
}

impl AggRule {
    /// Per-group aggregation of `column`, read as `f64`. An all-null group
    /// sums to zero and is null under every other rule.
    pub fn expr(self, column: &str) -> Expr {
        let values = col(column).cast(DataType::Float64);
        match self {
            Self::First => values.drop_nulls().first(),
            Self::Max => values.max(),
            Self::Min => values.min(),
            Self::Last => values.drop_nulls().last(),
            Self::Sum => values.sum(),
        }
    }
}

impl OhlcvField {
    pub const ALL: [OhlcvField; 5] = [
        OhlcvField::Open,
        OhlcvField::High,
        OhlcvField::Low,
        OhlcvField::Close,
        OhlcvField::Volume,
    ];

    /// Column suffix as written by this crate.
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::High => "High",
            Self::Low => "Low",
            Self::Close => "Close",
            Self::Volume => "Volume",
        }
    }

    pub fn agg_rule(self) -> AggRule {
        match self {
            Self::Open => AggRule::First,
            Self::High => AggRule::Max,
            Self::Low => AggRule::Min,
            Self::Close => AggRule::Last,
            Self::Volume => AggRule::Sum,
        }
    }

    /// `{entity}_{Suffix}`
    pub fn column_for(self, entity: &str) -> String {
        format!("{entity}_{}", self.suffix())
    }

    /// Split a column name into (entity, field) when it carries an OHLCV
    /// suffix.
    pub fn parse_column(column: &str) -> Option<(&str, OhlcvField)> {
        let (entity, suffix) = column.rsplit_once('_')?;
        if entity.is_empty() {
            return None;
        }
        Self::ALL
            .into_iter()
            .find(|f| f.suffix().eq_ignore_ascii_case(suffix))
            .map(|f| (entity, f))
    }
}

/// An OHLCV column found in a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OhlcvColumn {
    pub name: String,
    pub entity: String,
    pub field: OhlcvField,
}

/// Every OHLCV column of a table, in column order.
pub fn detect_ohlcv_columns(df: &DataFrame) -> Vec<OhlcvColumn> {
    column_names(df)
        .into_iter()
        .filter_map(|name| {
            let (entity, field) = OhlcvField::parse_column(&name)?;
            Some(OhlcvColumn {
                entity: entity.to_string(),
                field,
                name,
            })
        })
        .collect()
}

/// Like [`detect_ohlcv_columns`], but a table without any is an error.
pub fn require_ohlcv_columns(df: &DataFrame, what: &str) -> Result<Vec<OhlcvColumn>> {
    let found = detect_ohlcv_columns(df);
    if found.is_empty() {
        return Err(PipelineError::NoOhlcvColumns(what.to_string()));
    }
    Ok(found)
}

/// Entities that have an open column, sorted.
pub fn entities_with_open(columns: &[OhlcvColumn]) -> BTreeSet<String> {
    columns
        .iter()
        .filter(|c| c.field == OhlcvField::Open)
        .map(|c| c.entity.clone())
        .collect()
}

/// The column holding `field` for `entity`, if present.
pub fn find_column<'a>(
    columns: &'a [OhlcvColumn],
    entity: &str,
    field: OhlcvField,
) -> Option<&'a OhlcvColumn> {
    columns.iter().find(|c| c.entity == entity && c.field == field)
}
