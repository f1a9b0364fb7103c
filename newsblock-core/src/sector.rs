//! Sector return panel: one `Date, Sector, Return` row per sector per period.

use crate::data::schema::{detect_ohlcv_columns, find_column, OhlcvField};
use crate::data::timestamp::timestamp_column;
use crate::error::{PipelineError, Result};
use crate::frame::{column_names, datetime_series, float_values, require_non_empty, series};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

pub const SECTOR: &str = "Sector";
pub const RETURN: &str = "Return";

const ORDER: &str = "__order";

/// A named sector and the ticker that tracks it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sector {
    pub name: String,
    pub ticker: String,
}

impl Sector {
    pub fn new(name: impl Into<String>, ticker: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ticker: ticker.into(),
        }
    }

    /// The SPDR select sector ETFs.
    pub fn spdr_defaults() -> Vec<Sector> {
        [
            ("Financials", "XLF"),
            ("Technology", "XLK"),
            ("Energy", "XLE"),
            ("Health Care", "XLV"),
            ("Consumer Discretionary", "XLY"),
            ("Utilities", "XLU"),
            ("Real Estate", "XLRE"),
            ("Industrials", "XLI"),
            ("Materials", "XLB"),
            ("Consumer Staples", "XLP"),
            ("Communication Services", "XLC"),
        ]
        .into_iter()
        .map(|(name, ticker)| Sector::new(name, ticker))
        .collect()
    }
}

/// Long panel of period-over-period close returns.
///
/// Rows are ordered by `date_col` (stable) before returns are taken. For each
/// sector, null closes are skipped and the first remaining observation has no
/// return and is dropped, as is any period whose previous close is 0. Sectors
/// appear in the given order; one whose ticker has no `{TICKER}_Close` column
/// is skipped with a warning.
pub fn sector_panel(df: &DataFrame, date_col: &str, sectors: &[Sector]) -> Result<DataFrame> {
    require_non_empty(df, "sector closes")?;
    let stamps = timestamp_column(df, date_col)?;
    let original: Vec<Expr> = column_names(df).iter().map(|c| col(c.as_str())).collect();

    let mut keyed = df.clone();
    keyed.with_column(datetime_series(ORDER, &stamps)?)?;
    let sorted = keyed
        .lazy()
        .sort([ORDER], SortMultipleOptions::default().with_maintain_order(true))
        .select(original)
        .collect()?;
    let ohlcv = detect_ohlcv_columns(&sorted);

    let mut rows: Vec<IdxSize> = Vec::new();
    let mut names: Vec<&str> = Vec::new();
    let mut returns: Vec<f64> = Vec::new();
    let mut used = 0usize;
    for sector in sectors {
        let Some(close) = find_column(&ohlcv, &sector.ticker, OhlcvField::Close) else {
            tracing::warn!(
                sector = %sector.name,
                ticker = %sector.ticker,
                "no close column for sector ticker, skipping"
            );
            continue;
        };
        used += 1;

        let mut previous: Option<f64> = None;
        for (row, close) in float_values(&sorted, "sector closes", &close.name)?
            .into_iter()
            .enumerate()
        {
            let Some(close) = close else {
                continue;
            };
            if let Some(prev) = previous.filter(|p| *p != 0.0) {
                rows.push(row as IdxSize);
                names.push(sector.name.as_str());
                returns.push((close - prev) / prev);
            }
            previous = Some(close);
        }
    }

    if used == 0 {
        return Err(PipelineError::EmptySource("sector closes".into()));
    }

    let picked = IdxCa::from_vec("rows".into(), rows);
    let dates = series(&sorted, "sector closes", date_col)?.take(&picked)?;
    let panel = DataFrame::new(vec![
        dates.into(),
        Column::new(SECTOR.into(), names),
        Column::new(RETURN.into(), returns),
    ])?;
    tracing::debug!(sectors = used, rows = panel.height(), "built sector panel");
    Ok(panel)
}
