//! Local CSV series provider: one `{dir}/{TICKER}.csv` per entity.
//!
//! Accepts the usual vendor header spellings: `Timestamp`/`Datetime`/`Date`
//! for the time column and `open`, `Open` or `1. open` for prices.

use super::csv_io::read_csv;
use super::provider::{EntitySeries, EntitySpec, FetchError, PriceBar, SeriesProvider};
use super::schema::OhlcvField;
use super::timestamp::timestamp_column;
use crate::error::PipelineError;
use crate::frame::{column_names, float_values};
use polars::prelude::DataFrame;
use std::path::{Path, PathBuf};

const TIME_HEADERS: &[&str] = &["timestamp", "datetime", "date", "time"];

pub struct CsvDirectoryProvider {
    dir: PathBuf,
}

impl CsvDirectoryProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn series_path(&self, ticker: &str) -> PathBuf {
        self.dir.join(format!("{ticker}.csv"))
    }
}

impl SeriesProvider for CsvDirectoryProvider {
    fn name(&self) -> &str {
        "csv-directory"
    }

    fn fetch(&self, entity: &EntitySpec) -> Result<EntitySeries, FetchError> {
        let path = self.series_path(&entity.ticker);
        if !path.is_file() {
            return Err(FetchError::NotFound {
                ticker: entity.ticker.clone(),
            });
        }
        let table = read_csv(&path)?;
        let bars = bars_from_table(&table, &entity.ticker)?;
        Ok(EntitySeries {
            label: entity.label.clone(),
            ticker: entity.ticker.clone(),
            bars,
        })
    }
}

/// Strip vendor numbering (`"1. open"` → `"open"`) and lowercase.
fn normalize_header(header: &str) -> String {
    let h = header.trim().to_ascii_lowercase();
    match h.split_once(". ") {
        Some((num, rest)) if !num.is_empty() && num.chars().all(|c| c.is_ascii_digit()) => {
            rest.trim().to_string()
        }
        _ => h,
    }
}

fn field_for_header(normalized: &str) -> Option<OhlcvField> {
    OhlcvField::ALL
        .into_iter()
        .find(|f| f.suffix().eq_ignore_ascii_case(normalized))
}

/// Convert a single-entity price table into bars sorted by time.
pub fn bars_from_table(df: &DataFrame, ticker: &str) -> Result<Vec<PriceBar>, FetchError> {
    let malformed = |reason: String| FetchError::Malformed {
        ticker: ticker.to_string(),
        reason,
    };
    let names = column_names(df);
    let normalized: Vec<String> = names.iter().map(|c| normalize_header(c)).collect();

    let time_column = TIME_HEADERS
        .iter()
        .find_map(|h| normalized.iter().position(|n| n == h))
        .map(|i| names[i].as_str())
        .ok_or_else(|| malformed("no timestamp column".into()))?;

    let mut fields: [Option<Vec<Option<f64>>>; 5] = Default::default();
    for (slot, field) in fields.iter_mut().zip(OhlcvField::ALL) {
        if let Some(i) = normalized
            .iter()
            .position(|n| field_for_header(n) == Some(field))
        {
            *slot = Some(float_values(df, ticker, &names[i])?);
        }
    }
    if fields.iter().all(Option::is_none) {
        return Err(malformed("no open/high/low/close/volume columns".into()));
    }
    if df.height() == 0 {
        return Err(FetchError::Empty {
            ticker: ticker.to_string(),
        });
    }

    let stamps = timestamp_column(df, time_column).map_err(|e| match e {
        PipelineError::UnparseableTimestamp { row, value, .. } => {
            malformed(format!("unparseable timestamp '{value}' at row {row}"))
        }
        other => FetchError::Table(other),
    })?;

    let value = |field: usize, row: usize| fields[field].as_ref().and_then(|v| v[row]);
    let mut bars: Vec<PriceBar> = stamps
        .into_iter()
        .enumerate()
        .map(|(row, timestamp)| PriceBar {
            timestamp,
            open: value(0, row),
            high: value(1, row),
            low: value(2, row),
            close: value(3, row),
            volume: value(4, row),
        })
        .collect();
    bars.sort_by_key(|b| b.timestamp);
    Ok(bars)
}
