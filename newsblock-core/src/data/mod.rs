//! Table ingestion and export, timestamp parsing, OHLCV schema and
//! per-entity price series.

pub mod csv_io;
pub mod csv_provider;
pub mod parquet_io;
pub mod provider;
pub mod schema;
pub mod series;
pub mod timestamp;

pub use csv_provider::CsvDirectoryProvider;
pub use provider::{
    EntitySeries, EntitySpec, FetchError, FetchProgress, LogProgress, PriceBar, SeriesProvider,
};
pub use schema::{detect_ohlcv_columns, AggRule, OhlcvColumn, OhlcvField};
pub use series::merge_series;
pub use timestamp::{date_column, parse_timestamp_str, timestamp_column};

use crate::error::{PipelineError, Result};
use polars::prelude::DataFrame;
use std::path::Path;

/// On-disk table format, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Parquet,
}

impl TableFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("csv") => Ok(Self::Csv),
            Some("parquet") | Some("pq") => Ok(Self::Parquet),
            _ => Err(PipelineError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

pub fn read_table(path: &Path) -> Result<DataFrame> {
    let table = match TableFormat::from_path(path)? {
        TableFormat::Csv => csv_io::read_csv(path)?,
        TableFormat::Parquet => parquet_io::read_parquet(path)?,
    };
    tracing::debug!(
        path = %path.display(),
        rows = table.height(),
        columns = table.width(),
        "loaded table"
    );
    Ok(table)
}

pub fn write_table(table: &DataFrame, path: &Path) -> Result<()> {
    match TableFormat::from_path(path)? {
        TableFormat::Csv => csv_io::write_csv(table, path),
        TableFormat::Parquet => parquet_io::write_parquet(table, path),
    }
}
