//! Structured errors for table transforms.
//!
//! Every failure here is fatal for the step that raised it.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("missing required column '{column}' in {table}")]
    MissingColumn { table: String, column: String },

    #[error("unparseable timestamp in column '{column}' at row {row}: '{value}'")]
    UnparseableTimestamp {
        column: String,
        row: usize,
        value: String,
    },

    #[error("{0} table is empty")]
    EmptySource(String),

    #[error("hour {0} is outside 0..24")]
    InvalidHour(u32),

    #[error("unknown 4h interval label '{0}'")]
    UnknownInterval(String),

    #[error("invalid block key '{0}'")]
    InvalidBlockKey(String),

    #[error("column '{0}' is configured for two different outputs")]
    ColumnConflict(String),

    #[error("no OHLCV columns (suffix _Open/_High/_Low/_Close/_Volume) found in {0}")]
    NoOhlcvColumns(String),

    #[error("unsupported table format for '{0}' (expected .csv or .parquet)")]
    UnsupportedFormat(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
}

impl PipelineError {
    pub fn missing_column(table: &str, column: &str) -> Self {
        Self::MissingColumn {
            table: table.to_string(),
            column: column.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
