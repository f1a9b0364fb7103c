//! CSV table reader/writer backed by polars.
//!
//! Every column is read as text, so identifiers like `005930` and literal
//! words like `None` survive a read/write cycle unchanged. Transforms cast
//! the columns they compute on.

use crate::error::Result;
use polars::prelude::*;
use std::io::Write;
use std::path::Path;

/// Layout used for `Datetime` columns on write.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Read a CSV file with a header row. Empty fields read as null.
pub fn read_csv(path: &Path) -> Result<DataFrame> {
    let df = LazyCsvReader::new(path)
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .finish()?
        .collect()?;
    Ok(df)
}

pub fn write_csv(df: &DataFrame, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_csv_to(df, file)
}

pub fn write_csv_to(df: &DataFrame, writer: impl Write) -> Result<()> {
    let mut df = df.clone();
    CsvWriter::new(writer)
        .include_header(true)
        .with_datetime_format(Some(DATETIME_FORMAT.into()))
        .finish(&mut df)?;
    Ok(())
}
