//! Parquet table reader/writer backed by polars.
//!
//! Column types round-trip natively: `Date` and `Datetime` columns written
//! by this crate or by other tools load as such, and the transforms read
//! them without going through text.

use crate::error::Result;
use polars::prelude::*;
use std::path::Path;

pub fn write_parquet(df: &DataFrame, path: &Path) -> Result<()> {
    let mut df = df.clone();
    let file = std::fs::File::create(path)?;
    ParquetWriter::new(file).finish(&mut df)?;
    Ok(())
}

pub fn read_parquet(path: &Path) -> Result<DataFrame> {
    let df = LazyFrame::scan_parquet(path, Default::default())?.collect()?;
    Ok(df)
}
