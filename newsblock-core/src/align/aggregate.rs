//! OHLCV downsampling into 4h blocks.

use super::assign::assign_blocks;
use crate::data::schema::{entities_with_open, find_column, require_ohlcv_columns, OhlcvField};
use crate::domain::{DATE, INTERVAL_4H, TIME_BLOCK};
use crate::error::Result;
use crate::frame::{float_values, require_non_empty};
use polars::prelude::*;

/// `(close - open) / open`; null when either side is missing or open is 0.
fn block_return(open: Option<f64>, close: Option<f64>) -> Option<f64> {
    match (open, close) {
        (Some(o), Some(c)) if o != 0.0 => Some((c - o) / o),
        _ => None,
    }
}

/// Group a wide price table into 4h blocks.
///
/// Rows are ordered by timestamp (stable) before grouping, so `First`/`Last`
/// follow time rather than file order. Output has one row per observed
/// block, chronological, with columns `Time_Block`, the OHLCV columns in
/// source order, `Date`, `Interval_4h` and, when `with_returns` is set, one
/// `{ENTITY}_Return` per entity that has both an open and a close column.
pub fn aggregate_blocks(
    prices: &DataFrame,
    timestamp_col: &str,
    with_returns: bool,
) -> Result<DataFrame> {
    require_non_empty(prices, "prices")?;
    let ohlcv = require_ohlcv_columns(prices, "prices")?;

    let mut annotated = prices.clone();
    assign_blocks(&mut annotated, timestamp_col)?;

    let mut aggs: Vec<Expr> = ohlcv
        .iter()
        .map(|c| c.field.agg_rule().expr(&c.name))
        .collect();
    aggs.push(col(DATE).first());
    aggs.push(col(INTERVAL_4H).first());

    let mut blocks = annotated
        .lazy()
        .sort(
            [timestamp_col],
            SortMultipleOptions::default().with_maintain_order(true),
        )
        .group_by_stable([col(TIME_BLOCK)])
        .agg(aggs)
        .collect()?;

    if with_returns {
        for entity in entities_with_open(&ohlcv) {
            let (Some(open), Some(close)) = (
                find_column(&ohlcv, &entity, OhlcvField::Open),
                find_column(&ohlcv, &entity, OhlcvField::Close),
            ) else {
                continue;
            };
            let opens = float_values(&blocks, "prices", &open.name)?;
            let closes = float_values(&blocks, "prices", &close.name)?;
            let returns: Vec<Option<f64>> = opens
                .into_iter()
                .zip(closes)
                .map(|(o, c)| block_return(o, c))
                .collect();
            blocks.with_column(Series::new(format!("{entity}_Return").into(), returns))?;
        }
    }

    tracing::debug!(
        rows = prices.height(),
        blocks = blocks.height(),
        entities = entities_with_open(&ohlcv).len(),
        "aggregated price table into 4h blocks"
    );
    Ok(blocks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::frame::has_column;

    fn prices(rows: &[(&str, f64, f64, f64, f64, f64)]) -> DataFrame {
        df!(
            "Timestamp" => rows.iter().map(|r| r.0).collect::<Vec<_>>(),
            "AAPL_Open" => rows.iter().map(|r| r.1).collect::<Vec<_>>(),
            "AAPL_High" => rows.iter().map(|r| r.2).collect::<Vec<_>>(),
            "AAPL_Low" => rows.iter().map(|r| r.3).collect::<Vec<_>>(),
            "AAPL_Close" => rows.iter().map(|r| r.4).collect::<Vec<_>>(),
            "AAPL_Volume" => rows.iter().map(|r| r.5).collect::<Vec<_>>(),
        )
        .unwrap()
    }

    fn value(df: &DataFrame, column: &str, row: usize) -> Option<f64> {
        df.column(column).unwrap().f64().unwrap().get(row)
    }

    #[test]
    fn one_bucket_uses_standard_downsampling() {
        let table = prices(&[
            ("2024-01-02 12:00:00", 10.0, 12.5, 9.5, 11.0, 100.0),
            ("2024-01-02 13:00:00", 12.0, 13.0, 8.5, 9.0, 200.0),
            ("2024-01-02 15:00:00", 9.0, 14.0, 8.75, 13.0, 300.0),
        ]);
        let agg = aggregate_blocks(&table, "Timestamp", true).unwrap();

        assert_eq!(agg.height(), 1);
        assert_eq!(
            agg.column("Time_Block").unwrap().str().unwrap().get(0),
            Some("2024-01-02 12:00–16:00")
        );
        assert_eq!(value(&agg, "AAPL_Open", 0), Some(10.0));
        assert_eq!(value(&agg, "AAPL_Close", 0), Some(13.0));
        assert_eq!(value(&agg, "AAPL_High", 0), Some(14.0));
        assert_eq!(value(&agg, "AAPL_Low", 0), Some(8.5));
        assert_eq!(value(&agg, "AAPL_Volume", 0), Some(600.0));
        assert_eq!(value(&agg, "AAPL_Return", 0), Some(0.3));
    }

    #[test]
    fn first_and_last_follow_time_not_file_order() {
        let table = prices(&[
            ("2024-01-02 15:00:00", 9.0, 14.0, 8.0, 13.0, 1.0),
            ("2024-01-02 12:00:00", 10.0, 12.0, 9.0, 11.0, 1.0),
        ]);
        let agg = aggregate_blocks(&table, "Timestamp", false).unwrap();
        assert_eq!(value(&agg, "AAPL_Open", 0), Some(10.0));
        assert_eq!(value(&agg, "AAPL_Close", 0), Some(13.0));
        assert!(!has_column(&agg, "AAPL_Return"));
    }

    #[test]
    fn blocks_come_out_chronologically() {
        let table = prices(&[
            ("2024-01-03 01:00:00", 1.0, 1.0, 1.0, 1.0, 1.0),
            ("2024-01-02 21:00:00", 1.0, 1.0, 1.0, 1.0, 1.0),
            ("2024-01-02 04:00:00", 1.0, 1.0, 1.0, 1.0, 1.0),
        ]);
        let agg = aggregate_blocks(&table, "Timestamp", false).unwrap();
        let keys: Vec<&str> = agg
            .column("Time_Block")
            .unwrap()
            .str()
            .unwrap()
            .into_no_null_iter()
            .collect();
        assert_eq!(
            keys,
            [
                "2024-01-02 04:00–08:00",
                "2024-01-02 20:00–00:00",
                "2024-01-03 00:00–04:00"
            ]
        );
    }

    #[test]
    fn text_prices_are_cast_and_nulls_skipped() {
        let table = df!(
            "Timestamp" => &["2024-01-02 12:00:00", "2024-01-02 13:00:00", "2024-01-02 14:00:00"],
            "AAPL_Open" => &[None, Some("2.0"), Some("3.0")],
            "AAPL_Close" => &[Some("4.0"), Some("5.0"), None],
            "AAPL_High" => &[None::<&str>, None, None],
            "AAPL_Volume" => &[None::<&str>, None, None],
        )
        .unwrap();
        let agg = aggregate_blocks(&table, "Timestamp", true).unwrap();

        assert_eq!(value(&agg, "AAPL_Open", 0), Some(2.0));
        assert_eq!(value(&agg, "AAPL_Close", 0), Some(5.0));
        assert_eq!(value(&agg, "AAPL_High", 0), None);
        assert_eq!(value(&agg, "AAPL_Volume", 0), Some(0.0));
        assert_eq!(value(&agg, "AAPL_Return", 0), Some(1.5));
    }

    #[test]
    fn zero_open_has_no_return() {
        assert_eq!(block_return(Some(0.0), Some(1.0)), None);
        assert_eq!(block_return(None, Some(1.0)), None);
    }

    #[test]
    fn price_table_needs_ohlcv_columns() {
        let table = df!("Timestamp" => &["2024-01-02 12:00:00"], "Note" => &[None::<&str>]).unwrap();
        assert!(matches!(
            aggregate_blocks(&table, "Timestamp", true),
            Err(PipelineError::NoOhlcvColumns(_))
        ));
    }

    #[test]
    fn empty_price_table_fails() {
        let table = prices(&[]);
        assert!(matches!(
            aggregate_blocks(&table, "Timestamp", true),
            Err(PipelineError::EmptySource(_))
        ));
    }
}
