//! Timestamp parsing for table columns.
//!
//! Inputs come from vendor exports and hand-maintained spreadsheets, so a
//! small set of common layouts is accepted. Offset-bearing timestamps are
//! made naive by keeping the local wall-clock time and dropping the offset.

use crate::error::{PipelineError, Result};
use crate::frame;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use polars::prelude::*;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%Y-%m-%d %I:%M:%S %p",
    "%Y-%m-%d %I:%M %p",
];

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M", "%I:%M:%S %p", "%I:%M %p"];

pub fn parse_timestamp_str(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.naive_local());
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(ts) = DateTime::parse_from_str(s, fmt) {
            return Some(ts.naive_local());
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ts);
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Parse a time of day (`14:30`, `14:30:00`, `2:30 PM`, or the time part
/// of a full timestamp).
pub fn parse_time_of_day(raw: &str) -> Option<NaiveTime> {
    let s = raw.trim();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(s, fmt).ok())
        .or_else(|| parse_timestamp_str(s).map(|ts| ts.time()))
}

fn from_epoch(value: i64, unit: TimeUnit) -> Option<NaiveDateTime> {
    let ts = match unit {
        TimeUnit::Milliseconds => DateTime::from_timestamp_millis(value)?,
        TimeUnit::Microseconds => DateTime::from_timestamp_micros(value)?,
        TimeUnit::Nanoseconds => DateTime::from_timestamp_nanos(value),
    };
    Some(ts.naive_utc())
}

/// Timestamps of every row of `column`, null where a row is null or does
/// not parse. `Datetime` and `Date` columns are read natively (zoned
/// datetimes as UTC wall-clock time); anything else is parsed as text.
/// The raw text is returned alongside for error reporting.
fn timestamp_values(
    df: &DataFrame,
    column: &str,
) -> Result<Vec<(Option<NaiveDateTime>, String)>> {
    let series = frame::series(df, "table", column)?;
    let values = match series.dtype() {
        DataType::Datetime(unit, _) => {
            let unit = *unit;
            let physical = series.to_physical_repr();
            physical
                .i64()?
                .into_iter()
                .map(|v| (v.and_then(|v| from_epoch(v, unit)), String::new()))
                .collect()
        }
        DataType::Date => {
            let physical = series.to_physical_repr();
            physical
                .i32()?
                .into_iter()
                .map(|v| {
                    let ts = v
                        .and_then(frame::date_from_epoch_days)
                        .and_then(|d| d.and_hms_opt(0, 0, 0));
                    (ts, String::new())
                })
                .collect()
        }
        _ => {
            let text = series.cast(&DataType::String)?;
            text.str()?
                .into_iter()
                .map(|v| {
                    let raw = v.unwrap_or_default();
                    (parse_timestamp_str(raw), raw.to_string())
                })
                .collect()
        }
    };
    Ok(values)
}

/// Parse every row of `column`, failing on the first missing or malformed
/// value.
pub fn timestamp_column(df: &DataFrame, column: &str) -> Result<Vec<NaiveDateTime>> {
    timestamp_values(df, column)?
        .into_iter()
        .enumerate()
        .map(|(row, (ts, raw))| {
            ts.ok_or_else(|| PipelineError::UnparseableTimestamp {
                column: column.to_string(),
                row,
                value: raw,
            })
        })
        .collect()
}

/// Calendar dates of `column`. Null and blank rows stay `None`; any other
/// value that is not a date or timestamp is an error.
pub fn date_column(df: &DataFrame, column: &str) -> Result<Vec<Option<NaiveDate>>> {
    timestamp_values(df, column)?
        .into_iter()
        .enumerate()
        .map(|(row, (ts, raw))| match ts {
            Some(ts) => Ok(Some(ts.date())),
            None if raw.trim().is_empty() => Ok(None),
            None => Err(PipelineError::UnparseableTimestamp {
                column: column.to_string(),
                row,
                value: raw,
            }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn accepts_common_layouts() {
        let expected = ts(2024, 4, 2, 14, 30);
        for raw in [
            "2024-04-02 14:30:00",
            "2024-04-02T14:30:00",
            "2024-04-02 14:30",
            "2024/04/02 14:30",
            "2024-04-02 02:30 PM",
        ] {
            assert_eq!(parse_timestamp_str(raw), Some(expected), "{raw}");
        }
    }

    #[test]
    fn offsets_keep_wall_clock_time() {
        assert_eq!(
            parse_timestamp_str("2024-04-02 09:30:00-04:00"),
            Some(ts(2024, 4, 2, 9, 30))
        );
        assert_eq!(
            parse_timestamp_str("2024-04-02T21:00:00+09:00"),
            Some(ts(2024, 4, 2, 21, 0))
        );
    }

    #[test]
    fn dates_map_to_midnight() {
        assert_eq!(parse_timestamp_str("2024-04-02"), Some(ts(2024, 4, 2, 0, 0)));
    }

    #[test]
    fn garbage_is_rejected() {
        assert_eq!(parse_timestamp_str("yesterday"), None);
        assert_eq!(parse_timestamp_str("   "), None);
    }

    #[test]
    fn timestamp_column_reports_row_and_value() {
        let df = df!("Timestamp" => &["2024-04-02 10:00:00", "not a time"]).unwrap();
        let err = timestamp_column(&df, "Timestamp").unwrap_err();
        match err {
            PipelineError::UnparseableTimestamp { column, row, value } => {
                assert_eq!(column, "Timestamp");
                assert_eq!(row, 1);
                assert_eq!(value, "not a time");
            }
            other => panic!("expected UnparseableTimestamp, got {other:?}"),
        }
    }

    #[test]
    fn native_datetime_and_date_columns_are_read_directly() {
        let stamps = [ts(2024, 4, 2, 14, 30), ts(2024, 4, 3, 23, 59)];
        let df = DataFrame::new(vec![
            frame::datetime_series("Timestamp", &stamps).unwrap().into(),
            frame::date_series("Date", stamps.iter().map(|t| Some(t.date())))
                .unwrap()
                .into(),
        ])
        .unwrap();

        assert_eq!(timestamp_column(&df, "Timestamp").unwrap(), stamps);
        assert_eq!(
            timestamp_column(&df, "Date").unwrap(),
            [ts(2024, 4, 2, 0, 0), ts(2024, 4, 3, 0, 0)]
        );
    }

    #[test]
    fn integer_columns_are_not_timestamps() {
        let df = df!("Timestamp" => &[1_700_000_000i64]).unwrap();
        assert!(matches!(
            timestamp_column(&df, "Timestamp"),
            Err(PipelineError::UnparseableTimestamp { row: 0, .. })
        ));
    }

    #[test]
    fn date_column_keeps_blanks_and_rejects_garbage() {
        let df = df!("Date" => &[Some("2024-01-02"), Some(""), None]).unwrap();
        assert_eq!(
            date_column(&df, "Date").unwrap(),
            [NaiveDate::from_ymd_opt(2024, 1, 2), None, None]
        );

        let bad = df!("Date" => &["soon"]).unwrap();
        assert!(matches!(
            date_column(&bad, "Date"),
            Err(PipelineError::UnparseableTimestamp { .. })
        ));
    }

    #[test]
    fn time_of_day_layouts() {
        let expected = NaiveTime::from_hms_opt(14, 30, 0).unwrap();
        assert_eq!(parse_time_of_day("14:30"), Some(expected));
        assert_eq!(parse_time_of_day("14:30:00"), Some(expected));
        assert_eq!(parse_time_of_day("2:30 PM"), Some(expected));
        assert_eq!(parse_time_of_day("2024-01-02 14:30:00"), Some(expected));
    }
}
