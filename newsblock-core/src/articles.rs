//! Article preparation: text selection, de-duplication, numbering and
//! timestamps for scraped news exports.

use crate::data::timestamp::{parse_time_of_day, parse_timestamp_str};
use crate::error::{PipelineError, Result};
use crate::frame::{
    datetime_series, has_column, require_column, require_non_empty, series, string_values,
};
use chrono::NaiveDateTime;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const TEXT: &str = "Text";
pub const ARTICLE_NUMBER: &str = "Article_Number";
pub const TIMESTAMP: &str = "Timestamp";

const SOURCE_ROW: &str = "__source_row";

/// Column names of the scraped article export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArticleConfig {
    pub text_column: String,
    /// Used where the full text is missing.
    pub fallback_text_column: String,
    pub date_column: String,
    pub time_column: String,
    pub title_column: String,
    pub sentiment_column: String,
    pub source_column: String,
    /// Drop rows without text and merge rows with identical text.
    pub deduplicate: bool,
}

impl Default for ArticleConfig {
    fn default() -> Self {
        Self {
            text_column: "Article_Text".into(),
            fallback_text_column: "Article body (partial)".into(),
            date_column: "Publish date".into(),
            time_column: "Publish time".into(),
            title_column: "Article title".into(),
            sentiment_column: "Sentiment".into(),
            source_column: "Source title".into(),
            deduplicate: true,
        }
    }
}

/// Optional columns of the export that are present in `raw`.
struct Present<'a> {
    title: Option<&'a str>,
    sentiment: Option<&'a str>,
    source: Option<&'a str>,
}

impl<'a> Present<'a> {
    fn resolve(raw: &DataFrame, config: &'a ArticleConfig) -> Result<Self> {
        if !has_column(raw, &config.text_column) && !has_column(raw, &config.fallback_text_column)
        {
            return Err(PipelineError::missing_column("articles", &config.text_column));
        }
        require_column(raw, "articles", &config.date_column)?;
        require_column(raw, "articles", &config.time_column)?;
        let optional = |name: &'a String| has_column(raw, name).then_some(name.as_str());
        Ok(Self {
            title: optional(&config.title_column),
            sentiment: optional(&config.sentiment_column),
            source: optional(&config.source_column),
        })
    }
}

/// Primary text, else the fallback; null when both are empty.
fn text_values(raw: &DataFrame, config: &ArticleConfig) -> Result<Vec<Option<String>>> {
    let column = |name: &str| -> Result<Vec<Option<String>>> {
        if has_column(raw, name) {
            string_values(raw, "articles", name)
        } else {
            Ok(vec![None; raw.height()])
        }
    };
    let primary = column(&config.text_column)?;
    let fallback = column(&config.fallback_text_column)?;
    Ok(primary
        .into_iter()
        .zip(fallback)
        .map(|(text, fallback)| text.or(fallback))
        .collect())
}

/// `date + " " + time` as a naive timestamp.
fn publish_timestamp(
    date: Option<&str>,
    time: Option<&str>,
    config: &ArticleConfig,
    row: usize,
) -> Result<NaiveDateTime> {
    let day = date.and_then(parse_timestamp_str).map(|ts| ts.date());
    let clock = time.and_then(parse_time_of_day);
    match (day, clock) {
        (Some(day), Some(clock)) => Ok(day.and_time(clock)),
        _ => Err(PipelineError::UnparseableTimestamp {
            column: format!("{} + {}", config.date_column, config.time_column),
            row,
            value: format!("{} {}", date.unwrap_or_default(), time.unwrap_or_default()),
        }),
    }
}

/// Sorted unique values of each list cell, joined with `"; "`.
fn join_sources(lists: &ListChunked) -> Result<Vec<Option<String>>> {
    let mut joined = Vec::with_capacity(lists.len());
    for item in lists.into_iter() {
        let mut unique = BTreeSet::new();
        if let Some(values) = item {
            let values = values.cast(&DataType::String)?;
            for v in values.str()?.into_iter().flatten() {
                let v = v.trim();
                if !v.is_empty() {
                    unique.insert(v.to_string());
                }
            }
        }
        let unique: Vec<String> = unique.into_iter().collect();
        joined.push((!unique.is_empty()).then(|| unique.join("; ")));
    }
    Ok(joined)
}

/// Prepare a scraped article table for bucketing.
///
/// Adds `Text` (primary text with fallback) and `Timestamp` (publish date
/// and time). With `deduplicate`, rows without text are dropped, rows with
/// identical text are merged (first date, time and title; mean sentiment;
/// sorted unique source titles joined with `"; "`), the result is sorted by
/// publish time and numbered `Article_Number` from 1. Otherwise every input
/// row is kept in input order with all its columns.
pub fn prepare_articles(raw: &DataFrame, config: &ArticleConfig) -> Result<DataFrame> {
    require_non_empty(raw, "articles")?;
    let present = Present::resolve(raw, config)?;
    let texts = text_values(raw, config)?;

    if !config.deduplicate {
        return keep_all(raw, texts, config);
    }

    let dropped = texts.iter().filter(|t| t.is_none()).count();
    if dropped > 0 {
        tracing::warn!(dropped, "dropped articles without text");
    }

    let mut frame = raw.with_row_index(SOURCE_ROW.into(), None)?;
    frame.with_column(Series::new(TEXT.into(), texts))?;

    let mut aggs = vec![
        col(SOURCE_ROW).first(),
        col(config.date_column.as_str()).drop_nulls().first(),
        col(config.time_column.as_str()).drop_nulls().first(),
    ];
    if let Some(title) = present.title {
        aggs.push(col(title).drop_nulls().first());
    }
    if let Some(sentiment) = present.sentiment {
        aggs.push(col(sentiment).cast(DataType::Float64).mean());
    }
    if let Some(source) = present.source {
        aggs.push(col(source).drop_nulls());
    }

    let mut grouped = frame
        .lazy()
        .filter(col(TEXT).is_not_null())
        .group_by_stable([col(TEXT)])
        .agg(aggs)
        .collect()?;
    if grouped.height() == 0 {
        return Err(PipelineError::EmptySource("articles (with text)".into()));
    }

    let source_rows: Vec<Option<IdxSize>> =
        series(&grouped, "articles", SOURCE_ROW)?.idx()?.into_iter().collect();
    let dates = string_values(&grouped, "articles", &config.date_column)?;
    let times = string_values(&grouped, "articles", &config.time_column)?;
    let mut stamps = Vec::with_capacity(grouped.height());
    for ((row, date), time) in source_rows.into_iter().zip(&dates).zip(&times) {
        let row = row.unwrap_or_default() as usize;
        stamps.push(publish_timestamp(date.as_deref(), time.as_deref(), config, row)?);
    }
    grouped.with_column(datetime_series(TIMESTAMP, &stamps)?)?;
    if let Some(source) = present.source {
        let joined = join_sources(series(&grouped, "articles", source)?.list()?)?;
        grouped.with_column(Series::new(source.into(), joined))?;
    }

    let mut prepared = grouped
        .lazy()
        .sort(
            [TIMESTAMP],
            SortMultipleOptions::default().with_maintain_order(true),
        )
        .collect()?;
    let numbers: Vec<i64> = (1..=prepared.height() as i64).collect();
    prepared.with_column(Series::new(ARTICLE_NUMBER.into(), numbers))?;

    let mut columns = vec![ARTICLE_NUMBER, TIMESTAMP];
    columns.extend(present.title);
    columns.push(TEXT);
    columns.extend(present.sentiment);
    columns.extend(present.source);
    let prepared = prepared.select(columns)?;

    tracing::info!(
        input = raw.height(),
        articles = prepared.height(),
        merged = raw.height() - dropped - prepared.height(),
        "prepared articles"
    );
    Ok(prepared)
}

fn keep_all(
    raw: &DataFrame,
    texts: Vec<Option<String>>,
    config: &ArticleConfig,
) -> Result<DataFrame> {
    let dates = string_values(raw, "articles", &config.date_column)?;
    let times = string_values(raw, "articles", &config.time_column)?;
    let stamps = dates
        .iter()
        .zip(&times)
        .enumerate()
        .map(|(row, (date, time))| {
            publish_timestamp(date.as_deref(), time.as_deref(), config, row)
        })
        .collect::<Result<Vec<_>>>()?;

    let mut out = raw.clone();
    out.with_column(Series::new(TEXT.into(), texts))?;
    out.with_column(datetime_series(TIMESTAMP, &stamps)?)?;
    tracing::info!(articles = out.height(), "prepared articles (keep all)");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::column_names;

    const HEADERS: [&str; 7] = [
        "Article title",
        "Article_Text",
        "Article body (partial)",
        "Publish date",
        "Publish time",
        "Sentiment",
        "Source title",
    ];

    /// Text columns as a CSV export reads them: empty fields are null.
    fn scraped(rows: &[[&str; 7]]) -> DataFrame {
        let columns = HEADERS
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let values: Vec<Option<&str>> = rows
                    .iter()
                    .map(|r| Some(r[i]).filter(|v| !v.is_empty()))
                    .collect();
                Column::new((*name).into(), values)
            })
            .collect();
        DataFrame::new(columns).unwrap()
    }

    fn sample() -> DataFrame {
        scraped(&[
            ["Fed holds", "Rates unchanged.", "", "2024-01-02", "14:30", "0.5", "Reuters"],
            ["Chip rally", "", "Chips up...", "2024-01-02", "09:05", "0.25", "Bloomberg"],
            ["Fed holds!", "Rates unchanged.", "", "2024-01-02", "15:00", "-0.5", "AP"],
            ["Empty", "", "", "2024-01-03", "10:00", "0.1", "Blog"],
            ["Fed holds", "Rates unchanged.", "", "2024-01-02", "16:00", "", "Reuters"],
        ])
    }

    fn text(df: &DataFrame, column: &str, row: usize) -> Option<String> {
        string_values(df, "test", column).unwrap().swap_remove(row)
    }

    fn stamp(df: &DataFrame, row: usize) -> NaiveDateTime {
        crate::data::timestamp_column(df, TIMESTAMP).unwrap()[row]
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn duplicates_merge_and_rows_are_numbered_by_time() {
        let out = prepare_articles(&sample(), &ArticleConfig::default()).unwrap();

        assert_eq!(
            column_names(&out),
            [
                "Article_Number",
                "Timestamp",
                "Article title",
                "Text",
                "Sentiment",
                "Source title"
            ]
        );
        assert_eq!(out.height(), 2);
        let numbers = out.column("Article_Number").unwrap().i64().unwrap();

        // Fallback body, earliest publish time.
        assert_eq!(numbers.get(0), Some(1));
        assert_eq!(text(&out, "Text", 0).as_deref(), Some("Chips up..."));
        assert_eq!(stamp(&out, 0), at(9, 5));

        assert_eq!(numbers.get(1), Some(2));
        assert_eq!(text(&out, "Article title", 1).as_deref(), Some("Fed holds"));
        assert_eq!(stamp(&out, 1), at(14, 30));
        assert_eq!(
            out.column("Sentiment").unwrap().f64().unwrap().get(1),
            Some(0.0)
        );
        assert_eq!(text(&out, "Source title", 1).as_deref(), Some("AP; Reuters"));
    }

    #[test]
    fn keep_all_preserves_rows_and_order() {
        let config = ArticleConfig {
            deduplicate: false,
            ..ArticleConfig::default()
        };
        let out = prepare_articles(&sample(), &config).unwrap();

        assert_eq!(out.height(), 5);
        assert_eq!(out.width(), 9);
        assert_eq!(text(&out, "Article title", 2).as_deref(), Some("Fed holds!"));
        assert_eq!(text(&out, "Text", 3), None);
        assert_eq!(text(&out, "Text", 1).as_deref(), Some("Chips up..."));
        assert_eq!(stamp(&out, 4), at(16, 0));
        assert!(!has_column(&out, "Article_Number"));
    }

    #[test]
    fn unparseable_publish_time_is_fatal() {
        let table = scraped(&[["t", "body", "", "2024-01-02", "teatime", "", ""]]);
        assert!(matches!(
            prepare_articles(&table, &ArticleConfig::default()),
            Err(PipelineError::UnparseableTimestamp { row: 0, .. })
        ));
    }

    #[test]
    fn missing_text_columns_are_reported() {
        let table = df!("Publish date" => &["2024-01-02"], "Publish time" => &["10:00"]).unwrap();
        let err = prepare_articles(&table, &ArticleConfig::default()).unwrap_err();
        assert!(err.to_string().contains("Article_Text"));
    }

    #[test]
    fn no_text_anywhere_is_empty() {
        let table = scraped(&[["t", "", "", "2024-01-02", "10:00", "", ""]]);
        assert!(matches!(
            prepare_articles(&table, &ArticleConfig::default()),
            Err(PipelineError::EmptySource(_))
        ));
    }
}
