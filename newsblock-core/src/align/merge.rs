//! Key join of two block tables with explicit collision rules.
//!
//! Both sides usually carry `Date` and `Interval_4h` next to the join key.
//! Instead of suffixing the clashing copies, a [`MergeConfig`] names which
//! side each shared column comes from.

use crate::domain::{TimeBlock, TIME_BLOCK};
use crate::error::Result;
use crate::frame::{column_names, require_column, require_non_empty, string_values};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

const JOIN_KEY: &str = "__join_key";
const KEPT_ROW: &str = "__kept_row";
const OTHER_ROW: &str = "__other_row";

/// Which side's rows are all kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinKind {
    #[default]
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    #[default]
    Left,
    Right,
}

/// Take `column` from `side` when both tables have it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnPreference {
    pub column: String,
    pub side: Side,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Join key column, present in both tables.
    pub key: String,
    pub how: JoinKind,
    /// Collision rules. Shared columns not listed here come from the left.
    pub prefer: Vec<ColumnPreference>,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            key: TIME_BLOCK.to_string(),
            how: JoinKind::Left,
            prefer: Vec::new(),
        }
    }
}

impl MergeConfig {
    pub fn new(how: JoinKind) -> Self {
        Self {
            how,
            ..Self::default()
        }
    }

    pub fn preferring(mut self, column: impl Into<String>, side: Side) -> Self {
        self.prefer.push(ColumnPreference {
            column: column.into(),
            side,
        });
        self
    }

    pub fn side_for(&self, column: &str) -> Side {
        self.prefer
            .iter()
            .find(|p| p.column == column)
            .map(|p| p.side)
            .unwrap_or(Side::Left)
    }
}

/// Block keys are canonicalised so hyphen and en-dash spellings match.
fn canonical_key(raw: String) -> String {
    match TimeBlock::parse_key(&raw) {
        Ok(block) => block.key(),
        Err(_) => raw,
    }
}

/// `df` without the `drop` columns, plus the canonical join key and the
/// original row position. Null keys stay null and never match.
fn keyed(
    df: &DataFrame,
    what: &str,
    key: &str,
    drop: &[String],
    row_column: &str,
) -> Result<LazyFrame> {
    let keys: Vec<Option<String>> = string_values(df, what, key)?
        .into_iter()
        .map(|k| k.map(canonical_key))
        .collect();
    let keep: Vec<String> = column_names(df)
        .into_iter()
        .filter(|c| !drop.contains(c))
        .collect();

    let mut frame = df.select(keep)?;
    frame.with_column(Series::new(JOIN_KEY.into(), keys))?;
    Ok(frame.with_row_index(row_column.into(), None)?.lazy())
}

/// Join `left` and `right` on `config.key`. Both tables must be non-empty.
///
/// Output columns are the left columns followed by the right-only columns.
/// Every row of the retained side appears, in its original order, once per
/// matching row of the other side (or once with nulls if nothing matches).
pub fn merge_tables(
    left: &DataFrame,
    right: &DataFrame,
    config: &MergeConfig,
) -> Result<DataFrame> {
    require_non_empty(left, "left")?;
    require_non_empty(right, "right")?;
    require_column(left, "left", &config.key)?;
    require_column(right, "right", &config.key)?;

    let left_names = column_names(left);
    let right_names = column_names(right);

    // Each shared column is taken from exactly one side.
    let mut drop_left = Vec::new();
    let mut drop_right = Vec::new();
    for name in left_names.iter().filter(|n| right_names.contains(n)) {
        let side = if *name == config.key {
            match config.how {
                JoinKind::Left => Side::Left,
                JoinKind::Right => Side::Right,
            }
        } else {
            config.side_for(name)
        };
        match side {
            Side::Left => drop_right.push(name.clone()),
            Side::Right => drop_left.push(name.clone()),
        }
    }
    let output: Vec<String> = left_names
        .iter()
        .chain(right_names.iter().filter(|n| !left_names.contains(n)))
        .cloned()
        .collect();

    let (left_row, right_row) = match config.how {
        JoinKind::Left => (KEPT_ROW, OTHER_ROW),
        JoinKind::Right => (OTHER_ROW, KEPT_ROW),
    };
    let lhs = keyed(left, "left", &config.key, &drop_left, left_row)?;
    let rhs = keyed(right, "right", &config.key, &drop_right, right_row)?;
    let (kept, other) = match config.how {
        JoinKind::Left => (lhs, rhs),
        JoinKind::Right => (rhs, lhs),
    };

    let joined = kept
        .left_join(other, col(JOIN_KEY), col(JOIN_KEY))
        .sort(
            [KEPT_ROW, OTHER_ROW],
            SortMultipleOptions::default()
                .with_maintain_order(true)
                .with_nulls_last(true),
        )
        .collect()?;
    let unmatched = joined.column(OTHER_ROW)?.null_count();
    let merged = joined.select(output)?;

    tracing::debug!(
        how = ?config.how,
        left = left.height(),
        right = right.height(),
        rows = merged.height(),
        unmatched,
        "merged tables on {}",
        config.key
    );
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DATE, INTERVAL_4H};
    use crate::error::PipelineError;

    fn text(df: &DataFrame, column: &str, row: usize) -> Option<String> {
        df.column(column)
            .unwrap()
            .str()
            .unwrap()
            .get(row)
            .map(str::to_string)
    }

    fn articles() -> DataFrame {
        df!(
            "Time_Block" => &["2024-01-02 08:00–12:00", "2024-01-02 12:00–16:00"],
            "Date" => &["article-date", "article-date"],
            "Title" => &["a", "b"],
        )
        .unwrap()
    }

    fn prices() -> DataFrame {
        df!(
            "Time_Block" => &["2024-01-02 08:00–12:00"],
            "Date" => &["price-date"],
            "AAPL_Close" => &[185.0],
        )
        .unwrap()
    }

    #[test]
    fn unlisted_collision_keeps_left_without_suffixes() {
        let merged = merge_tables(&articles(), &prices(), &MergeConfig::default()).unwrap();

        assert_eq!(
            column_names(&merged),
            ["Time_Block", "Date", "Title", "AAPL_Close"]
        );
        assert_eq!(merged.height(), 2);
        assert_eq!(text(&merged, DATE, 0).as_deref(), Some("article-date"));
        let close = merged.column("AAPL_Close").unwrap().f64().unwrap();
        assert_eq!(close.get(0), Some(185.0));
        assert_eq!(close.get(1), None);
    }

    #[test]
    fn preference_picks_right_copy() {
        let config = MergeConfig::default().preferring(DATE, Side::Right);
        let merged = merge_tables(&articles(), &prices(), &config).unwrap();
        assert_eq!(text(&merged, DATE, 0).as_deref(), Some("price-date"));
        // No right row for the second block: strict preference leaves null.
        assert_eq!(text(&merged, DATE, 1), None);
    }

    #[test]
    fn right_join_keeps_every_right_row_in_order() {
        let calendar = df!(
            "Date" => &["2024-01-02", "2024-01-02", "2024-01-02"],
            "Interval_4h" => &["04:00–08:00", "08:00–12:00", "12:00–16:00"],
            "Time_Block" => &[
                "2024-01-02 04:00–08:00",
                "2024-01-02 08:00–12:00",
                "2024-01-02 12:00–16:00",
            ],
        )
        .unwrap();
        let config = MergeConfig::new(JoinKind::Right)
            .preferring(DATE, Side::Right)
            .preferring(INTERVAL_4H, Side::Right);
        let merged = merge_tables(&articles(), &calendar, &config).unwrap();

        assert_eq!(
            column_names(&merged),
            ["Time_Block", "Date", "Title", "Interval_4h"]
        );
        assert_eq!(merged.height(), 3);
        assert_eq!(
            text(&merged, "Time_Block", 0).as_deref(),
            Some("2024-01-02 04:00–08:00")
        );
        assert_eq!(text(&merged, "Title", 0), None);
        assert_eq!(text(&merged, "Title", 1).as_deref(), Some("a"));
        assert_eq!(text(&merged, DATE, 2).as_deref(), Some("2024-01-02"));
    }

    #[test]
    fn duplicate_keys_multiply_rows() {
        let key = "2024-01-02 08:00–12:00";
        let left = df!("Time_Block" => &[key, key], "n" => &[1i64, 2]).unwrap();
        let right = df!("Time_Block" => &[key, key], "m" => &[10i64, 20]).unwrap();

        let merged = merge_tables(&left, &right, &MergeConfig::default()).unwrap();
        let n = merged.column("n").unwrap().i64().unwrap();
        let m = merged.column("m").unwrap().i64().unwrap();
        let pairs: Vec<(Option<i64>, Option<i64>)> = n.into_iter().zip(m.into_iter()).collect();
        assert_eq!(
            pairs,
            [
                (Some(1), Some(10)),
                (Some(1), Some(20)),
                (Some(2), Some(10)),
                (Some(2), Some(20)),
            ]
        );
    }

    #[test]
    fn hyphen_and_en_dash_keys_match() {
        let left = df!("Time_Block" => &["2024-01-02 08:00-12:00"]).unwrap();
        let merged = merge_tables(&left, &prices(), &MergeConfig::default()).unwrap();
        assert_eq!(
            merged.column("AAPL_Close").unwrap().f64().unwrap().get(0),
            Some(185.0)
        );
        // The retained side's spelling is kept.
        assert_eq!(
            text(&merged, "Time_Block", 0).as_deref(),
            Some("2024-01-02 08:00-12:00")
        );
    }

    #[test]
    fn null_keys_never_match() {
        let left = df!("Time_Block" => &[None::<&str>], "n" => &[1i64]).unwrap();
        let right = df!("Time_Block" => &[None::<&str>], "m" => &[2i64]).unwrap();
        let merged = merge_tables(&left, &right, &MergeConfig::default()).unwrap();
        assert_eq!(merged.height(), 1);
        assert_eq!(merged.column("m").unwrap().i64().unwrap().get(0), None);
    }

    #[test]
    fn missing_key_column_is_an_error() {
        let left = df!("Date" => &["2024-01-02"]).unwrap();
        assert!(matches!(
            merge_tables(&left, &prices(), &MergeConfig::default()),
            Err(PipelineError::MissingColumn { table, column }) if table == "left" && column == "Time_Block"
        ));
    }

    #[test]
    fn empty_inputs_are_rejected() {
        let empty = df!(
            "Time_Block" => Vec::<&str>::new(),
            "Date" => Vec::<&str>::new(),
        )
        .unwrap();

        for (left, right, side) in [
            (&empty, &prices(), "left"),
            (&articles(), &empty, "right"),
            (&empty, &empty, "left"),
        ] {
            assert!(matches!(
                merge_tables(left, right, &MergeConfig::default()),
                Err(PipelineError::EmptySource(t)) if t == side
            ));
        }
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: MergeConfig = serde_json::from_str(
            r#"{"how":"right","prefer":[{"column":"Date","side":"right"}]}"#,
        )
        .unwrap();
        assert_eq!(config.key, "Time_Block");
        assert_eq!(config.how, JoinKind::Right);
        assert_eq!(config.side_for("Date"), Side::Right);
        assert_eq!(config.side_for("Title"), Side::Left);
    }
}
