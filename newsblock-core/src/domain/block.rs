//! TimeBlock: a (date, 4h interval) pair and its string join key.

use super::interval::Interval4h;
use crate::error::PipelineError;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single 4-hour bucket on a calendar day.
///
/// Field order makes the derived `Ord` chronological: date first, then the
/// categorical interval order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeBlock {
    pub date: NaiveDate,
    pub interval: Interval4h,
}

impl TimeBlock {
    pub fn new(date: NaiveDate, interval: Interval4h) -> Self {
        Self { date, interval }
    }

    pub fn of(ts: NaiveDateTime) -> Self {
        Self::new(ts.date(), Interval4h::classify(ts))
    }

    /// Join key: `"{YYYY-MM-DD} {label}"`, e.g. `2024-01-02 16:00–20:00`.
    pub fn key(&self) -> String {
        format!("{} {}", self.date.format("%Y-%m-%d"), self.interval.label())
    }

    pub fn parse_key(key: &str) -> Result<Self, PipelineError> {
        let (date, label) = key
            .trim()
            .split_once(' ')
            .ok_or_else(|| PipelineError::InvalidBlockKey(key.to_string()))?;
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|_| PipelineError::InvalidBlockKey(key.to_string()))?;
        let interval = Interval4h::parse_label(label)
            .map_err(|_| PipelineError::InvalidBlockKey(key.to_string()))?;
        Ok(Self::new(date, interval))
    }
}

impl fmt::Display for TimeBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.date.format("%Y-%m-%d"), self.interval)
    }
}

impl FromStr for TimeBlock {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_key(s)
    }
}
