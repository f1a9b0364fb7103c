//! Interval4h: the six fixed 4-hour windows of a calendar day.

use crate::error::PipelineError;
use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of six half-open 4-hour windows partitioning a day.
///
/// Variant order is the categorical order used for sorting, so the derived
/// `Ord` is chronological within a day. Never sort by label text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Interval4h {
    /// [00:00, 04:00)
    Night,
    /// [04:00, 08:00)
    EarlyMorning,
    /// [08:00, 12:00)
    Morning,
    /// [12:00, 16:00)
    Afternoon,
    /// [16:00, 20:00)
    Evening,
    /// [20:00, 24:00)
    Late,
}

impl Interval4h {
    /// All intervals in categorical order.
    pub const ALL: [Interval4h; 6] = [
        Interval4h::Night,
        Interval4h::EarlyMorning,
        Interval4h::Morning,
        Interval4h::Afternoon,
        Interval4h::Evening,
        Interval4h::Late,
    ];

    /// Bucket for an hour of day. An hour on a boundary belongs to the
    /// bucket starting there (4 → `EarlyMorning`, 20 → `Late`).
    pub fn from_hour(hour: u32) -> Result<Self, PipelineError> {
        match hour {
            0..=3 => Ok(Self::Night),
            4..=7 => Ok(Self::EarlyMorning),
            8..=11 => Ok(Self::Morning),
            12..=15 => Ok(Self::Afternoon),
            16..=19 => Ok(Self::Evening),
            20..=23 => Ok(Self::Late),
            _ => Err(PipelineError::InvalidHour(hour)),
        }
    }

    /// Bucket for a timestamp. Total: `NaiveDateTime::hour()` is always < 24.
    pub fn classify(ts: NaiveDateTime) -> Self {
        Self::ALL[(ts.hour() / 4) as usize]
    }

    /// Zero-based position in the day.
    pub fn ordinal(self) -> usize {
        self as usize
    }

    /// Hour at which the window opens.
    pub fn start_hour(self) -> u32 {
        self.ordinal() as u32 * 4
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Night => "00:00–04:00",
            Self::EarlyMorning => "04:00–08:00",
            Self::Morning => "08:00–12:00",
            Self::Afternoon => "12:00–16:00",
            Self::Evening => "16:00–20:00",
            Self::Late => "20:00–00:00",
        }
    }

    /// Parse a label. Accepts the en-dash form written by this crate and
    /// the ASCII hyphen form produced by hand-edited files.
    pub fn parse_label(label: &str) -> Result<Self, PipelineError> {
        let normalized = label.trim().replace('-', "–");
        Self::ALL
            .into_iter()
            .find(|i| i.label() == normalized)
            .ok_or_else(|| PipelineError::UnknownInterval(label.to_string()))
    }
}

impl fmt::Display for Interval4h {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Interval4h {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_label(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 4, 2)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn boundaries_belong_to_the_bucket_that_starts_there() {
        assert_eq!(Interval4h::from_hour(3).unwrap(), Interval4h::Night);
        assert_eq!(Interval4h::from_hour(4).unwrap(), Interval4h::EarlyMorning);
        assert_eq!(Interval4h::from_hour(8).unwrap(), Interval4h::Morning);
        assert_eq!(Interval4h::from_hour(12).unwrap(), Interval4h::Afternoon);
        assert_eq!(Interval4h::from_hour(16).unwrap(), Interval4h::Evening);
        assert_eq!(Interval4h::from_hour(19).unwrap(), Interval4h::Evening);
        assert_eq!(Interval4h::from_hour(20).unwrap(), Interval4h::Late);
        assert_eq!(Interval4h::from_hour(23).unwrap(), Interval4h::Late);
    }

    #[test]
    fn hour_24_is_rejected() {
        assert!(matches!(
            Interval4h::from_hour(24),
            Err(PipelineError::InvalidHour(24))
        ));
    }

    #[test]
    fn classify_ignores_minutes() {
        assert_eq!(Interval4h::classify(at(3, 59)), Interval4h::Night);
        assert_eq!(Interval4h::classify(at(4, 0)), Interval4h::EarlyMorning);
        assert_eq!(Interval4h::classify(at(23, 59)), Interval4h::Late);
    }

    #[test]
    fn derived_order_is_chronological() {
        let mut sorted = Interval4h::ALL.to_vec();
        sorted.reverse();
        sorted.sort();
        assert_eq!(sorted, Interval4h::ALL.to_vec());
        assert!(Interval4h::Late > Interval4h::Evening);
    }

    #[test]
    fn labels_parse_back_with_either_dash() {
        for interval in Interval4h::ALL {
            assert_eq!(Interval4h::parse_label(interval.label()).unwrap(), interval);
        }
        assert_eq!(
            "20:00-00:00".parse::<Interval4h>().unwrap(),
            Interval4h::Late
        );
        assert!(Interval4h::parse_label("20:00–24:00").is_err());
    }
}
