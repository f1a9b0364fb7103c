//! Newsblock Core: 4-hour time bucketing and alignment of news and price tables.
//!
//! This crate contains the pure table transforms:
//! - Domain types (4h intervals, time blocks)
//! - DataFrame I/O (CSV, Parquet), timestamp parsing, OHLCV column schema
//! - Per-entity price series providers and the multi-entity series merge
//! - Block assignment, dense calendars, OHLCV aggregation, keyed merges
//! - Article preparation and the sector return panel
//!
//! Nothing here touches configuration files or decides output paths; the
//! runner crate does that.

pub mod align;
pub mod articles;
pub mod data;
pub mod domain;
pub mod error;
pub mod frame;
pub mod sector;

pub use align::{bucket_and_align, AlignConfig};
pub use error::{PipelineError, Result};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: the public types can move to a worker thread.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::TimeBlock>();
        require_sync::<domain::TimeBlock>();
        require_send::<domain::Interval4h>();
        require_sync::<domain::Interval4h>();

        require_send::<AlignConfig>();
        require_sync::<AlignConfig>();
        require_send::<articles::ArticleConfig>();
        require_sync::<articles::ArticleConfig>();
        require_send::<sector::Sector>();
        require_sync::<sector::Sector>();

        require_send::<PipelineError>();
        require_sync::<PipelineError>();
        require_send::<data::FetchError>();
        require_sync::<data::FetchError>();
        require_send::<data::EntitySeries>();
        require_sync::<data::EntitySeries>();
    }
}
