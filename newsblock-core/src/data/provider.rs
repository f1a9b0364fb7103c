//! Series provider trait and per-entity fetch errors.
//!
//! A provider hands back one entity's price series at a time. Failures are
//! per entity: the collector logs them and leaves that entity's columns out
//! of the merged table instead of aborting the run.

use crate::error::PipelineError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One price observation. Fields are optional because vendor exports leave
/// holes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: NaiveDateTime,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<f64>,
}

/// A fetched series, labelled with the column prefix it will get in the
/// merged table.
#[derive(Debug, Clone)]
pub struct EntitySeries {
    pub label: String,
    pub ticker: String,
    pub bars: Vec<PriceBar>,
}

/// What to fetch: a ticker and the label used for its columns.
///
/// Parsed from `TICKER` (label = ticker) or `Label=TICKER`, e.g.
/// `S&P 500=^GSPC`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySpec {
    pub label: String,
    pub ticker: String,
}

impl EntitySpec {
    pub fn new(label: impl Into<String>, ticker: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ticker: ticker.into(),
        }
    }
}

impl FromStr for EntitySpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (label, ticker) = match s.split_once('=') {
            Some((label, ticker)) => (label.trim(), ticker.trim()),
            None => (s.trim(), s.trim()),
        };
        if label.is_empty() || ticker.is_empty() {
            return Err(format!("invalid entity '{s}' (expected TICKER or Label=TICKER)"));
        }
        Ok(Self::new(label, ticker))
    }
}

impl fmt::Display for EntitySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.label == self.ticker {
            f.write_str(&self.ticker)
        } else {
            write!(f, "{}={}", self.label, self.ticker)
        }
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("no data for '{ticker}'")]
    NotFound { ticker: String },

    #[error("malformed series for '{ticker}': {reason}")]
    Malformed { ticker: String, reason: String },

    #[error("series for '{ticker}' has no bars")]
    Empty { ticker: String },

    #[error(transparent)]
    Table(#[from] PipelineError),
}

/// A source of per-entity price series.
pub trait SeriesProvider {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    fn fetch(&self, entity: &EntitySpec) -> Result<EntitySeries, FetchError>;
}

/// Progress callback for multi-entity collection.
pub trait FetchProgress {
    fn on_start(&self, entity: &EntitySpec, index: usize, total: usize);

    fn on_complete(
        &self,
        entity: &EntitySpec,
        index: usize,
        total: usize,
        result: Result<usize, &FetchError>,
    );

    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize);
}

/// Progress reporter that emits `tracing` events.
pub struct LogProgress;

impl FetchProgress for LogProgress {
    fn on_start(&self, entity: &EntitySpec, index: usize, total: usize) {
        tracing::info!("[{}/{}] fetching {entity}", index + 1, total);
    }

    fn on_complete(
        &self,
        entity: &EntitySpec,
        _index: usize,
        _total: usize,
        result: Result<usize, &FetchError>,
    ) {
        match result {
            Ok(bars) => tracing::info!(%entity, bars, "fetched"),
            Err(e) => tracing::warn!(%entity, error = %e, "could not fetch, skipping"),
        }
    }

    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize) {
        tracing::info!(succeeded, failed, total, "collection complete");
    }
}
