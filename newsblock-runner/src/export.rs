//! Table export with a JSON manifest sidecar.
//!
//! Every table a step writes gets `{path}.meta.json` next to it, recording
//! which step produced it, its shape, the block range it covers, and hashes
//! of both the written bytes and the configuration used.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use newsblock_core::data::write_table;
use newsblock_core::domain::{DATE, TIME_BLOCK};
use newsblock_core::frame::{column_names, has_column, string_values};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub step: String,
    pub path: PathBuf,
    pub rows: usize,
    pub columns: usize,
    pub column_names: Vec<String>,
    /// First and last `Time_Block` (or `Date` when there is no block key).
    pub first: Option<String>,
    pub last: Option<String>,
    /// BLAKE3 of the written file.
    pub data_hash: String,
    pub config_hash: String,
    pub created_at: DateTime<Utc>,
}

/// `{path}.meta.json`
pub fn manifest_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".meta.json");
    PathBuf::from(name)
}

fn span(table: &DataFrame) -> (Option<String>, Option<String>) {
    let Some(column) = [TIME_BLOCK, DATE].into_iter().find(|c| has_column(table, c)) else {
        return (None, None);
    };
    let Ok(values) = string_values(table, "output", column) else {
        return (None, None);
    };
    let mut present = values.into_iter().flatten();
    let first = present.next();
    let last = present.last().or_else(|| first.clone());
    (first, last)
}

/// Write `table` to `path` (format by extension) and its manifest next to it.
pub fn save_table(
    table: &DataFrame,
    path: &Path,
    step: &str,
    config_hash: &str,
) -> Result<Manifest> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output dir {}", parent.display()))?;
    }
    write_table(table, path).with_context(|| format!("failed to write {}", path.display()))?;

    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read back {}", path.display()))?;
    let (first, last) = span(table);
    let manifest = Manifest {
        step: step.to_string(),
        path: path.to_path_buf(),
        rows: table.height(),
        columns: table.width(),
        column_names: column_names(table),
        first,
        last,
        data_hash: blake3::hash(&bytes).to_hex().to_string(),
        config_hash: config_hash.to_string(),
        created_at: Utc::now(),
    };

    let meta_path = manifest_path(path);
    let json = serde_json::to_string_pretty(&manifest).context("failed to serialize manifest")?;
    std::fs::write(&meta_path, json)
        .with_context(|| format!("failed to write manifest to {}", meta_path.display()))?;

    tracing::info!(
        step,
        path = %path.display(),
        rows = manifest.rows,
        columns = manifest.columns,
        "wrote table"
    );
    Ok(manifest)
}

/// Read the manifest written next to `path`.
pub fn load_manifest(path: &Path) -> Result<Manifest> {
    let meta_path = manifest_path(path);
    let json = std::fs::read_to_string(&meta_path)
        .with_context(|| format!("failed to read {}", meta_path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("failed to parse {}", meta_path.display()))
}
