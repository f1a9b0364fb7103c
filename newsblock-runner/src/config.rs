//! Serializable pipeline configuration.
//!
//! Every field has a default, so an empty TOML file (or none at all) gives
//! the column layout of the scraped-news and hourly-price exports.

use newsblock_core::align::{AlignConfig, CompanyMergeConfig, MergeConfig, TimeBlockConfig};
use newsblock_core::articles::ArticleConfig;
use newsblock_core::sector::Sector;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize config TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("hash config: {0}")]
    Hash(#[from] serde_json::Error),
}

/// Column names shared by several steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnConfig {
    pub article_timestamp: String,
    pub price_timestamp: String,
    pub article_number: String,
    pub article_count: String,
    pub block_ordinal: String,
    /// Date column of the sector close table.
    pub sector_date: String,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            article_timestamp: "Timestamp".into(),
            price_timestamp: "Timestamp".into(),
            article_number: "Article_Number".into(),
            article_count: "Article_Count".into(),
            block_ordinal: "Time_Block_Count".into(),
            sector_date: "Date".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeBlocksSection {
    pub merge: MergeConfig,
}

impl Default for TimeBlocksSection {
    fn default() -> Self {
        Self {
            merge: TimeBlockConfig::default().merge,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanySection {
    pub returns: bool,
    pub merge: MergeConfig,
}

impl Default for CompanySection {
    fn default() -> Self {
        let core = CompanyMergeConfig::default();
        Self {
            returns: core.returns,
            merge: core.merge,
        }
    }
}

/// Configuration for every pipeline step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub columns: ColumnConfig,
    pub time_blocks: TimeBlocksSection,
    pub company: CompanySection,
    pub articles: ArticleConfig,
    /// Sector name and tracking ticker, in output order.
    pub sectors: Vec<Sector>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            columns: ColumnConfig::default(),
            time_blocks: TimeBlocksSection::default(),
            company: CompanySection::default(),
            articles: ArticleConfig::default(),
            sectors: Sector::spdr_defaults(),
        }
    }
}

impl PipelineConfig {
    /// Load a configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Deterministic hash of this configuration (BLAKE3 over its JSON form).
    ///
    /// Recorded in output manifests so two outputs can be checked for having
    /// been produced with the same settings.
    pub fn config_hash(&self) -> Result<String, ConfigError> {
        let json = serde_json::to_vec(self)?;
        Ok(blake3::hash(&json).to_hex().to_string())
    }

    pub fn time_block_config(&self) -> TimeBlockConfig {
        TimeBlockConfig {
            timestamp_column: self.columns.article_timestamp.clone(),
            count_column: self.columns.article_count.clone(),
            ordinal_column: self.columns.block_ordinal.clone(),
            zero_fill: vec![self.columns.article_number.clone()],
            merge: self.time_blocks.merge.clone(),
        }
    }

    pub fn company_config(&self) -> CompanyMergeConfig {
        CompanyMergeConfig {
            timestamp_column: self.columns.price_timestamp.clone(),
            returns: self.company.returns,
            merge: self.company.merge.clone(),
        }
    }

    pub fn align_config(&self) -> AlignConfig {
        AlignConfig {
            time_blocks: self.time_block_config(),
            company: self.company_config(),
        }
    }
}
