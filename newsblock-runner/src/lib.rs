//! Newsblock Runner: configuration, collection and step orchestration.
//!
//! This crate builds on `newsblock-core` to provide:
//! - TOML pipeline configuration with a reproducible config hash
//! - Multi-entity series collection with per-entity skip on failure
//! - Table export with JSON manifest sidecars
//! - One function per pipeline step, from input paths to a saved output

pub mod collect;
pub mod config;
pub mod export;
pub mod steps;

pub use collect::{collect_series, CollectSummary};
pub use config::{ColumnConfig, ConfigError, PipelineConfig};
pub use export::{load_manifest, manifest_path, save_table, Manifest};
pub use steps::{
    run_align, run_merge_company, run_merge_series, run_prepare_articles, run_sector_panel,
    run_time_blocks,
};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn config_is_send_sync() {
        assert_send::<PipelineConfig>();
        assert_sync::<PipelineConfig>();
    }

    #[test]
    fn manifest_is_send_sync() {
        assert_send::<Manifest>();
        assert_sync::<Manifest>();
    }
}
