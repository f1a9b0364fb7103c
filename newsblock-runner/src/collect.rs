//! Collection orchestrator: fetch several entity series with progress
//! reporting, skipping the ones that fail.

use newsblock_core::data::{EntitySeries, EntitySpec, FetchError, FetchProgress, SeriesProvider};

/// Outcome of a multi-entity collection.
#[derive(Debug)]
pub struct CollectSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Fetched series, in request order.
    pub series: Vec<EntitySeries>,
    pub errors: Vec<(EntitySpec, FetchError)>,
}

impl CollectSummary {
    pub fn all_failed(&self) -> bool {
        self.succeeded == 0
    }
}

/// Fetch every entity from `provider`. A failed entity is reported and left
/// out; it never aborts the batch.
pub fn collect_series(
    provider: &dyn SeriesProvider,
    entities: &[EntitySpec],
    progress: &dyn FetchProgress,
) -> CollectSummary {
    let total = entities.len();
    let mut series = Vec::with_capacity(total);
    let mut errors = Vec::new();

    for (i, entity) in entities.iter().enumerate() {
        progress.on_start(entity, i, total);

        let result = provider.fetch(entity);
        progress.on_complete(entity, i, total, result.as_ref().map(|s| s.bars.len()));

        match result {
            Ok(s) => series.push(s),
            Err(e) => errors.push((entity.clone(), e)),
        }
    }

    let succeeded = series.len();
    let failed = errors.len();
    progress.on_batch_complete(succeeded, failed, total);
    tracing::debug!(provider = provider.name(), succeeded, failed, "collection finished");

    CollectSummary {
        total,
        succeeded,
        failed,
        series,
        errors,
    }
}
