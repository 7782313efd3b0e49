use mediaport_ingest::{AvatarIngestionPipeline, IngestionRequest};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::result::{BatchResult, StoredItem};

/// Runs ingestion requests one after another, in input order.
///
/// Holds no state between runs; the same runner can be reused.
pub struct MigrationBatchRunner {
  pipeline: AvatarIngestionPipeline,
  cancel: Option<CancellationToken>,
}

impl MigrationBatchRunner {
  pub fn new(pipeline: AvatarIngestionPipeline) -> Self {
    Self {
      pipeline,
      cancel: None,
    }
  }

  /// Stop before the next item once `cancel` fires.
  #[must_use]
  pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
    self.cancel = Some(cancel);
    self
  }

  /// Process at most `limit` items.
  ///
  /// With `dry_run` each item is only validated: nothing is fetched or written.
  pub async fn run(&self, items: &[IngestionRequest], dry_run: bool, limit: usize) -> BatchResult {
    let mut result = BatchResult::default();

    info!(
      items = items.len(),
      limit,
      dry_run,
      "starting batch"
    );

    for request in items.iter().take(limit) {
      if self.cancel.as_ref().is_some_and(|c| c.is_cancelled()) {
        info!(attempted = result.attempted, "batch cancelled");
        result.cancelled = true;
        break;
      }

      result.attempted += 1;
      let item_id = request.item_id();

      if dry_run {
        match self.pipeline.validate(request).await {
          Ok(_) => {
            info!(item = %item_id, source = %request.source, "would ingest");
            result.succeeded += 1;
            result.planned.push(item_id.to_string());
          }
          Err(e) => {
            warn!(item = %item_id, error = %e, "skipping item");
            result.record_failure(item_id, e.to_string());
          }
        }
        continue;
      }

      match self.pipeline.ingest(request).await {
        Ok(asset) => {
          result.succeeded += 1;
          result.stored.push(StoredItem {
            item_id: item_id.to_string(),
            asset,
          });
        }
        Err(e) => {
          warn!(item = %item_id, error = %e, "skipping item");
          result.record_failure(item_id, e.to_string());
        }
      }
    }

    info!(
      attempted = result.attempted,
      succeeded = result.succeeded,
      failed = result.failed(),
      "batch finished"
    );

    result
  }
}
