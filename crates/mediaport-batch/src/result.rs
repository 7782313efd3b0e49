use mediaport_storage::StoredAsset;
use serde::Serialize;

/// Why a single item was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
  pub item_id: String,
  pub reason: String,
}

/// An item that was written, with the key the caller should persist.
#[derive(Debug, Clone, Serialize)]
pub struct StoredItem {
  pub item_id: String,
  pub asset: StoredAsset,
}

/// Outcome of one batch run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchResult {
  /// Items the runner looked at, never more than the limit.
  pub attempted: usize,
  /// Items stored, or on a dry run, items that passed validation.
  pub succeeded: usize,
  pub failures: Vec<ItemFailure>,
  pub stored: Vec<StoredItem>,
  /// Item ids a dry run would have ingested.
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub planned: Vec<String>,
  /// Set when the run stopped early on cancellation.
  #[serde(skip_serializing_if = "std::ops::Not::not")]
  pub cancelled: bool,
}

impl BatchResult {
  pub fn failed(&self) -> usize {
    self.failures.len()
  }

  pub(crate) fn record_failure(&mut self, item_id: &str, reason: impl Into<String>) {
    self.failures.push(ItemFailure {
      item_id: item_id.to_string(),
      reason: reason.into(),
    });
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_failed_counts_failures() {
    let mut result = BatchResult::default();
    result.record_failure("7", "fetch failed");
    result.record_failure("8", "invalid source");
    assert_eq!(result.failed(), 2);
    assert_eq!(result.failures[0].item_id, "7");
  }
}
