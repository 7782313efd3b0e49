use std::path::Path;

use serde::{Deserialize, Serialize};

/// One unit of ingestion work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionRequest {
  /// An http(s) URL or a local file path.
  pub source: String,

  /// Owner of the resulting asset; embedded in generated keys.
  pub owner_id: String,

  /// Folder generated keys are placed under. May be empty.
  #[serde(default)]
  pub folder: String,

  /// Exact key to store under, bypassing key generation.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub target_key: Option<String>,
}

impl IngestionRequest {
  pub fn new(
    source: impl Into<String>,
    owner_id: impl Into<String>,
    folder: impl Into<String>,
  ) -> Self {
    Self {
      source: source.into(),
      owner_id: owner_id.into(),
      folder: folder.into(),
      target_key: None,
    }
  }

  /// A legacy upload that keeps its path relative to the uploads root as its key.
  pub fn legacy_file(path: &Path, relative_key: impl Into<String>) -> Self {
    let relative_key = relative_key.into();
    Self {
      source: path.to_string_lossy().into_owned(),
      owner_id: relative_key.clone(),
      folder: String::new(),
      target_key: Some(relative_key),
    }
  }

  /// Identifier used when reporting on this item.
  pub fn item_id(&self) -> &str {
    &self.owner_id
  }
}
