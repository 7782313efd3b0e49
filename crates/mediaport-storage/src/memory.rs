use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;

use crate::key::{encode_key_path, normalize_key};
use crate::{BackendKind, StorageBackend, StorageError, StoredAsset};

#[derive(Debug, Clone)]
struct Entry {
  data: Bytes,
  content_type: Option<String>,
}

/// In-memory backend.
///
/// Useful for wiring tests and dry runs; behaves like a local disk served
/// from `base_url`.
#[derive(Debug)]
pub struct MemoryBackend {
  base_url: String,
  objects: Mutex<BTreeMap<String, Entry>>,
}

impl MemoryBackend {
  pub fn new(base_url: impl Into<String>) -> Self {
    Self {
      base_url: base_url.into().trim_end_matches('/').to_string(),
      objects: Mutex::new(BTreeMap::new()),
    }
  }

  fn objects(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Entry>> {
    self.objects.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }

  /// Bytes stored under `key`, if any.
  pub fn get(&self, key: &str) -> Option<Bytes> {
    self.objects().get(key).map(|e| e.data.clone())
  }

  /// Content type recorded for `key`, if any.
  pub fn content_type(&self, key: &str) -> Option<String> {
    self.objects().get(key).and_then(|e| e.content_type.clone())
  }

  /// All stored keys in sorted order.
  pub fn keys(&self) -> Vec<String> {
    self.objects().keys().cloned().collect()
  }

  pub fn len(&self) -> usize {
    self.objects().len()
  }

  pub fn is_empty(&self) -> bool {
    self.objects().is_empty()
  }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
  fn kind(&self) -> BackendKind {
    BackendKind::Local
  }

  async fn put(
    &self,
    key: &str,
    data: Bytes,
    content_type: Option<&str>,
  ) -> Result<StoredAsset, StorageError> {
    let key = normalize_key(key)?;
    self.objects().insert(
      key.clone(),
      Entry {
        data,
        content_type: content_type.map(str::to_string),
      },
    );
    Ok(StoredAsset {
      key,
      backend_kind: BackendKind::Local,
      content_type: content_type.map(str::to_string),
    })
  }

  fn url_for(&self, key: &str) -> String {
    format!("{}/{}", self.base_url, encode_key_path(key))
  }

  async fn delete(&self, key: &str) -> Result<bool, StorageError> {
    let key = normalize_key(key)?;
    Ok(self.objects().remove(&key).is_some())
  }
}
