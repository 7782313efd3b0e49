use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::key::{encode_key_path, normalize_key};
use crate::{BackendKind, StorageBackend, StorageError, StoredAsset};

/// Filesystem-based backend.
///
/// Each object is stored at `{root}/{key}` and served from `{base_url}/{key}`.
/// Parent directories are created automatically.
#[derive(Debug, Clone)]
pub struct LocalBackend {
  root: PathBuf,
  base_url: String,
}

impl LocalBackend {
  /// Create a new local backend writing under `root`.
  pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
    Self {
      root: root.into(),
      base_url: base_url.into().trim_end_matches('/').to_string(),
    }
  }

  /// Get the root directory of the backend.
  pub fn root(&self) -> &Path {
    &self.root
  }

  fn key_to_path(&self, key: &str) -> Result<(String, PathBuf), StorageError> {
    let key = normalize_key(key)?;
    let path = self.root.join(&key);
    Ok((key, path))
  }
}

#[async_trait]
impl StorageBackend for LocalBackend {
  fn kind(&self) -> BackendKind {
    BackendKind::Local
  }

  async fn put(
    &self,
    key: &str,
    data: Bytes,
    content_type: Option<&str>,
  ) -> Result<StoredAsset, StorageError> {
    let (key, path) = self.key_to_path(key)?;

    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).await?;
    }

    let mut file = fs::File::create(&path).await?;
    file.write_all(&data).await?;
    file.flush().await?;

    tracing::debug!(key = %key, bytes = data.len(), "stored object on local disk");

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
    let (_, path) = self.key_to_path(key)?;
    match fs::remove_file(&path).await {
      Ok(()) => Ok(true),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
      Err(e) => Err(StorageError::Io(e)),
    }
  }
}
