use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use mediaport_storage::{BackendKind, MemoryBackend, StorageBackend, StorageError, StoredAsset};

/// How a [`RecordingBackend`] treats `put_from_url`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlIngest {
  /// Not supported, like a local disk.
  Unsupported,
  /// Supported and succeeds.
  Succeed,
  /// Advertised but always fails with `Unavailable`.
  Fail,
}

/// In-memory backend that records every call and can inject failures.
#[derive(Debug)]
pub struct RecordingBackend {
  inner: MemoryBackend,
  url_ingest: UrlIngest,
  fail_keys_containing: Vec<String>,
  puts: Mutex<Vec<String>>,
  url_puts: Mutex<Vec<String>>,
}

impl RecordingBackend {
  pub fn new(url_ingest: UrlIngest) -> Self {
    Self {
      inner: MemoryBackend::new("https://cdn.test/media"),
      url_ingest,
      fail_keys_containing: Vec::new(),
      puts: Mutex::new(Vec::new()),
      url_puts: Mutex::new(Vec::new()),
    }
  }

  /// Make `put` fail with `Unavailable` for keys containing `needle`.
  #[must_use]
  pub fn failing_on(mut self, needle: &str) -> Self {
    self.fail_keys_containing.push(needle.to_string());
    self
  }

  /// Keys passed to `put`, in call order (including failed ones).
  pub fn puts(&self) -> Vec<String> {
    self.puts.lock().unwrap().clone()
  }

  /// URLs passed to `put_from_url`, in call order.
  pub fn url_puts(&self) -> Vec<String> {
    self.url_puts.lock().unwrap().clone()
  }

  /// Total write attempts of either kind.
  pub fn write_attempts(&self) -> usize {
    self.puts.lock().unwrap().len() + self.url_puts.lock().unwrap().len()
  }

  pub fn stored(&self, key: &str) -> Option<Bytes> {
    self.inner.get(key)
  }

  pub fn stored_keys(&self) -> Vec<String> {
    self.inner.keys()
  }
}

#[async_trait]
impl StorageBackend for RecordingBackend {
  fn kind(&self) -> BackendKind {
    match self.url_ingest {
      UrlIngest::Unsupported => BackendKind::Local,
      _ => BackendKind::CdnUpload,
    }
  }

  fn supports_url_ingest(&self) -> bool {
    self.url_ingest != UrlIngest::Unsupported
  }

  async fn put(
    &self,
    key: &str,
    data: Bytes,
    content_type: Option<&str>,
  ) -> Result<StoredAsset, StorageError> {
    self.puts.lock().unwrap().push(key.to_string());
    if self.fail_keys_containing.iter().any(|n| key.contains(n.as_str())) {
      return Err(StorageError::Unavailable(format!("injected failure for {}", key)));
    }
    let mut asset = self.inner.put(key, data, content_type).await?;
    asset.backend_kind = self.kind();
    Ok(asset)
  }

  async fn put_from_url(&self, remote_url: &str, folder: &str) -> Result<StoredAsset, StorageError> {
    let count = {
      let mut url_puts = self.url_puts.lock().unwrap();
      url_puts.push(remote_url.to_string());
      url_puts.len()
    };

    match self.url_ingest {
      UrlIngest::Unsupported => Err(StorageError::Unsupported {
        backend: "recording",
        operation: "put_from_url",
      }),
      UrlIngest::Fail => Err(StorageError::Unavailable("remote fetch refused".to_string())),
      UrlIngest::Succeed => {
        let key = format!("{}/remote_{}.jpg", folder.trim_matches('/'), count);
        let mut asset = self
          .inner
          .put(&key, Bytes::from_static(b"remote"), Some("image/jpeg"))
          .await?;
        asset.backend_kind = BackendKind::CdnUpload;
        Ok(asset)
      }
    }
  }

  fn url_for(&self, key: &str) -> String {
    self.inner.url_for(key)
  }

  async fn delete(&self, key: &str) -> Result<bool, StorageError> {
    self.inner.delete(key).await
  }
}
