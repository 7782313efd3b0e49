//! Mediaport Storage
//!
//! This crate provides the storage backend trait and its implementations.
//! Every backend stores opaque bytes under a backend-relative key and can turn
//! that key back into a public URL.
//!
//! The [`StorageBackend`] trait is the only thing callers depend on. Concrete
//! backends (local directory, S3/GCS-style bucket, Cloudinary-style CDN) are
//! built once from configuration by [`build_backend`] and collected in a
//! [`Disks`] registry, so swapping the driver behind the "public" disk never
//! touches calling code.

mod cdn;
mod error;
mod factory;
mod http;
mod key;
mod local;
mod memory;
mod object;
mod urls;

pub use cdn::{CdnUploadBackend, sign_params};
pub use error::StorageError;
pub use factory::{BuildError, Disks, build_backend};
pub use http::{REQUEST_TIMEOUT, http_client};
pub use key::normalize_key;
pub use local::LocalBackend;
pub use memory::MemoryBackend;
pub use object::RemoteObjectBackend;
pub use urls::{AssetCategory, AssetUrls, is_absolute_url};

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// The family of backend that produced an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
  Local,
  ObjectStore,
  CdnUpload,
}

impl BackendKind {
  pub const fn as_str(self) -> &'static str {
    match self {
      Self::Local => "local",
      Self::ObjectStore => "object_store",
      Self::CdnUpload => "cdn_upload",
    }
  }
}

/// An object that was written to a backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredAsset {
  /// Backend-relative key. Resolve it with [`StorageBackend::url_for`].
  pub key: String,

  pub backend_kind: BackendKind,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub content_type: Option<String>,
}

/// Uniform interface over heterogeneous object stores.
///
/// Implementations must be cheap to share behind an `Arc` and must not read
/// ambient configuration; everything they need is passed at construction.
#[async_trait]
pub trait StorageBackend: Send + Sync {
  /// Which backend family this is.
  fn kind(&self) -> BackendKind;

  /// Whether [`put_from_url`](Self::put_from_url) performs a server-side fetch.
  fn supports_url_ingest(&self) -> bool {
    false
  }

  /// Store raw bytes under `key`.
  async fn put(
    &self,
    key: &str,
    data: Bytes,
    content_type: Option<&str>,
  ) -> Result<StoredAsset, StorageError>;

  /// Ask the backend to fetch `remote_url` itself and store it under `folder`.
  ///
  /// The backend picks the final key. Backends without remote ingest return
  /// [`StorageError::Unsupported`].
  async fn put_from_url(&self, remote_url: &str, folder: &str) -> Result<StoredAsset, StorageError> {
    let _ = (remote_url, folder);
    Err(StorageError::Unsupported {
      backend: self.kind().as_str(),
      operation: "put_from_url",
    })
  }

  /// Public URL for a key this backend (or a sibling of the same kind) produced.
  fn url_for(&self, key: &str) -> String;

  /// Delete an object. Returns `false` when nothing was stored under `key`.
  async fn delete(&self, key: &str) -> Result<bool, StorageError>;
}
