use std::collections::BTreeMap;
use std::sync::Arc;

use mediaport_config::{ConfigError, DiskConfig, StorageConfig};
use reqwest::Client;
use thiserror::Error;

use crate::http::http_client;
use crate::{CdnUploadBackend, LocalBackend, RemoteObjectBackend, StorageBackend};

/// Errors raised while turning configuration into backends.
#[derive(Debug, Error)]
pub enum BuildError {
  #[error(transparent)]
  Config(#[from] ConfigError),

  #[error("failed to build http client: {0}")]
  Client(#[from] reqwest::Error),
}

/// Construct the backend a disk definition describes.
pub fn build_backend(
  name: &str,
  disk: &DiskConfig,
  client: &Client,
) -> Result<Arc<dyn StorageBackend>, BuildError> {
  disk.validate(name)?;

  let backend: Arc<dyn StorageBackend> = match disk {
    DiskConfig::Local(local) => Arc::new(LocalBackend::new(local.root.clone(), local.url.clone())),
    DiskConfig::S3(object) | DiskConfig::Gcs(object) => {
      let endpoint = disk.object_endpoint().ok_or_else(|| ConfigError::InvalidValue {
        name: format!("disks.{}", name),
        message: "missing endpoint".to_string(),
      })?;
      Arc::new(
        RemoteObjectBackend::new(endpoint, object.bucket.clone(), client.clone())
          .with_prefix(object.prefix.clone())
          .with_public_url(object.public_url.clone())
          .with_token(object.token.clone()),
      )
    }
    DiskConfig::Cloudinary(cloudinary) => {
      Arc::new(CdnUploadBackend::from_config(cloudinary, client.clone()))
    }
  };

  tracing::debug!(disk = %name, driver = disk.driver(), "built storage backend");
  Ok(backend)
}

/// Every configured disk, resolved once at startup.
///
/// Callers take the active disk from [`public`](Self::public) and never need
/// to know which driver sits behind it.
#[derive(Clone)]
pub struct Disks {
  disks: BTreeMap<String, Arc<dyn StorageBackend>>,
  default: String,
  cloud: Option<String>,
}

impl std::fmt::Debug for Disks {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Disks")
      .field("disks", &self.disks.keys().collect::<Vec<_>>())
      .field("default", &self.default)
      .field("cloud", &self.cloud)
      .finish()
  }
}

impl Disks {
  /// Start a registry whose default disk is `name`.
  pub fn new(name: impl Into<String>, backend: Arc<dyn StorageBackend>) -> Self {
    let name = name.into();
    let mut disks = BTreeMap::new();
    disks.insert(name.clone(), backend);
    Self {
      disks,
      default: name,
      cloud: None,
    }
  }

  /// Register an additional named disk.
  #[must_use]
  pub fn with_disk(mut self, name: impl Into<String>, backend: Arc<dyn StorageBackend>) -> Self {
    self.disks.insert(name.into(), backend);
    self
  }

  /// Point the `cloud` alias at a registered disk.
  #[must_use]
  pub fn with_cloud_alias(mut self, name: impl Into<String>) -> Self {
    self.cloud = Some(name.into());
    self
  }

  /// Build every disk in `config` with a shared HTTP client.
  pub fn from_config(config: &StorageConfig) -> Result<Self, BuildError> {
    config.validate()?;
    let client = http_client()?;

    let mut disks = BTreeMap::new();
    for (name, disk) in &config.disks {
      disks.insert(name.clone(), build_backend(name, disk, &client)?);
    }

    Ok(Self {
      disks,
      default: config.default.clone(),
      cloud: config.cloud.clone(),
    })
  }

  /// The active, public-facing disk.
  pub fn public(&self) -> Arc<dyn StorageBackend> {
    // `new` and `from_config` both guarantee the default is registered.
    Arc::clone(&self.disks[&self.default])
  }

  /// The `cloud` alias, falling back to the public disk.
  pub fn cloud(&self) -> Arc<dyn StorageBackend> {
    self
      .cloud
      .as_ref()
      .and_then(|name| self.disk(name))
      .unwrap_or_else(|| self.public())
  }

  /// A disk by name.
  pub fn disk(&self, name: &str) -> Option<Arc<dyn StorageBackend>> {
    self.disks.get(name).cloned()
  }

  /// Name of the default disk.
  pub fn default_name(&self) -> &str {
    &self.default
  }

  /// Registered disk names in sorted order.
  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.disks.keys().map(String::as_str)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{BackendKind, MemoryBackend};

  #[test]
  fn test_from_config_builds_each_driver() {
    let json = r#"{
      "default": "public",
      "cloud": "media",
      "disks": {
        "public": { "driver": "local", "root": "/tmp/uploads", "url": "https://shop.test/uploads" },
        "media": { "driver": "cloudinary", "cloud_name": "demo", "api_key": "k", "api_secret": "s" },
        "archive": { "driver": "gcs", "bucket": "archive" }
      }
    }"#;
    let config = StorageConfig::from_json_str(json).unwrap();
    let disks = Disks::from_config(&config).unwrap();

    assert_eq!(disks.public().kind(), BackendKind::Local);
    assert_eq!(disks.cloud().kind(), BackendKind::CdnUpload);
    assert_eq!(disks.disk("archive").unwrap().kind(), BackendKind::ObjectStore);
    assert_eq!(disks.names().collect::<Vec<_>>(), vec!["archive", "media", "public"]);
    assert_eq!(
      disks.disk("archive").unwrap().url_for("a.png"),
      "https://storage.googleapis.com/archive/a.png"
    );
  }

  #[test]
  fn test_cloud_falls_back_to_public() {
    let disks = Disks::new("public", Arc::new(MemoryBackend::new("memory://public")));
    assert_eq!(disks.cloud().url_for("k"), "memory://public/k");

    let disks = disks.with_cloud_alias("missing");
    assert_eq!(disks.cloud().url_for("k"), "memory://public/k");
  }

  #[test]
  fn test_secondary_disk_registration() {
    let disks = Disks::new("public", Arc::new(MemoryBackend::new("memory://public")))
      .with_disk("cloud", Arc::new(MemoryBackend::new("memory://cloud")))
      .with_cloud_alias("cloud");

    assert_eq!(disks.default_name(), "public");
    assert_eq!(disks.cloud().url_for("k"), "memory://cloud/k");
  }
}
