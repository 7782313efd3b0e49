use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default endpoint for Google Cloud Storage's XML API.
pub const GCS_ENDPOINT: &str = "https://storage.googleapis.com";

/// Default Cloudinary upload API root.
pub const CLOUDINARY_API: &str = "https://api.cloudinary.com/v1_1";

/// Default Cloudinary delivery host.
pub const CLOUDINARY_DELIVERY_HOST: &str = "res.cloudinary.com";

fn default_true() -> bool {
  true
}

/// A single disk definition, selected by its `driver` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "driver", rename_all = "snake_case")]
pub enum DiskConfig {
  /// Files written under a local directory and served from a base URL.
  Local(LocalDiskConfig),

  /// S3-compatible bucket.
  S3(ObjectDiskConfig),

  /// Google Cloud Storage bucket.
  Gcs(ObjectDiskConfig),

  /// Cloudinary-style CDN with upload and remote-fetch support.
  Cloudinary(CloudinaryDiskConfig),
}

/// Settings for a local directory disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalDiskConfig {
  /// Directory objects are written under.
  pub root: PathBuf,

  /// Base URL the directory is served from, e.g. `https://shop.test/uploads`.
  pub url: String,
}

/// Settings shared by S3- and GCS-style object stores.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ObjectDiskConfig {
  #[serde(default)]
  pub endpoint: Option<String>,

  pub bucket: String,

  /// Key prefix prepended to every object, without surrounding slashes.
  #[serde(default)]
  pub prefix: String,

  /// Public base URL for reads. Defaults to `{endpoint}/{bucket}`.
  #[serde(default)]
  pub public_url: Option<String>,

  /// Bearer token sent with writes and deletes.
  #[serde(default)]
  pub token: Option<String>,

  #[serde(default)]
  pub region: Option<String>,
}

/// Settings for a Cloudinary account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudinaryDiskConfig {
  pub cloud_name: String,
  pub api_key: String,
  pub api_secret: String,

  /// Serve delivery URLs over https.
  #[serde(default = "default_true")]
  pub secure: bool,

  /// Override for the upload API root (tests, proxies).
  #[serde(default)]
  pub api_base: Option<String>,

  /// Override for the delivery host.
  #[serde(default)]
  pub delivery_host: Option<String>,
}

impl DiskConfig {
  /// Driver name as written in configuration.
  pub fn driver(&self) -> &'static str {
    match self {
      DiskConfig::Local(_) => "local",
      DiskConfig::S3(_) => "s3",
      DiskConfig::Gcs(_) => "gcs",
      DiskConfig::Cloudinary(_) => "cloudinary",
    }
  }

  /// Check that the disk has everything its driver needs.
  pub fn validate(&self, name: &str) -> Result<(), ConfigError> {
    match self {
      DiskConfig::Local(local) => {
        if local.root.as_os_str().is_empty() {
          return Err(invalid(name, "root must not be empty"));
        }
        if local.url.trim().is_empty() {
          return Err(invalid(name, "url must not be empty"));
        }
      }
      DiskConfig::S3(object) | DiskConfig::Gcs(object) => {
        if object.bucket.trim().is_empty() {
          return Err(invalid(name, "bucket must not be empty"));
        }
        let endpoint = self
          .object_endpoint()
          .ok_or_else(|| invalid(name, "either endpoint or region is required"))?;
        url::Url::parse(&endpoint)
          .map_err(|e| invalid(name, &format!("endpoint is not a url: {}", e)))?;
      }
      DiskConfig::Cloudinary(c) => {
        if c.cloud_name.is_empty() || c.api_key.is_empty() || c.api_secret.is_empty() {
          return Err(invalid(
            name,
            "cloud_name, api_key and api_secret are required",
          ));
        }
      }
    }
    Ok(())
  }

  /// Resolved endpoint for object-store drivers.
  ///
  /// S3 without an explicit endpoint uses the regional AWS host; GCS uses
  /// [`GCS_ENDPOINT`]. Returns `None` for other drivers.
  pub fn object_endpoint(&self) -> Option<String> {
    match self {
      DiskConfig::S3(object) => object
        .endpoint
        .clone()
        .or_else(|| {
          object
            .region
            .as_ref()
            .map(|region| format!("https://s3.{}.amazonaws.com", region))
        })
        .map(|e| e.trim_end_matches('/').to_string()),
      DiskConfig::Gcs(object) => Some(
        object
          .endpoint
          .as_deref()
          .unwrap_or(GCS_ENDPOINT)
          .trim_end_matches('/')
          .to_string(),
      ),
      _ => None,
    }
  }
}

fn invalid(name: &str, message: &str) -> ConfigError {
  ConfigError::InvalidValue {
    name: format!("disks.{}", name),
    message: message.to_string(),
  }
}
