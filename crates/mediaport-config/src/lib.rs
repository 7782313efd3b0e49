//! Mediaport Config
//!
//! This crate contains the serializable storage configuration for mediaport.
//! A [`StorageConfig`] names every disk the application can write to, which of
//! them is the default ("public") disk, and an optional `cloud` alias.
//!
//! Configuration can be loaded from:
//! - JSON files (via the CLI with `--config=storage.json`)
//! - An injected environment map (see [`StorageConfig::from_env`])
//!
//! Nothing in this crate reads process state directly. The storage crate turns
//! these values into concrete backends once at startup.

mod cloudinary;
mod disk;
mod env;
mod error;

pub use disk::{
  CLOUDINARY_API, CLOUDINARY_DELIVERY_HOST, CloudinaryDiskConfig, DiskConfig, GCS_ENDPOINT,
  LocalDiskConfig, ObjectDiskConfig,
};
pub use error::ConfigError;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Name of the disk every caller writes user uploads to unless told otherwise.
pub const PUBLIC_DISK: &str = "public";

fn default_disk_name() -> String {
  PUBLIC_DISK.to_string()
}

/// The full set of configured disks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
  /// Name of the active disk.
  #[serde(default = "default_disk_name")]
  pub default: String,

  /// Optional alias for a "cloud" disk. Points at another entry in `disks`.
  #[serde(default)]
  pub cloud: Option<String>,

  /// Disk definitions keyed by name.
  pub disks: BTreeMap<String, DiskConfig>,
}

impl StorageConfig {
  /// Parse and validate a JSON configuration document.
  pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
    let config: StorageConfig = serde_json::from_str(content)?;
    config.validate()?;
    Ok(config)
  }

  /// Check that the default and cloud aliases resolve and that every disk is usable.
  pub fn validate(&self) -> Result<(), ConfigError> {
    self.disk(&self.default)?;
    if let Some(cloud) = &self.cloud {
      self.disk(cloud)?;
    }
    for (name, disk) in &self.disks {
      disk.validate(name)?;
    }
    Ok(())
  }

  /// Look up a disk definition by name.
  pub fn disk(&self, name: &str) -> Result<&DiskConfig, ConfigError> {
    self
      .disks
      .get(name)
      .ok_or_else(|| ConfigError::UnknownDisk(name.to_string()))
  }

  /// The definition of the default disk.
  pub fn default_disk(&self) -> Result<&DiskConfig, ConfigError> {
    self.disk(&self.default)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_multi_disk_config() {
    let json = r#"{
      "default": "public",
      "cloud": "cloudinary",
      "disks": {
        "public": { "driver": "local", "root": "/srv/uploads", "url": "https://shop.test/uploads" },
        "cloudinary": {
          "driver": "cloudinary",
          "cloud_name": "demo",
          "api_key": "123",
          "api_secret": "abc"
        },
        "s3": { "driver": "s3", "bucket": "media", "region": "eu-west-1", "prefix": "uploads" }
      }
    }"#;

    let config = StorageConfig::from_json_str(json).expect("config should parse");
    assert_eq!(config.default, "public");
    assert_eq!(config.cloud.as_deref(), Some("cloudinary"));
    assert_eq!(config.disks.len(), 3);

    match config.disk("cloudinary").unwrap() {
      DiskConfig::Cloudinary(c) => {
        assert_eq!(c.cloud_name, "demo");
        assert!(c.secure, "secure should default to true");
      }
      other => panic!("unexpected disk: {:?}", other),
    }
  }

  #[test]
  fn test_default_name_falls_back_to_public() {
    let json = r#"{ "disks": { "public": { "driver": "local", "root": "up", "url": "http://x/uploads" } } }"#;
    let config = StorageConfig::from_json_str(json).unwrap();
    assert_eq!(config.default, PUBLIC_DISK);
  }

  #[test]
  fn test_missing_default_disk_is_rejected() {
    let json = r#"{ "default": "nope", "disks": {} }"#;
    let err = StorageConfig::from_json_str(json).unwrap_err();
    assert!(matches!(err, ConfigError::UnknownDisk(name) if name == "nope"));
  }

  #[test]
  fn test_dangling_cloud_alias_is_rejected() {
    let json = r#"{
      "cloud": "gone",
      "disks": { "public": { "driver": "local", "root": "up", "url": "http://x/uploads" } }
    }"#;
    assert!(matches!(
      StorageConfig::from_json_str(json),
      Err(ConfigError::UnknownDisk(_))
    ));
  }

  #[test]
  fn test_unknown_driver_fails_to_parse() {
    let json = r#"{ "disks": { "public": { "driver": "ftp", "root": "up" } } }"#;
    assert!(matches!(
      StorageConfig::from_json_str(json),
      Err(ConfigError::Parse(_))
    ));
  }
}
