use std::sync::Arc;

use crate::{StorageBackend, StorageError};

/// Kinds of stored image the application links to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetCategory {
  ProfilePicture,
  AdminProfile,
  ShopImage,
  PaymentMethod,
  PaymentProof,
}

impl AssetCategory {
  /// Folder a bare filename is placed under.
  pub const fn folder(self) -> Option<&'static str> {
    match self {
      Self::ProfilePicture => Some("profile-pictures"),
      Self::AdminProfile => Some("admin-profiles"),
      Self::PaymentMethod => Some("payment-methods"),
      Self::ShopImage | Self::PaymentProof => None,
    }
  }

  /// Prefixes that mark a path as already foldered.
  const fn accepted_prefixes(self) -> &'static [&'static str] {
    match self {
      Self::ProfilePicture => &["profile-pictures/", "user-profiles/"],
      Self::AdminProfile => &["admin-profiles/", "profile-pictures/"],
      Self::PaymentMethod => &["payment-methods/"],
      Self::ShopImage | Self::PaymentProof => &[],
    }
  }

  /// Placeholder image shown when nothing is stored.
  pub const fn default_image(self) -> &'static str {
    match self {
      Self::ProfilePicture | Self::AdminProfile => "images/default-profile.png",
      Self::ShopImage => "images/default-shop.png",
      Self::PaymentMethod | Self::PaymentProof => "images/cash.png",
    }
  }
}

/// Returns true for `http://` and `https://` URLs.
pub fn is_absolute_url(value: &str) -> bool {
  value.starts_with("http://") || value.starts_with("https://")
}

/// Turns stored paths into links through a backend.
///
/// Rows may hold an absolute URL (remote avatars, CDN secure URLs), a
/// foldered key, or a bare filename from older uploads; all three resolve.
#[derive(Clone)]
pub struct AssetUrls {
  backend: Arc<dyn StorageBackend>,
  assets_base: String,
}

impl AssetUrls {
  /// `assets_base` is where static placeholder images are served from.
  pub fn new(backend: Arc<dyn StorageBackend>, assets_base: impl Into<String>) -> Self {
    Self {
      backend,
      assets_base: assets_base.into().trim_end_matches('/').to_string(),
    }
  }

  /// Link for a stored path, or the category placeholder when there is none.
  pub fn resolve(&self, path: Option<&str>, category: AssetCategory) -> String {
    let path = match path.map(str::trim).filter(|p| !p.is_empty()) {
      Some(p) => p,
      None => return format!("{}/{}", self.assets_base, category.default_image()),
    };

    if is_absolute_url(path) {
      return path.to_string();
    }

    let path = path.trim_start_matches('/');
    let key = match category.folder() {
      Some(folder) if !category.accepted_prefixes().iter().any(|p| path.starts_with(p)) => {
        format!("{}/{}", folder, path)
      }
      _ => path.to_string(),
    };
    self.backend.url_for(&key)
  }

  /// Delete a stored path. Nothing stored counts as success.
  pub async fn delete(&self, path: Option<&str>) -> Result<bool, StorageError> {
    match path.map(str::trim).filter(|p| !p.is_empty()) {
      None => Ok(true),
      Some(p) if is_absolute_url(p) => Ok(false),
      Some(p) => self.backend.delete(p).await,
    }
  }
}
