use async_trait::async_trait;
use bytes::Bytes;
use mediaport_config::CloudinaryDiskConfig;
use mediaport_config::{CLOUDINARY_API, CLOUDINARY_DELIVERY_HOST};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::Deserialize;
use sha1::{Digest, Sha1};

use crate::http::status_error;
use crate::key::{encode_key_path, normalize_key};
use crate::{BackendKind, StorageBackend, StorageError, StoredAsset};

/// Parameters that Cloudinary leaves out of the request signature.
const UNSIGNED_PARAMS: &[&str] = &["file", "api_key", "resource_type", "cloud_name", "signature"];

/// Cloudinary-style CDN backend.
///
/// Accepts raw bytes (multipart upload with an explicit `public_id`) or a
/// remote URL, in which case the CDN fetches the image itself. Keys have the
/// form `{public_id}.{format}` and map directly onto delivery URLs.
#[derive(Debug, Clone)]
pub struct CdnUploadBackend {
  cloud_name: String,
  api_key: String,
  api_secret: String,
  secure: bool,
  api_base: String,
  delivery_host: String,
  client: Client,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
  public_id: String,
  #[serde(default)]
  format: Option<String>,
  /// Set when an asset with the same public id already existed.
  #[serde(default)]
  overwritten: bool,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
  result: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
  error: ErrorMessage,
}

#[derive(Debug, Deserialize)]
struct ErrorMessage {
  message: String,
}

impl CdnUploadBackend {
  pub fn new(
    cloud_name: impl Into<String>,
    api_key: impl Into<String>,
    api_secret: impl Into<String>,
    client: Client,
  ) -> Self {
    Self {
      cloud_name: cloud_name.into(),
      api_key: api_key.into(),
      api_secret: api_secret.into(),
      secure: true,
      api_base: CLOUDINARY_API.to_string(),
      delivery_host: CLOUDINARY_DELIVERY_HOST.to_string(),
      client,
    }
  }

  /// Build a backend from its disk configuration.
  pub fn from_config(config: &CloudinaryDiskConfig, client: Client) -> Self {
    Self::new(
      config.cloud_name.clone(),
      config.api_key.clone(),
      config.api_secret.clone(),
      client,
    )
    .with_secure(config.secure)
    .with_api_base(config.api_base.clone())
    .with_delivery_host(config.delivery_host.clone())
  }

  #[must_use]
  pub fn with_secure(mut self, secure: bool) -> Self {
    self.secure = secure;
    self
  }

  #[must_use]
  pub fn with_api_base(mut self, api_base: Option<String>) -> Self {
    if let Some(base) = api_base.filter(|b| !b.is_empty()) {
      self.api_base = base.trim_end_matches('/').to_string();
    }
    self
  }

  #[must_use]
  pub fn with_delivery_host(mut self, host: Option<String>) -> Self {
    if let Some(host) = host.filter(|h| !h.is_empty()) {
      self.delivery_host = host.trim_end_matches('/').to_string();
    }
    self
  }

  fn endpoint(&self, action: &str) -> String {
    format!("{}/{}/image/{}", self.api_base, self.cloud_name, action)
  }

  /// Add `timestamp`, `api_key` and `signature` to a parameter set.
  fn signed(&self, mut params: Vec<(&'static str, String)>) -> Vec<(&'static str, String)> {
    params.push(("timestamp", chrono::Utc::now().timestamp().to_string()));
    let signature = sign_params(
      params.iter().map(|(k, v)| (*k, v.as_str())),
      &self.api_secret,
    );
    params.push(("api_key", self.api_key.clone()));
    params.push(("signature", signature));
    params
  }

  async fn read_upload(response: Response, context: &str) -> Result<UploadResponse, StorageError> {
    let status = response.status();
    if !status.is_success() {
      return Err(Self::api_error(response, context).await);
    }
    response
      .json::<UploadResponse>()
      .await
      .map_err(|e| StorageError::Unavailable(format!("{}: malformed response: {}", context, e)))
  }

  async fn api_error(response: Response, context: &str) -> StorageError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorResponse>(&body)
      .map(|e| e.error.message)
      .unwrap_or(body);
    status_error(status, context, &message)
  }
}

#[async_trait]
impl StorageBackend for CdnUploadBackend {
  fn kind(&self) -> BackendKind {
    BackendKind::CdnUpload
  }

  fn supports_url_ingest(&self) -> bool {
    true
  }

  async fn put(
    &self,
    key: &str,
    data: Bytes,
    content_type: Option<&str>,
  ) -> Result<StoredAsset, StorageError> {
    let key = normalize_key(key)?;
    let (public_id, extension) = split_extension(&key);
    let file_name = key.rsplit('/').next().unwrap_or(key.as_str()).to_string();

    let mut form = Form::new();
    for (name, value) in self.signed(vec![("public_id", public_id.to_string())]) {
      form = form.text(name, value);
    }
    let mut part = Part::bytes(data.to_vec()).file_name(file_name);
    if let Some(ct) = content_type {
      part = part.mime_str(ct)?;
    }
    form = form.part("file", part);

    let response = self
      .client
      .post(self.endpoint("upload"))
      .multipart(form)
      .send()
      .await?;
    let uploaded = Self::read_upload(response, &format!("upload {}", key)).await?;
    if uploaded.overwritten {
      tracing::warn!(
        key = %key,
        public_id = %uploaded.public_id,
        "upload replaced an existing cdn asset with the same public id"
      );
    }

    let format = uploaded
      .format
      .filter(|f| !f.is_empty())
      .or(extension.map(str::to_string))
      .unwrap_or_else(|| "jpg".to_string());

    tracing::debug!(public_id = %uploaded.public_id, "uploaded object to cdn");

    Ok(StoredAsset {
      key: format!("{}.{}", uploaded.public_id, format),
      backend_kind: BackendKind::CdnUpload,
      content_type: content_type.map(str::to_string),
    })
  }

  async fn put_from_url(&self, remote_url: &str, folder: &str) -> Result<StoredAsset, StorageError> {
    let mut params = Vec::new();
    let folder = folder.trim_matches('/');
    if !folder.is_empty() {
      params.push(("folder", folder.to_string()));
    }
    let mut fields = self.signed(params);
    fields.push(("file", remote_url.to_string()));

    let response = self
      .client
      .post(self.endpoint("upload"))
      .form(&fields)
      .send()
      .await?;
    let uploaded = Self::read_upload(response, &format!("remote upload of {}", remote_url)).await?;

    let format = uploaded
      .format
      .filter(|f| !f.is_empty())
      .unwrap_or_else(|| "jpg".to_string());

    tracing::debug!(public_id = %uploaded.public_id, url = %remote_url, "cdn fetched remote image");

    Ok(StoredAsset {
      key: format!("{}.{}", uploaded.public_id, format),
      backend_kind: BackendKind::CdnUpload,
      content_type: Some(content_type_for_format(&format)),
    })
  }

  fn url_for(&self, key: &str) -> String {
    let scheme = if self.secure { "https" } else { "http" };
    format!(
      "{}://{}/{}/image/upload/{}",
      scheme,
      self.delivery_host,
      self.cloud_name,
      encode_key_path(key)
    )
  }

  async fn delete(&self, key: &str) -> Result<bool, StorageError> {
    let key = normalize_key(key)?;
    let (public_id, _) = split_extension(&key);
    let fields = self.signed(vec![("public_id", public_id.to_string())]);

    let response = self
      .client
      .post(self.endpoint("destroy"))
      .form(&fields)
      .send()
      .await?;

    if !response.status().is_success() {
      return Err(Self::api_error(response, &format!("destroy {}", key)).await);
    }

    let destroyed: DestroyResponse = response
      .json()
      .await
      .map_err(|e| StorageError::Unavailable(format!("destroy {}: malformed response: {}", key, e)))?;

    match destroyed.result.as_str() {
      "ok" => Ok(true),
      "not found" => Ok(false),
      other => Err(StorageError::Unavailable(format!(
        "destroy {}: unexpected result '{}'",
        key, other
      ))),
    }
  }
}

/// Compute a Cloudinary request signature.
///
/// Parameters are sorted by name, joined as `k=v&k=v`, suffixed with the API
/// secret and hashed with SHA-1. Empty values and unsigned parameters are
/// skipped.
pub fn sign_params<'a, I>(params: I, api_secret: &str) -> String
where
  I: IntoIterator<Item = (&'a str, &'a str)>,
{
  let mut pairs: Vec<(&str, &str)> = params
    .into_iter()
    .filter(|(k, v)| !v.is_empty() && !UNSIGNED_PARAMS.iter().any(|u| u == k))
    .collect();
  pairs.sort_by(|a, b| a.0.cmp(b.0));

  let payload = pairs
    .iter()
    .map(|(k, v)| format!("{}={}", k, v))
    .collect::<Vec<_>>()
    .join("&");

  format!("{:x}", Sha1::digest(format!("{}{}", payload, api_secret).as_bytes()))
}

/// Split `folder/name.ext` into (`folder/name`, `Some("ext")`).
fn split_extension(key: &str) -> (&str, Option<&str>) {
  let file_start = key.rfind('/').map(|i| i + 1).unwrap_or(0);
  match key[file_start..].rfind('.') {
    Some(dot) if dot > 0 => {
      let idx = file_start + dot;
      (&key[..idx], Some(&key[idx + 1..]))
    }
    _ => (key, None),
  }
}

fn content_type_for_format(format: &str) -> String {
  match format {
    "jpg" | "jpeg" => "image/jpeg".to_string(),
    other => format!("image/{}", other),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_signature_matches_reference_vector() {
    let signature = sign_params(
      [
        ("timestamp", "1315060510"),
        ("public_id", "sample_image"),
        ("eager", "w_400,h_300,c_pad|w_260,h_200,c_crop"),
        ("api_key", "ignored"),
        ("file", "ignored"),
      ],
      "abcd",
    );
    assert_eq!(signature, "bfd09f95f331f558cbd1320e67aa8d488770583e");
  }

  #[test]
  fn test_split_extension() {
    assert_eq!(split_extension("profile-pictures/7_1.png"), ("profile-pictures/7_1", Some("png")));
    assert_eq!(split_extension("a.b/noext"), ("a.b/noext", None));
    assert_eq!(split_extension("folder/.hidden"), ("folder/.hidden", None));
  }

  #[test]
  fn test_delivery_url() {
    let backend = CdnUploadBackend::new("autoshop", "k", "s", Client::new());
    assert_eq!(
      backend.url_for("profile-pictures/abc.jpg"),
      "https://res.cloudinary.com/autoshop/image/upload/profile-pictures/abc.jpg"
    );

    assert_eq!(
      backend.endpoint("upload"),
      format!("{}/autoshop/image/upload", CLOUDINARY_API)
    );

    let insecure = backend.with_secure(false);
    assert!(insecure.url_for("x.png").starts_with("http://res.cloudinary.com/"));
  }

  #[test]
  fn test_content_type_for_format() {
    assert_eq!(content_type_for_format("jpg"), "image/jpeg");
    assert_eq!(content_type_for_format("webp"), "image/webp");
  }
}
