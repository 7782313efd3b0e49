use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder, StatusCode};

use crate::http::status_error;
use crate::key::{encode_key_path, normalize_key};
use crate::{BackendKind, StorageBackend, StorageError, StoredAsset};

/// S3/GCS-style bucket reached over plain HTTP.
///
/// Objects live at `{endpoint}/{bucket}/{prefix}/{key}`. Writes and deletes
/// carry an optional bearer token (an OAuth token for GCS, or a gateway token
/// for S3-compatible stores). Reads go through `public_url` when one is set.
#[derive(Debug, Clone)]
pub struct RemoteObjectBackend {
  endpoint: String,
  bucket: String,
  prefix: String,
  public_url: Option<String>,
  token: Option<String>,
  client: Client,
}

impl RemoteObjectBackend {
  pub fn new(endpoint: impl Into<String>, bucket: impl Into<String>, client: Client) -> Self {
    Self {
      endpoint: endpoint.into().trim_end_matches('/').to_string(),
      bucket: bucket.into(),
      prefix: String::new(),
      public_url: None,
      token: None,
      client,
    }
  }

  #[must_use]
  pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
    self.prefix = prefix.into().trim_matches('/').to_string();
    self
  }

  #[must_use]
  pub fn with_public_url(mut self, public_url: Option<String>) -> Self {
    self.public_url = public_url
      .map(|u| u.trim_end_matches('/').to_string())
      .filter(|u| !u.is_empty());
    self
  }

  #[must_use]
  pub fn with_token(mut self, token: Option<String>) -> Self {
    self.token = token.filter(|t| !t.is_empty());
    self
  }

  /// Percent-encoded path of the object inside the bucket, including the prefix.
  fn object_path(&self, key: &str) -> String {
    let key = encode_key_path(key);
    if self.prefix.is_empty() {
      key
    } else {
      format!("{}/{}", encode_key_path(&self.prefix), key)
    }
  }

  fn object_url(&self, key: &str) -> String {
    format!("{}/{}/{}", self.endpoint, self.bucket, self.object_path(key))
  }

  fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
    match &self.token {
      Some(token) => request.bearer_auth(token),
      None => request,
    }
  }
}

#[async_trait]
impl StorageBackend for RemoteObjectBackend {
  fn kind(&self) -> BackendKind {
    BackendKind::ObjectStore
  }

  async fn put(
    &self,
    key: &str,
    data: Bytes,
    content_type: Option<&str>,
  ) -> Result<StoredAsset, StorageError> {
    let key = normalize_key(key)?;
    let url = self.object_url(&key);
    let size = data.len();

    let mut request = self.client.put(&url).body(data);
    if let Some(ct) = content_type {
      request = request.header(CONTENT_TYPE, ct);
    }

    let response = self.authorize(request).send().await?;
    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(status_error(status, &format!("PUT {}", key), &body));
    }

    tracing::debug!(key = %key, bucket = %self.bucket, bytes = size, "stored object in bucket");

    Ok(StoredAsset {
      key,
      backend_kind: BackendKind::ObjectStore,
      content_type: content_type.map(str::to_string),
    })
  }

  fn url_for(&self, key: &str) -> String {
    match &self.public_url {
      Some(base) => format!("{}/{}", base, self.object_path(key)),
      None => self.object_url(key),
    }
  }

  async fn delete(&self, key: &str) -> Result<bool, StorageError> {
    let key = normalize_key(key)?;
    let response = self
      .authorize(self.client.delete(self.object_url(&key)))
      .send()
      .await?;

    let status = response.status();
    if status == StatusCode::NOT_FOUND {
      return Ok(false);
    }
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(status_error(status, &format!("DELETE {}", key), &body));
    }
    Ok(true)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_urls_with_prefix() {
    let backend = RemoteObjectBackend::new("https://s3.eu-west-1.amazonaws.com/", "media", Client::new())
      .with_prefix("/uploads/");

    assert_eq!(
      backend.object_url("profile-pictures/a.png"),
      "https://s3.eu-west-1.amazonaws.com/media/uploads/profile-pictures/a.png"
    );
    assert_eq!(
      backend.url_for("profile-pictures/a.png"),
      "https://s3.eu-west-1.amazonaws.com/media/uploads/profile-pictures/a.png"
    );
  }

  #[test]
  fn test_public_url_overrides_endpoint() {
    let backend = RemoteObjectBackend::new("https://storage.googleapis.com", "media", Client::new())
      .with_public_url(Some("https://cdn.shop.test/".to_string()));

    assert_eq!(backend.url_for("/a/b.jpg"), "https://cdn.shop.test/a/b.jpg");
  }

  #[test]
  fn test_reserved_characters_are_encoded() {
    let backend = RemoteObjectBackend::new("https://storage.googleapis.com", "media", Client::new());
    assert_eq!(
      backend.url_for("shop-images/front #2?.jpg"),
      "https://storage.googleapis.com/media/shop-images/front%20%232%3F.jpg"
    );
  }

  #[test]
  fn test_empty_token_is_ignored() {
    let backend = RemoteObjectBackend::new("http://x", "b", Client::new()).with_token(Some(String::new()));
    assert!(backend.token.is_none());
  }
}
