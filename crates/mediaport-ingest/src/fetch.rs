use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use url::Url;

use crate::error::IngestionError;

/// Client identifier sent with every download.
pub const USER_AGENT: &str = "Mozilla/5.0 (compatible; AutoRepairShop/1.0)";

/// Hard limit for a single download.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// A downloaded resource.
#[derive(Debug, Clone)]
pub struct Fetched {
  pub body: Bytes,
  pub content_type: Option<String>,
}

/// Downloads remote resources for the pipeline.
#[async_trait]
pub trait Fetcher: Send + Sync {
  /// Download `url`. Non-success statuses are errors.
  async fn fetch(&self, url: &Url) -> Result<Fetched, IngestionError>;
}

/// [`Fetcher`] backed by reqwest with a bounded timeout.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
  client: Client,
}

impl HttpFetcher {
  pub fn new() -> Result<Self, reqwest::Error> {
    Self::with_timeout(FETCH_TIMEOUT)
  }

  pub fn with_timeout(timeout: Duration) -> Result<Self, reqwest::Error> {
    let client = Client::builder()
      .timeout(timeout)
      .user_agent(USER_AGENT)
      .build()?;
    Ok(Self { client })
  }
}

#[async_trait]
impl Fetcher for HttpFetcher {
  async fn fetch(&self, url: &Url) -> Result<Fetched, IngestionError> {
    let failed = |status: Option<u16>, message: String| IngestionError::FetchFailed {
      url: url.to_string(),
      status,
      message,
    };

    let response = self.client.get(url.clone()).send().await.map_err(|e| {
      if e.is_timeout() {
        failed(None, "request timed out".to_string())
      } else {
        failed(None, e.to_string())
      }
    })?;

    let status = response.status();
    if !status.is_success() {
      return Err(failed(
        Some(status.as_u16()),
        format!("server returned {}", status),
      ));
    }

    let content_type = response
      .headers()
      .get(CONTENT_TYPE)
      .and_then(|v| v.to_str().ok())
      .map(str::to_string);

    let body = response.bytes().await.map_err(|e| {
      let message = if e.is_timeout() {
        "timed out reading body".to_string()
      } else {
        e.to_string()
      };
      failed(Some(status.as_u16()), message)
    })?;

    tracing::debug!(url = %url, bytes = body.len(), content_type = ?content_type, "fetched remote resource");

    Ok(Fetched { body, content_type })
  }
}
