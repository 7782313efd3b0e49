use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use mediaport_ingest::{Fetched, Fetcher, IngestionError};
use url::Url;

#[derive(Debug, Clone)]
enum Scripted {
  Body {
    body: Bytes,
    content_type: Option<String>,
  },
  Status(u16),
}

/// A [`Fetcher`] answering from a fixed table and counting calls.
///
/// Unknown URLs fail with a 404.
#[derive(Debug, Default)]
pub struct ScriptedFetcher {
  responses: HashMap<String, Scripted>,
  calls: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
  pub fn new() -> Self {
    Self::default()
  }

  #[must_use]
  pub fn with_body(mut self, url: &str, content_type: Option<&str>, body: &[u8]) -> Self {
    self.responses.insert(
      normalize(url),
      Scripted::Body {
        body: Bytes::copy_from_slice(body),
        content_type: content_type.map(str::to_string),
      },
    );
    self
  }

  #[must_use]
  pub fn with_status(mut self, url: &str, status: u16) -> Self {
    self.responses.insert(normalize(url), Scripted::Status(status));
    self
  }

  /// URLs fetched so far, in order.
  pub fn calls(&self) -> Vec<String> {
    self.calls.lock().unwrap().clone()
  }

  pub fn call_count(&self) -> usize {
    self.calls.lock().unwrap().len()
  }
}

fn normalize(url: &str) -> String {
  Url::parse(url).map(|u| u.to_string()).unwrap_or_else(|_| url.to_string())
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
  async fn fetch(&self, url: &Url) -> Result<Fetched, IngestionError> {
    self.calls.lock().unwrap().push(url.to_string());

    match self.responses.get(url.as_str()) {
      Some(Scripted::Body { body, content_type }) => Ok(Fetched {
        body: body.clone(),
        content_type: content_type.clone(),
      }),
      Some(Scripted::Status(status)) => Err(IngestionError::FetchFailed {
        url: url.to_string(),
        status: Some(*status),
        message: format!("server returned {}", status),
      }),
      None => Err(IngestionError::FetchFailed {
        url: url.to_string(),
        status: Some(404),
        message: "no scripted response".to_string(),
      }),
    }
  }
}
