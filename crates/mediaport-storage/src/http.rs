use std::time::Duration;

use reqwest::{Client, StatusCode};

use crate::error::StorageError;

/// Upper bound for any single backend request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Build the HTTP client shared by remote backends.
pub fn http_client() -> Result<Client, reqwest::Error> {
  Client::builder().timeout(REQUEST_TIMEOUT).build()
}

/// Map a non-success response status to a storage error.
pub(crate) fn status_error(status: StatusCode, context: &str, body: &str) -> StorageError {
  let detail = if body.trim().is_empty() {
    format!("{} returned {}", context, status)
  } else {
    format!("{} returned {}: {}", context, status, truncate(body.trim(), 200))
  };

  match status {
    StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StorageError::AuthFailed(detail),
    StatusCode::NOT_FOUND => StorageError::NotFound(detail),
    _ => StorageError::Unavailable(detail),
  }
}

fn truncate(s: &str, max: usize) -> &str {
  match s.char_indices().nth(max) {
    Some((idx, _)) => &s[..idx],
    None => s,
  }
}
