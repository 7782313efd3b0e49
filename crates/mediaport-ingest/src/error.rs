use std::path::PathBuf;

use mediaport_storage::StorageError;
use thiserror::Error;

/// Errors that can occur while ingesting a single item.
#[derive(Debug, Error)]
pub enum IngestionError {
  /// The source is neither an http(s) URL nor an existing local file.
  #[error("invalid source '{input}': {reason}")]
  InvalidSource { input: String, reason: String },

  /// Network failure, timeout, non-success status, or empty body.
  #[error("fetch failed for {url}: {message}")]
  FetchFailed {
    url: String,
    status: Option<u16>,
    message: String,
  },

  /// A local file could not be read.
  #[error("failed to read {}: {source}", .path.display())]
  ReadFailed {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// The backend rejected the write.
  #[error(transparent)]
  Storage(#[from] StorageError),
}

/// Coarse classification of an [`IngestionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestionErrorKind {
  InvalidSource,
  FetchFailed,
  ReadFailed,
  Storage,
}

impl IngestionError {
  pub fn kind(&self) -> IngestionErrorKind {
    match self {
      Self::InvalidSource { .. } => IngestionErrorKind::InvalidSource,
      Self::FetchFailed { .. } => IngestionErrorKind::FetchFailed,
      Self::ReadFailed { .. } => IngestionErrorKind::ReadFailed,
      Self::Storage(_) => IngestionErrorKind::Storage,
    }
  }

  /// HTTP status of a failed fetch, when one was received.
  pub fn status(&self) -> Option<u16> {
    match self {
      Self::FetchFailed { status, .. } => *status,
      _ => None,
    }
  }

  pub(crate) fn invalid(input: &str, reason: impl Into<String>) -> Self {
    Self::InvalidSource {
      input: input.to_string(),
      reason: reason.into(),
    }
  }
}
