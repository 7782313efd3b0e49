use thiserror::Error;

/// Error type for storage backend operations.
#[derive(Debug, Error)]
pub enum StorageError {
  /// The backend could not be reached, timed out, or failed server-side.
  #[error("storage unavailable: {0}")]
  Unavailable(String),

  /// Credentials were rejected.
  #[error("storage authentication failed: {0}")]
  AuthFailed(String),

  /// The requested object or remote resource does not exist.
  #[error("not found: {0}")]
  NotFound(String),

  /// The backend cannot perform this operation.
  #[error("{operation} is not supported by the {backend} backend")]
  Unsupported {
    backend: &'static str,
    operation: &'static str,
  },

  /// The key is empty, absolute, or escapes the backend root.
  #[error("invalid storage key: {0}")]
  InvalidKey(String),

  /// A local filesystem error occurred.
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for StorageError {
  fn from(err: reqwest::Error) -> Self {
    if err.is_timeout() {
      StorageError::Unavailable(format!("request timed out: {}", err))
    } else {
      StorageError::Unavailable(err.to_string())
    }
  }
}
