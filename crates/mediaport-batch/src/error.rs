use std::path::PathBuf;

use thiserror::Error;

/// Errors that stop a batch before any item runs.
#[derive(Debug, Error)]
pub enum BatchError {
  #[error("source directory does not exist or is not a directory: {}", .0.display())]
  InvalidRoot(PathBuf),

  #[error("failed to enumerate {}: {source}", .path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}
