use std::path::{Path, PathBuf};

use mediaport_ingest::IngestionRequest;
use tokio::fs;

use crate::error::BatchError;

/// One request per file under `root`, keyed by its path relative to `root`.
///
/// Entries are sorted by name within each directory so runs are repeatable.
/// Symlinks and hidden entries (names starting with `.`) are skipped.
/// A missing or non-directory root fails before anything is returned.
pub async fn legacy_requests(root: &Path) -> Result<Vec<IngestionRequest>, BatchError> {
  match fs::metadata(root).await {
    Ok(meta) if meta.is_dir() => {}
    _ => return Err(BatchError::InvalidRoot(root.to_path_buf())),
  }

  let mut files = Vec::new();
  collect_files(root, &mut files).await?;

  Ok(
    files
      .into_iter()
      .map(|path| {
        let key = relative_key(root, &path);
        IngestionRequest::legacy_file(&path, key)
      })
      .collect(),
  )
}

async fn collect_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), BatchError> {
  let io_err = |source| BatchError::Io {
    path: dir.to_path_buf(),
    source,
  };

  let mut entries = fs::read_dir(dir).await.map_err(io_err)?;
  let mut children = Vec::new();
  while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
    if entry.file_name().to_string_lossy().starts_with('.') {
      continue;
    }
    // `DirEntry::file_type` does not follow symlinks.
    let file_type = entry.file_type().await.map_err(io_err)?;
    if !file_type.is_symlink() {
      children.push((entry.path(), file_type));
    }
  }
  children.sort_by(|a, b| a.0.cmp(&b.0));

  for (path, file_type) in children {
    if file_type.is_dir() {
      Box::pin(collect_files(&path, files)).await?;
    } else if file_type.is_file() {
      files.push(path);
    }
  }

  Ok(())
}

fn relative_key(root: &Path, path: &Path) -> String {
  let relative = path.strip_prefix(root).unwrap_or(path);
  relative
    .components()
    .map(|c| c.as_os_str().to_string_lossy())
    .collect::<Vec<_>>()
    .join("/")
}
