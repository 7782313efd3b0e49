use std::path::PathBuf;

use url::Url;

use crate::error::IngestionError;

/// A validated ingestion source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
  Remote(Url),
  Local(PathBuf),
}

/// Check that `raw` is an http(s) URL or an existing local file.
///
/// Never touches the network. `file://` URLs are treated as local paths.
/// Surrounding whitespace is ignored for URLs but kept for paths.
pub async fn validate_source(raw: &str) -> Result<Source, IngestionError> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return Err(IngestionError::invalid(raw, "source is empty"));
  }

  let path = match Url::parse(trimmed) {
    Ok(url) => match url.scheme() {
      "http" | "https" => {
        if url.host_str().is_none_or(str::is_empty) {
          return Err(IngestionError::invalid(raw, "url has no host"));
        }
        return Ok(Source::Remote(url));
      }
      "file" => url
        .to_file_path()
        .map_err(|_| IngestionError::invalid(raw, "file url is not a valid path"))?,
      // Single-letter schemes are Windows drive letters, e.g. `C:\uploads\a.png`.
      scheme if scheme.len() == 1 => PathBuf::from(raw),
      scheme => {
        return Err(IngestionError::invalid(
          raw,
          format!("unsupported url scheme '{}'", scheme),
        ));
      }
    },
    Err(_) => PathBuf::from(raw),
  };

  match tokio::fs::metadata(&path).await {
    Ok(meta) if meta.is_file() => Ok(Source::Local(path)),
    Ok(_) => Err(IngestionError::invalid(raw, "path is not a regular file")),
    Err(e) => Err(IngestionError::invalid(
      raw,
      format!("not a url and not a readable file ({})", e),
    )),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::IngestionErrorKind;

  #[tokio::test]
  async fn test_http_urls_are_remote() {
    let source = validate_source("https://lh3.googleusercontent.com/a/photo=s96-c")
      .await
      .unwrap();
    assert!(matches!(source, Source::Remote(url) if url.host_str() == Some("lh3.googleusercontent.com")));
  }

  #[tokio::test]
  async fn test_trailing_space_in_file_name_is_kept() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("front.png ");
    std::fs::write(&file, b"x").unwrap();

    let source = validate_source(file.to_str().unwrap()).await.unwrap();
    assert_eq!(source, Source::Local(file));

    let source = validate_source("  https://example.com/a.png ").await.unwrap();
    assert!(matches!(source, Source::Remote(_)));
  }

  #[tokio::test]
  async fn test_existing_file_is_local() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("a.png");
    std::fs::write(&file, b"x").unwrap();

    let source = validate_source(file.to_str().unwrap()).await.unwrap();
    assert_eq!(source, Source::Local(file.clone()));

    let url = Url::from_file_path(&file).unwrap();
    let source = validate_source(url.as_str()).await.unwrap();
    assert_eq!(source, Source::Local(file));
  }

  #[tokio::test]
  async fn test_invalid_sources() {
    let dir = tempfile::tempdir().unwrap();
    let cases = [
      String::new(),
      "   ".to_string(),
      "not a url".to_string(),
      "mailto:someone@example.com".to_string(),
      "ftp://example.com/a.png".to_string(),
      dir.path().to_string_lossy().into_owned(),
      dir.path().join("missing.png").to_string_lossy().into_owned(),
    ];

    for case in cases {
      let err = validate_source(&case).await.unwrap_err();
      assert_eq!(err.kind(), IngestionErrorKind::InvalidSource, "case: {:?}", case);
    }
  }
}
