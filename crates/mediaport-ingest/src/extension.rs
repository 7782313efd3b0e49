use std::path::Path;

/// Extension used when nothing better is known.
const DEFAULT_EXTENSION: &str = "jpg";

/// Pick a file extension for a declared content type.
///
/// Checked in order: `png`, `jpeg`/`jpg`, `gif`, `webp`. Anything else,
/// including a missing header, maps to `jpg`.
pub fn extension_for_content_type(content_type: Option<&str>) -> &'static str {
  let Some(ct) = content_type else {
    return DEFAULT_EXTENSION;
  };
  let ct = ct.to_ascii_lowercase();

  if ct.contains("png") {
    "png"
  } else if ct.contains("jpeg") || ct.contains("jpg") {
    "jpg"
  } else if ct.contains("gif") {
    "gif"
  } else if ct.contains("webp") {
    "webp"
  } else {
    DEFAULT_EXTENSION
  }
}

/// Known image extension of a local file, normalized (`jpeg` becomes `jpg`).
pub fn extension_for_path(path: &Path) -> Option<&'static str> {
  let ext = path.extension()?.to_str()?.to_ascii_lowercase();
  match ext.as_str() {
    "png" => Some("png"),
    "jpg" | "jpeg" => Some("jpg"),
    "gif" => Some("gif"),
    "webp" => Some("webp"),
    _ => None,
  }
}

/// Content type for a stored file extension.
pub fn content_type_for_extension(ext: &str) -> Option<&'static str> {
  match ext.to_ascii_lowercase().as_str() {
    "png" => Some("image/png"),
    "jpg" | "jpeg" => Some("image/jpeg"),
    "gif" => Some("image/gif"),
    "webp" => Some("image/webp"),
    "svg" => Some("image/svg+xml"),
    "pdf" => Some("application/pdf"),
    _ => None,
  }
}
