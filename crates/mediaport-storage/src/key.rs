use crate::error::StorageError;

/// Normalize a backend-relative key.
///
/// Backslashes become `/`, leading `./` and `/` are stripped, and keys that
/// are empty or contain a `..` segment are rejected.
pub fn normalize_key(key: &str) -> Result<String, StorageError> {
  let unified = key.replace('\\', "/");
  let trimmed = unified.trim_start_matches("./").trim_start_matches('/');

  if trimmed.is_empty() {
    return Err(StorageError::InvalidKey(key.to_string()));
  }

  let mut segments = Vec::new();
  for segment in trimmed.split('/') {
    match segment {
      "" | "." => continue,
      ".." => return Err(StorageError::InvalidKey(key.to_string())),
      s => segments.push(s),
    }
  }

  if segments.is_empty() {
    return Err(StorageError::InvalidKey(key.to_string()));
  }

  Ok(segments.join("/"))
}

/// Percent-encode each segment of a key for use in a URL path.
pub(crate) fn encode_key_path(key: &str) -> String {
  key
    .trim_start_matches('/')
    .split('/')
    .map(|segment| urlencoding::encode(segment).into_owned())
    .collect::<Vec<_>>()
    .join("/")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_encode_key_path_keeps_separators() {
    assert_eq!(encode_key_path("profile-pictures/a.png"), "profile-pictures/a.png");
    assert_eq!(
      encode_key_path("/shop-images/front #2?.jpg"),
      "shop-images/front%20%232%3F.jpg"
    );
  }

  #[test]
  fn test_normalize_key() {
    assert_eq!(normalize_key("profile-pictures/a.png").unwrap(), "profile-pictures/a.png");
    assert_eq!(normalize_key("/admin-profiles//b.jpg").unwrap(), "admin-profiles/b.jpg");
    assert_eq!(normalize_key("shop\\c.gif").unwrap(), "shop/c.gif");
    assert_eq!(normalize_key("./x/./y.webp").unwrap(), "x/y.webp");
  }

  #[test]
  fn test_rejects_escaping_keys() {
    assert!(matches!(normalize_key("../etc/passwd"), Err(StorageError::InvalidKey(_))));
    assert!(matches!(normalize_key("a/../../b"), Err(StorageError::InvalidKey(_))));
    assert!(matches!(normalize_key(""), Err(StorageError::InvalidKey(_))));
    assert!(matches!(normalize_key("/"), Err(StorageError::InvalidKey(_))));
  }
}
