use std::sync::Mutex;

type Clock = Box<dyn Fn() -> i64 + Send + Sync>;

/// Generates `<folder>/<owner>_<millis>.<ext>` keys.
///
/// Stamps are wall-clock milliseconds, bumped by one whenever the clock has
/// not advanced since the last key, so every key issued by one generator is
/// unique even within the same millisecond.
pub struct KeyGenerator {
  last: Mutex<i64>,
  clock: Clock,
}

impl std::fmt::Debug for KeyGenerator {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("KeyGenerator").finish_non_exhaustive()
  }
}

impl Default for KeyGenerator {
  fn default() -> Self {
    Self::with_clock(|| chrono::Utc::now().timestamp_millis())
  }
}

impl KeyGenerator {
  pub fn new() -> Self {
    Self::default()
  }

  /// Use a custom millisecond clock.
  pub fn with_clock(clock: impl Fn() -> i64 + Send + Sync + 'static) -> Self {
    Self {
      last: Mutex::new(i64::MIN),
      clock: Box::new(clock),
    }
  }

  fn next_stamp(&self) -> i64 {
    let now = (self.clock)();
    let mut last = self.last.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let stamp = if now > *last { now } else { *last + 1 };
    *last = stamp;
    stamp
  }

  /// Build a fresh key. Characters outside `[A-Za-z0-9_-]` in the owner id become `_`.
  pub fn generate(&self, folder: &str, owner_id: &str, extension: &str) -> String {
    let owner: String = owner_id
      .chars()
      .map(|c| {
        if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
          c
        } else {
          '_'
        }
      })
      .collect();
    let file_name = format!("{}_{}.{}", owner, self.next_stamp(), extension);

    let folder = folder.trim_matches('/');
    if folder.is_empty() {
      file_name
    } else {
      format!("{}/{}", folder, file_name)
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_key_layout() {
    let keys = KeyGenerator::with_clock(|| 1_700_000_000_123);
    assert_eq!(
      keys.generate("profile-pictures", "42", "png"),
      "profile-pictures/42_1700000000123.png"
    );
  }

  #[test]
  fn test_empty_folder_has_no_leading_slash() {
    let keys = KeyGenerator::with_clock(|| 5);
    assert_eq!(keys.generate("", "7", "jpg"), "7_5.jpg");
    assert_eq!(keys.generate("/", "7", "jpg"), "7_6.jpg");
  }

  #[test]
  fn test_frozen_clock_never_repeats() {
    let keys = KeyGenerator::with_clock(|| 1_000);
    let first = keys.generate("p", "1", "jpg");
    let second = keys.generate("p", "1", "jpg");
    let third = keys.generate("p", "1", "jpg");

    assert_eq!(first, "p/1_1000.jpg");
    assert_eq!(second, "p/1_1001.jpg");
    assert_eq!(third, "p/1_1002.jpg");
  }

  #[test]
  fn test_owner_id_is_sanitized() {
    let keys = KeyGenerator::with_clock(|| 1);
    assert_eq!(keys.generate("f", "../evil id", "gif"), "f/___evil_id_1.gif");
  }

  #[test]
  fn test_real_clock_keys_are_distinct() {
    let keys = KeyGenerator::new();
    let generated: std::collections::HashSet<_> =
      (0..100).map(|_| keys.generate("p", "9", "jpg")).collect();
    assert_eq!(generated.len(), 100);
  }
}
