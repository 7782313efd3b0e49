//! Integration tests for the batch runner and legacy directory migration.

use std::sync::Arc;

use mediaport_batch::{BatchError, MigrationBatchRunner, legacy_requests};
use mediaport_ingest::{AvatarIngestionPipeline, IngestionRequest};
use mediaport_testkit::{RecordingBackend, ScriptedFetcher, UrlIngest};
use tokio_util::sync::CancellationToken;

fn avatar_url(owner: usize) -> String {
  format!("https://lh3.googleusercontent.com/a/{}", owner)
}

fn avatar_requests(count: usize) -> Vec<IngestionRequest> {
  (1..=count)
    .map(|owner| IngestionRequest::new(avatar_url(owner), owner.to_string(), "profile-pictures"))
    .collect()
}

fn fetcher_for(count: usize) -> ScriptedFetcher {
  (1..=count).fold(ScriptedFetcher::new(), |fetcher, owner| {
    fetcher.with_body(&avatar_url(owner), Some("image/png"), b"png")
  })
}

fn runner(backend: &Arc<RecordingBackend>, fetcher: &Arc<ScriptedFetcher>) -> MigrationBatchRunner {
  MigrationBatchRunner::new(AvatarIngestionPipeline::new(backend.clone(), fetcher.clone()))
}

#[tokio::test]
async fn test_one_failure_does_not_stop_the_batch() {
  let backend = Arc::new(RecordingBackend::new(UrlIngest::Unsupported));
  let fetcher = Arc::new(fetcher_for(3).with_status(&avatar_url(2), 404));

  let result = runner(&backend, &fetcher)
    .run(&avatar_requests(3), false, 100)
    .await;

  assert_eq!(result.attempted, 3);
  assert_eq!(result.succeeded, 2);
  assert_eq!(result.failures.len(), 1);
  assert_eq!(result.failures[0].item_id, "2");
  assert!(result.failures[0].reason.contains("fetch failed"));

  let stored: Vec<_> = result.stored.iter().map(|s| s.item_id.as_str()).collect();
  assert_eq!(stored, vec!["1", "3"]);
  assert_eq!(fetcher.call_count(), 3);
}

#[tokio::test]
async fn test_storage_failure_skips_only_that_item() {
  let backend = Arc::new(RecordingBackend::new(UrlIngest::Unsupported).failing_on("/3_"));
  let fetcher = Arc::new(fetcher_for(5));

  let result = runner(&backend, &fetcher)
    .run(&avatar_requests(5), false, 100)
    .await;

  assert_eq!(result.attempted, 5);
  assert_eq!(result.succeeded, 4);
  assert_eq!(result.failures.len(), 1);
  assert_eq!(result.failures[0].item_id, "3");
  assert!(result.failures[0].reason.contains("storage unavailable"));

  let stored: Vec<_> = result.stored.iter().map(|s| s.item_id.as_str()).collect();
  assert_eq!(stored, vec!["1", "2", "4", "5"]);
  assert_eq!(backend.stored_keys().len(), 4);
}

#[tokio::test]
async fn test_limit_caps_attempts_in_input_order() {
  let backend = Arc::new(RecordingBackend::new(UrlIngest::Unsupported));
  let fetcher = Arc::new(fetcher_for(10));

  let result = runner(&backend, &fetcher)
    .run(&avatar_requests(10), false, 3)
    .await;

  assert_eq!(result.attempted, 3);
  assert_eq!(result.succeeded, 3);
  assert_eq!(
    fetcher.calls(),
    vec![avatar_url(1), avatar_url(2), avatar_url(3)]
  );
}

#[tokio::test]
async fn test_zero_limit_attempts_nothing() {
  let backend = Arc::new(RecordingBackend::new(UrlIngest::Unsupported));
  let fetcher = Arc::new(fetcher_for(2));

  let result = runner(&backend, &fetcher)
    .run(&avatar_requests(2), false, 0)
    .await;

  assert_eq!(result.attempted, 0);
  assert_eq!(fetcher.call_count(), 0);
}

#[tokio::test]
async fn test_dry_run_writes_nothing_and_is_repeatable() {
  let backend = Arc::new(RecordingBackend::new(UrlIngest::Succeed));
  let fetcher = Arc::new(fetcher_for(4));
  let mut items = avatar_requests(4);
  items.push(IngestionRequest::new("ftp://old.example/x.png", "5", "profile-pictures"));

  let runner = runner(&backend, &fetcher);
  let first = runner.run(&items, true, 100).await;
  let second = runner.run(&items, true, 100).await;

  for result in [&first, &second] {
    assert_eq!(result.attempted, 5);
    assert_eq!(result.succeeded, 4);
    assert_eq!(result.planned, vec!["1", "2", "3", "4"]);
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].item_id, "5");
    assert!(result.stored.is_empty());
  }

  assert_eq!(fetcher.call_count(), 0);
  assert_eq!(backend.write_attempts(), 0);
  assert!(backend.url_puts().is_empty());
}

#[tokio::test]
async fn test_cancelled_batch_stops_before_next_item() {
  let backend = Arc::new(RecordingBackend::new(UrlIngest::Unsupported));
  let fetcher = Arc::new(fetcher_for(3));
  let cancel = CancellationToken::new();
  cancel.cancel();

  let result = runner(&backend, &fetcher)
    .with_cancellation(cancel)
    .run(&avatar_requests(3), false, 100)
    .await;

  assert!(result.cancelled);
  assert_eq!(result.attempted, 0);
  assert_eq!(fetcher.call_count(), 0);
}

#[tokio::test]
async fn test_result_serializes_for_cli_output() {
  let backend = Arc::new(RecordingBackend::new(UrlIngest::Unsupported));
  let fetcher = Arc::new(fetcher_for(1));

  let result = runner(&backend, &fetcher)
    .run(&avatar_requests(1), false, 100)
    .await;
  let json = serde_json::to_value(&result).unwrap();

  assert_eq!(json["attempted"], 1);
  assert_eq!(json["succeeded"], 1);
  assert_eq!(json["failures"], serde_json::json!([]));
  assert_eq!(json["stored"][0]["item_id"], "1");
  assert!(json.get("planned").is_none());
  assert!(json.get("cancelled").is_none());
}

#[tokio::test]
async fn test_legacy_directory_keeps_relative_paths() {
  let dir = tempfile::tempdir().unwrap();
  std::fs::create_dir_all(dir.path().join("admin-profiles")).unwrap();
  std::fs::create_dir_all(dir.path().join("shop-images/2024")).unwrap();
  std::fs::write(dir.path().join("admin-profiles/a.png"), b"png").unwrap();
  std::fs::write(dir.path().join("shop-images/2024/front.jpg"), b"jpg").unwrap();
  std::fs::write(dir.path().join("readme.txt"), b"notes").unwrap();

  let items = legacy_requests(dir.path()).await.unwrap();
  let keys: Vec<_> = items.iter().filter_map(|r| r.target_key.as_deref()).collect();
  assert_eq!(
    keys,
    vec!["admin-profiles/a.png", "readme.txt", "shop-images/2024/front.jpg"]
  );

  let backend = Arc::new(RecordingBackend::new(UrlIngest::Unsupported));
  let fetcher = Arc::new(ScriptedFetcher::new());
  let result = runner(&backend, &fetcher).run(&items, false, usize::MAX).await;

  assert_eq!(result.succeeded, 3);
  assert_eq!(
    backend.stored("admin-profiles/a.png").as_deref(),
    Some(&b"png"[..])
  );
  assert_eq!(result.stored[0].asset.key, "admin-profiles/a.png");
  assert_eq!(fetcher.call_count(), 0);
}

#[tokio::test]
async fn test_missing_root_fails_before_any_item() {
  let dir = tempfile::tempdir().unwrap();
  let missing = dir.path().join("public/uploads");

  let err = legacy_requests(&missing).await.unwrap_err();
  assert!(matches!(err, BatchError::InvalidRoot(path) if path == missing));

  let file = dir.path().join("file.png");
  std::fs::write(&file, b"png").unwrap();
  assert!(matches!(
    legacy_requests(&file).await,
    Err(BatchError::InvalidRoot(_))
  ));
}

#[cfg(unix)]
#[tokio::test]
async fn test_legacy_walk_skips_symlinks() {
  let outside = tempfile::tempdir().unwrap();
  std::fs::write(outside.path().join("secret.txt"), b"secret").unwrap();

  let dir = tempfile::tempdir().unwrap();
  std::fs::create_dir_all(dir.path().join("admin-profiles")).unwrap();
  std::fs::write(dir.path().join("admin-profiles/a.png"), b"png").unwrap();
  std::os::unix::fs::symlink(dir.path(), dir.path().join("admin-profiles/loop")).unwrap();
  std::os::unix::fs::symlink(outside.path(), dir.path().join("escape")).unwrap();
  std::os::unix::fs::symlink(
    dir.path().join("admin-profiles/a.png"),
    dir.path().join("linked.png"),
  )
  .unwrap();

  let items = legacy_requests(dir.path()).await.unwrap();
  let keys: Vec<_> = items.iter().filter_map(|r| r.target_key.as_deref()).collect();
  assert_eq!(keys, vec!["admin-profiles/a.png"]);
}

#[tokio::test]
async fn test_legacy_walk_skips_hidden_entries() {
  let dir = tempfile::tempdir().unwrap();
  std::fs::create_dir_all(dir.path().join(".git")).unwrap();
  std::fs::create_dir_all(dir.path().join("shop-images")).unwrap();
  std::fs::write(dir.path().join(".git/HEAD"), b"ref").unwrap();
  std::fs::write(dir.path().join(".gitignore"), b"*").unwrap();
  std::fs::write(dir.path().join("shop-images/.DS_Store"), b"junk").unwrap();
  std::fs::write(dir.path().join("shop-images/front.jpg"), b"jpg").unwrap();

  let items = legacy_requests(dir.path()).await.unwrap();
  let keys: Vec<_> = items.iter().filter_map(|r| r.target_key.as_deref()).collect();
  assert_eq!(keys, vec!["shop-images/front.jpg"]);
}
