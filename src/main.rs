use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use mediaport_batch::{MigrationBatchRunner, legacy_requests};
use mediaport_config::StorageConfig;
use mediaport_ingest::{AvatarIngestionPipeline, HttpFetcher, IngestionRequest};
use mediaport_storage::{AssetCategory, AssetUrls, Disks, StorageBackend};

/// Mediaport - move images into the configured storage disk
#[derive(Parser)]
#[command(name = "mediaport")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the storage config (default: ~/.mediaport/config.json, else environment)
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  /// Disk to use instead of the configured default
  #[arg(long, global = true)]
  disk: Option<String>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Copy remote avatar URLs into storage
  BackfillAvatars {
    /// JSON file with `[{"owner_id", "avatar_url"}]` (default: stdin)
    #[arg(long)]
    input: Option<PathBuf>,

    /// Maximum number of items to attempt
    #[arg(long, default_value_t = 100)]
    limit: usize,

    /// Validate only; fetch and write nothing
    #[arg(long)]
    dry_run: bool,

    /// Folder generated keys are placed under
    #[arg(long, default_value = "profile-pictures")]
    folder: String,
  },

  /// Move every file under a legacy uploads directory into storage
  MigrateUploads {
    /// Directory to migrate, e.g. public/uploads
    source: PathBuf,

    /// Validate only; write nothing
    #[arg(long)]
    dry_run: bool,

    /// Maximum number of files to attempt
    #[arg(long)]
    limit: Option<usize>,
  },

  /// Print the public URL for a stored path
  Url {
    path: Option<String>,

    #[arg(long, value_enum, default_value_t = Category::ProfilePicture)]
    category: Category,
  },

  /// Delete a stored key
  Delete { key: String },

  /// List the configured disks
  Disks,
}

#[derive(Clone, Copy, ValueEnum)]
enum Category {
  ProfilePicture,
  AdminProfile,
  ShopImage,
  PaymentMethod,
  PaymentProof,
}

impl From<Category> for AssetCategory {
  fn from(category: Category) -> Self {
    match category {
      Category::ProfilePicture => AssetCategory::ProfilePicture,
      Category::AdminProfile => AssetCategory::AdminProfile,
      Category::ShopImage => AssetCategory::ShopImage,
      Category::PaymentMethod => AssetCategory::PaymentMethod,
      Category::PaymentProof => AssetCategory::PaymentProof,
    }
  }
}

/// One row of backfill input.
#[derive(Deserialize)]
struct AvatarRow {
  owner_id: serde_json::Value,
  avatar_url: Option<String>,
}

fn main() -> Result<()> {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(io::stderr)
    .init();

  let cli = Cli::parse();

  let command = match cli.command {
    Some(command) => command,
    None => {
      println!("mediaport - use --help to see available commands");
      return Ok(());
    }
  };

  let config = load_config(cli.config.as_deref())?;
  let disks = Disks::from_config(&config).context("failed to build storage disks")?;
  let backend = select_disk(&disks, cli.disk.as_deref())?;

  let rt = tokio::runtime::Runtime::new()?;
  rt.block_on(async {
    match command {
      Commands::BackfillAvatars {
        input,
        limit,
        dry_run,
        folder,
      } => backfill_avatars(backend, input, limit, dry_run, folder).await,
      Commands::MigrateUploads {
        source,
        dry_run,
        limit,
      } => migrate_uploads(backend, source, dry_run, limit).await,
      Commands::Url { path, category } => {
        println!("{}", asset_urls(backend).resolve(path.as_deref(), category.into()));
        Ok(())
      }
      Commands::Delete { key } => {
        let deleted = asset_urls(backend)
          .delete(Some(&key))
          .await
          .with_context(|| format!("failed to delete '{}'", key))?;
        println!("{}", serde_json::json!({ "key": key, "deleted": deleted }));
        Ok(())
      }
      Commands::Disks => list_disks(&disks),
    }
  })
}

fn load_config(path: Option<&Path>) -> Result<StorageConfig> {
  let default_path = dirs::home_dir().map(|home| home.join(".mediaport").join("config.json"));

  let path = match path {
    Some(path) => Some(path.to_path_buf()),
    None => default_path.filter(|p| p.is_file()),
  };

  match path {
    Some(path) => {
      let content = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
      StorageConfig::from_json_str(&content)
        .with_context(|| format!("failed to parse config file: {}", path.display()))
    }
    None => StorageConfig::from_env(std::env::vars()).context("failed to load config from environment"),
  }
}

fn select_disk(disks: &Disks, name: Option<&str>) -> Result<Arc<dyn StorageBackend>> {
  let name = match name {
    Some(name) => name,
    None => return Ok(disks.public()),
  };

  match disks.disk(name) {
    Some(disk) => Ok(disk),
    None if name == "cloud" => Ok(disks.cloud()),
    None => bail!(
      "unknown disk '{}' (configured: {})",
      name,
      disks.names().collect::<Vec<_>>().join(", ")
    ),
  }
}

fn asset_urls(backend: Arc<dyn StorageBackend>) -> AssetUrls {
  let app_url = std::env::var("APP_URL").unwrap_or_else(|_| "http://localhost".to_string());
  AssetUrls::new(backend, app_url)
}

fn batch_runner(backend: Arc<dyn StorageBackend>) -> Result<MigrationBatchRunner> {
  let fetcher = HttpFetcher::new().context("failed to create HTTP client")?;
  let pipeline = AvatarIngestionPipeline::new(backend, Arc::new(fetcher));

  let cancel = CancellationToken::new();
  let on_signal = cancel.clone();
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      warn!("interrupt received, stopping after the current item");
      on_signal.cancel();
    }
  });

  Ok(MigrationBatchRunner::new(pipeline).with_cancellation(cancel))
}

async fn backfill_avatars(
  backend: Arc<dyn StorageBackend>,
  input: Option<PathBuf>,
  limit: usize,
  dry_run: bool,
  folder: String,
) -> Result<()> {
  let content = match &input {
    Some(path) => tokio::fs::read_to_string(path)
      .await
      .with_context(|| format!("failed to read input file: {}", path.display()))?,
    None => read_stdin()?,
  };

  let rows: Vec<AvatarRow> = if content.trim().is_empty() {
    Vec::new()
  } else {
    serde_json::from_str(&content).context("failed to parse avatar list")?
  };

  let items: Vec<IngestionRequest> = rows
    .into_iter()
    .filter_map(|row| {
      let owner_id = match row.owner_id {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
      };
      match row.avatar_url.filter(|u| !u.trim().is_empty()) {
        Some(url) => Some(IngestionRequest::new(url, owner_id, folder.as_str())),
        None => {
          warn!(item = %owner_id, "no avatar url, skipping");
          None
        }
      }
    })
    .collect();

  info!(items = items.len(), "loaded avatar list");

  let result = batch_runner(backend)?.run(&items, dry_run, limit).await;
  println!("{}", serde_json::to_string_pretty(&result)?);

  Ok(())
}

async fn migrate_uploads(
  backend: Arc<dyn StorageBackend>,
  source: PathBuf,
  dry_run: bool,
  limit: Option<usize>,
) -> Result<()> {
  let items = legacy_requests(&source)
    .await
    .with_context(|| format!("cannot migrate {}", source.display()))?;

  info!(files = items.len(), source = %source.display(), "found legacy uploads");

  let result = batch_runner(backend)?
    .run(&items, dry_run, limit.unwrap_or(usize::MAX))
    .await;
  println!("{}", serde_json::to_string_pretty(&result)?);

  Ok(())
}

fn list_disks(disks: &Disks) -> Result<()> {
  let listing: Vec<serde_json::Value> = disks
    .names()
    .filter_map(|name| {
      disks.disk(name).map(|disk| {
        serde_json::json!({
          "name": name,
          "kind": disk.kind().as_str(),
          "default": name == disks.default_name(),
          "url_ingest": disk.supports_url_ingest(),
        })
      })
    })
    .collect();

  println!("{}", serde_json::to_string_pretty(&listing)?);
  Ok(())
}

fn read_stdin() -> Result<String> {
  use std::io::IsTerminal;

  if io::stdin().is_terminal() {
    // Nothing piped in
    return Ok(String::new());
  }

  let mut input = String::new();
  io::stdin()
    .read_to_string(&mut input)
    .context("failed to read avatar list from stdin")?;
  Ok(input)
}
