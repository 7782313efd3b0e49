use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use mediaport_storage::{StorageBackend, StoredAsset, normalize_key};
use tracing::{info, warn};
use url::Url;

use crate::error::IngestionError;
use crate::extension::{content_type_for_extension, extension_for_content_type, extension_for_path};
use crate::fetch::Fetcher;
use crate::key::KeyGenerator;
use crate::request::IngestionRequest;
use crate::source::{Source, validate_source};

/// One way of getting a source into the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestStrategy {
  /// The backend fetches the URL itself.
  DirectUrl,
  /// Download here, then `put` the bytes.
  Download,
  /// Read a local file, then `put` the bytes.
  ReadLocal,
}

/// A strategy that failed before a later one succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyFailure {
  pub strategy: IngestStrategy,
  pub reason: String,
}

/// Result of a successful ingestion with diagnostics.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
  pub asset: StoredAsset,
  /// The strategy that produced `asset`.
  pub strategy: IngestStrategy,
  /// Strategies tried and abandoned first, in order.
  pub fallbacks: Vec<StrategyFailure>,
}

/// Moves a remote or local image into a storage backend.
///
/// # Usage
///
/// ```ignore
/// let pipeline = AvatarIngestionPipeline::new(disks.public(), Arc::new(HttpFetcher::new()?));
/// let request = IngestionRequest::new(avatar_url, user_id, "profile-pictures");
/// let asset = pipeline.ingest(&request).await?;
/// // persist `asset.key` against the user
/// ```
pub struct AvatarIngestionPipeline {
  backend: Arc<dyn StorageBackend>,
  fetcher: Arc<dyn Fetcher>,
  keys: KeyGenerator,
}

impl AvatarIngestionPipeline {
  pub fn new(backend: Arc<dyn StorageBackend>, fetcher: Arc<dyn Fetcher>) -> Self {
    Self {
      backend,
      fetcher,
      keys: KeyGenerator::new(),
    }
  }

  #[must_use]
  pub fn with_key_generator(mut self, keys: KeyGenerator) -> Self {
    self.keys = keys;
    self
  }

  /// The backend assets are written to.
  pub fn backend(&self) -> &Arc<dyn StorageBackend> {
    &self.backend
  }

  /// Validate a request without fetching or writing anything.
  pub async fn validate(&self, request: &IngestionRequest) -> Result<Source, IngestionError> {
    if let Some(target) = &request.target_key {
      normalize_key(target)
        .map_err(|e| IngestionError::invalid(&request.source, format!("bad target key: {}", e)))?;
    }
    validate_source(&request.source).await
  }

  /// Strategies to try for a validated source, in order.
  pub fn plan(&self, source: &Source, request: &IngestionRequest) -> Vec<IngestStrategy> {
    match source {
      Source::Remote(_) if self.backend.supports_url_ingest() && request.target_key.is_none() => {
        vec![IngestStrategy::DirectUrl, IngestStrategy::Download]
      }
      Source::Remote(_) => vec![IngestStrategy::Download],
      Source::Local(_) => vec![IngestStrategy::ReadLocal],
    }
  }

  /// Ingest one item and return the stored asset.
  pub async fn ingest(&self, request: &IngestionRequest) -> Result<StoredAsset, IngestionError> {
    self.ingest_detailed(request).await.map(|outcome| outcome.asset)
  }

  /// Ingest one item, reporting which strategy won and which were abandoned.
  pub async fn ingest_detailed(
    &self,
    request: &IngestionRequest,
  ) -> Result<IngestOutcome, IngestionError> {
    let source = self.validate(request).await?;
    let mut fallbacks = Vec::new();
    let mut last_error = None;

    for strategy in self.plan(&source, request) {
      match self.attempt(strategy, &source, request).await {
        Ok(asset) => {
          info!(
            item = %request.item_id(),
            key = %asset.key,
            strategy = ?strategy,
            "stored asset"
          );
          return Ok(IngestOutcome {
            asset,
            strategy,
            fallbacks,
          });
        }
        Err(err) => {
          warn!(
            item = %request.item_id(),
            strategy = ?strategy,
            error = %err,
            "ingestion strategy failed"
          );
          fallbacks.push(StrategyFailure {
            strategy,
            reason: err.to_string(),
          });
          last_error = Some(err);
        }
      }
    }

    Err(last_error.unwrap_or_else(|| {
      IngestionError::invalid(&request.source, "no ingestion strategy applies")
    }))
  }

  async fn attempt(
    &self,
    strategy: IngestStrategy,
    source: &Source,
    request: &IngestionRequest,
  ) -> Result<StoredAsset, IngestionError> {
    match (strategy, source) {
      (IngestStrategy::DirectUrl, Source::Remote(url)) => Ok(
        self
          .backend
          .put_from_url(url.as_str(), &request.folder)
          .await?,
      ),
      (IngestStrategy::Download, Source::Remote(url)) => self.download(url, request).await,
      (IngestStrategy::ReadLocal, Source::Local(path)) => self.read_local(path, request).await,
      _ => Err(IngestionError::invalid(
        &request.source,
        format!("strategy {:?} does not apply to this source", strategy),
      )),
    }
  }

  async fn download(&self, url: &Url, request: &IngestionRequest) -> Result<StoredAsset, IngestionError> {
    let fetched = self.fetcher.fetch(url).await?;
    if fetched.body.is_empty() {
      return Err(IngestionError::FetchFailed {
        url: url.to_string(),
        status: None,
        message: "response body was empty".to_string(),
      });
    }

    let extension = extension_for_content_type(fetched.content_type.as_deref());
    let key = self.key_for(request, extension);
    Ok(
      self
        .backend
        .put(&key, fetched.body, fetched.content_type.as_deref())
        .await?,
    )
  }

  async fn read_local(&self, path: &Path, request: &IngestionRequest) -> Result<StoredAsset, IngestionError> {
    let data = tokio::fs::read(path)
      .await
      .map_err(|source| IngestionError::ReadFailed {
        path: path.to_path_buf(),
        source,
      })?;

    let extension = extension_for_path(path).unwrap_or_else(|| extension_for_content_type(None));
    let key = self.key_for(request, extension);
    let content_type = Path::new(&key)
      .extension()
      .and_then(|e| e.to_str())
      .and_then(content_type_for_extension);

    Ok(self.backend.put(&key, Bytes::from(data), content_type).await?)
  }

  fn key_for(&self, request: &IngestionRequest, extension: &str) -> String {
    match &request.target_key {
      Some(target) => target.clone(),
      None => self.keys.generate(&request.folder, &request.owner_id, extension),
    }
  }
}
