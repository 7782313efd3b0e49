//! Mediaport Ingest
//!
//! Transfers a remote image URL or a local file into a storage backend under a
//! generated key. The pipeline validates the source, tries an ordered list of
//! strategies (server-side URL ingest, then download-and-put), infers a file
//! extension from the declared content type, and returns the [`StoredAsset`].
//!
//! The pipeline never touches caller state. Callers persist the returned key.
//!
//! [`StoredAsset`]: mediaport_storage::StoredAsset

mod error;
mod extension;
mod fetch;
mod key;
mod pipeline;
mod request;
mod source;

pub use error::{IngestionError, IngestionErrorKind};
pub use extension::{content_type_for_extension, extension_for_content_type, extension_for_path};
pub use fetch::{FETCH_TIMEOUT, Fetched, Fetcher, HttpFetcher, USER_AGENT};
pub use key::KeyGenerator;
pub use pipeline::{AvatarIngestionPipeline, IngestOutcome, IngestStrategy, StrategyFailure};
pub use request::IngestionRequest;
pub use source::{Source, validate_source};
