//! Mediaport Batch
//!
//! Drives the ingestion pipeline over an ordered list of requests. Failures
//! are recorded per item and never abort the batch.

mod error;
mod legacy;
mod result;
mod runner;

pub use error::BatchError;
pub use legacy::legacy_requests;
pub use result::{BatchResult, ItemFailure, StoredItem};
pub use runner::MigrationBatchRunner;
