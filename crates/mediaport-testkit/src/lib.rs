//! Test doubles shared by the mediaport integration tests.
//!
//! Only `tests/` directories depend on this crate; unit tests inside the
//! library crates use their own local fakes.

mod backend;
mod fetcher;
mod server;

pub use backend::{RecordingBackend, UrlIngest};
pub use fetcher::ScriptedFetcher;
pub use server::{CannedResponse, RecordedRequest, TestServer};
