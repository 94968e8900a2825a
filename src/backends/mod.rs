//! Remote engine backends
//!
//! The orchestrator talks to the remote service through two narrow traits so
//! front ends and tests can swap the HTTP transport for an in-memory double.

mod http;
mod mock;

pub use http::HttpBackend;
pub use mock::MockBackend;

use crate::config::Engine;
use crate::error::Result;
use crate::types::{ImageFile, ResultDescriptor};
use async_trait::async_trait;

/// One-shot upload of a single file to the remote background removal engine
///
/// Implementations are stateless and never retry; retry is a queue-level
/// concern handled by re-running the batch.
#[async_trait]
pub trait UploadBackend: Send + Sync {
    /// Upload one file for processing with the selected engine.
    ///
    /// # Errors
    /// - `UploadFailed` on any non-success response, malformed response body,
    ///   or transport-level failure
    async fn upload(&self, file: &ImageFile, engine: Engine) -> Result<ResultDescriptor>;
}

/// Server-side assembly of processed results into one downloadable archive
#[async_trait]
pub trait ArchiveBackend: Send + Sync {
    /// Request an archive containing the given result identifiers.
    ///
    /// # Errors
    /// - `BundleFailed` when the remote assembly call does not succeed or the
    ///   response is not a usable binary payload
    async fn assemble(&self, filenames: &[String]) -> Result<Vec<u8>>;
}
