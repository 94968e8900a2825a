#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]

//! # Background Removal Client
//!
//! Client library for a remote image background-removal service, with a
//! batch orchestrator at its core: enqueue a set of images, drive them
//! through the remote engine one at a time, tolerate per-item failures, and
//! bundle the successful results into one downloadable archive.
//!
//! ## Features
//!
//! - **Batch orchestration**: sequential processing with per-item status
//!   tracking, idempotent resume, and manual retry by re-running
//! - **Partial-failure tolerance**: one item's failure never aborts the run
//! - **Two engines**: `withoutbg` and `rembg` backends selected per session
//! - **Result bundling**: server-assembled archive of all successful results
//! - **Single-image flow**: one-shot upload, recomposite, and download
//! - **Pluggable transport**: mock backend for driving the orchestrator in
//!   tests or alternative front ends
//! - **CLI Integration**: optional command-line interface (enable with the
//!   `cli` feature)
//!
//! ## Quick Start
//!
//! ### Batch processing
//!
//! ```rust,no_run
//! use bgremove_client::{BatchSession, ClientConfig, Engine, ImageFile};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ClientConfig::builder()
//!     .base_url("https://bg.example.com")
//!     .engine(Engine::WithoutBg)
//!     .build()?;
//!
//! let session = BatchSession::new(&config)?;
//! session.enqueue(vec![
//!     ImageFile::from_path("cat.jpg")?,
//!     ImageFile::from_path("dog.png")?,
//! ]);
//!
//! let summary = session.run().await?;
//! println!("{} processed, {} failed", summary.completed.len(), summary.failed);
//!
//! if let Some(path) = session.bundle_to_dir(".".as_ref()).await? {
//!     println!("archive saved to {}", path.display());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ### Single image
//!
//! ```rust,no_run
//! use bgremove_client::{remove_background, ClientConfig};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ClientConfig::default();
//! let result = remove_background("portrait.jpg", &config).await?;
//! println!("processed rendition at {}", result.result_url);
//! # Ok(())
//! # }
//! ```

pub mod backends;
pub mod bundler;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod processor;
pub mod queue;
pub mod services;
pub mod session;
pub mod types;

// Public API exports
pub use backends::{ArchiveBackend, HttpBackend, MockBackend, UploadBackend};
pub use bundler::ResultBundler;
pub use config::{ClientConfig, ClientConfigBuilder, Engine};
pub use error::{BgClientError, Result};
pub use processor::{BatchProcessor, RunFlag};
pub use queue::BatchQueue;
pub use services::{progress_fraction, BatchObserver, ConsoleObserver, NoOpObserver};
pub use session::BatchSession;
pub use types::{
    ImageFile, ItemId, ItemStatus, QueueItem, ResultDescriptor, RunSummary,
    ACCEPTED_MEDIA_TYPES,
};

/// Remove the background from a single image file
///
/// This is the one-shot single-image flow: the file is validated against the
/// accepted media types (unlike batch intake, an unaccepted type is an
/// explicit error here), uploaded, and the remote result descriptor returned.
///
/// # Errors
/// - `UnsupportedMediaType` when the file's declared type is not accepted
/// - `UploadFailed` on remote or transport failure
pub async fn remove_background<P: AsRef<std::path::Path>>(
    path: P,
    config: &ClientConfig,
) -> Result<ResultDescriptor> {
    let file = ImageFile::from_path(path)?;
    remove_background_from_file(file, config).await
}

/// Remove the background from an in-memory image
///
/// Suitable for callers that already hold the bytes, e.g. clipboard paste or
/// drag-and-drop capture.
///
/// # Errors
/// - `UnsupportedMediaType` when the declared type is not accepted
/// - `UploadFailed` on remote or transport failure
pub async fn remove_background_from_bytes(
    data: Vec<u8>,
    name: &str,
    media_type: &str,
    config: &ClientConfig,
) -> Result<ResultDescriptor> {
    remove_background_from_file(ImageFile::new(name, media_type, data), config).await
}

async fn remove_background_from_file(
    file: ImageFile,
    config: &ClientConfig,
) -> Result<ResultDescriptor> {
    if !file.is_supported() {
        return Err(BgClientError::unsupported_media_type(format!(
            "'{}' ({}). Please use JPEG, PNG, or WebP images",
            file.name(),
            file.media_type()
        )));
    }
    let backend = HttpBackend::new(config)?;
    backend.upload(&file, config.engine).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_single_mode_rejects_unsupported_type() {
        let config = ClientConfig::default();
        let err = remove_background_from_bytes(vec![1, 2, 3], "notes.txt", "text/plain", &config)
            .await
            .unwrap_err();
        assert!(matches!(err, BgClientError::UnsupportedMediaType(_)));
    }
}
