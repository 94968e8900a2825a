//! Assembly of processed results into one downloadable archive

use crate::backends::ArchiveBackend;
use crate::error::{BgClientError, Result};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Requests a server-assembled archive of processed results and saves it
/// locally. Item state is never touched here: a failed bundle is retried by
/// simply calling [`ResultBundler::bundle`] again.
pub struct ResultBundler {
    backend: Arc<dyn ArchiveBackend>,
}

impl ResultBundler {
    /// Create a bundler over the given archive backend
    #[must_use]
    pub fn new(backend: Arc<dyn ArchiveBackend>) -> Self {
        Self { backend }
    }

    /// Default archive name, carrying a creation timestamp for uniqueness
    #[must_use]
    pub fn default_file_name() -> String {
        format!("bgremove-batch-{}.zip", Utc::now().timestamp_millis())
    }

    /// Request an archive of the given result identifiers.
    ///
    /// An empty identifier list is a no-op (`Ok(None)`) rather than an error;
    /// no network call is made.
    ///
    /// # Errors
    /// - `BundleFailed` when the remote assembly call does not succeed
    pub async fn bundle(&self, result_ids: &[String]) -> Result<Option<Vec<u8>>> {
        if result_ids.is_empty() {
            log::debug!("No results to bundle");
            return Ok(None);
        }
        let archive = self.backend.assemble(result_ids).await?;
        Ok(Some(archive))
    }

    /// Bundle and save the archive under `dir` with the default file name.
    /// Returns the written path, or `None` when there was nothing to bundle.
    ///
    /// # Errors
    /// - `BundleFailed` when the remote assembly call does not succeed
    /// - IO errors writing the archive to disk
    pub async fn bundle_to_dir(&self, result_ids: &[String], dir: &Path) -> Result<Option<PathBuf>> {
        let Some(archive) = self.bundle(result_ids).await? else {
            return Ok(None);
        };
        let path = dir.join(Self::default_file_name());
        tokio::fs::write(&path, &archive)
            .await
            .map_err(|e| BgClientError::file_io_error("write archive", &path, e))?;
        log::info!("Saved archive of {} result(s) to {}", result_ids.len(), path.display());
        Ok(Some(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MockBackend;

    #[tokio::test]
    async fn test_empty_bundle_is_noop_without_network() {
        let backend = MockBackend::new();
        let bundler = ResultBundler::new(Arc::new(backend.clone()));

        let result = bundler.bundle(&[]).await.unwrap();
        assert!(result.is_none());
        assert!(backend.archive_calls().is_empty());
    }

    #[tokio::test]
    async fn test_bundle_returns_binary_payload() {
        let backend = MockBackend::new();
        let bundler = ResultBundler::new(Arc::new(backend.clone()));
        let ids = vec!["a_nobg.png".to_string(), "b_nobg.png".to_string()];

        let archive = bundler.bundle(&ids).await.unwrap().unwrap();
        assert!(!archive.is_empty());
        assert_eq!(backend.archive_calls(), vec![ids]);
    }

    #[tokio::test]
    async fn test_bundle_to_dir_writes_archive() {
        let dir = tempfile::tempdir().unwrap();
        let bundler = ResultBundler::new(Arc::new(MockBackend::new()));
        let ids = vec!["a_nobg.png".to_string()];

        let path = bundler
            .bundle_to_dir(&ids, dir.path())
            .await
            .unwrap()
            .unwrap();
        assert!(path.exists());
        let contents = std::fs::read(&path).unwrap();
        assert!(contents.starts_with(b"PK"));

        // Empty input writes nothing
        let none = bundler.bundle_to_dir(&[], dir.path()).await.unwrap();
        assert!(none.is_none());
    }

    #[test]
    fn test_default_file_name_shape() {
        let name = ResultBundler::default_file_name();
        assert!(name.starts_with("bgremove-batch-"));
        assert!(name.ends_with(".zip"));
        let stamp = &name["bgremove-batch-".len()..name.len() - ".zip".len()];
        assert!(stamp.chars().all(|c| c.is_ascii_digit()));
    }
}
