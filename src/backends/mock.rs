//! Mock backends for testing the batch orchestrator
//!
//! `MockBackend` implements both remote traits in memory so queue and
//! processor behavior can be exercised without a running service. It records
//! call history for verification and supports per-file failure injection.

use crate::backends::{ArchiveBackend, UploadBackend};
use crate::config::Engine;
use crate::error::{BgClientError, Result};
use crate::types::{ImageFile, ResultDescriptor};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// In-memory stand-in for the remote service
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    uploads: Arc<Mutex<Vec<String>>>,
    engines: Arc<Mutex<Vec<Engine>>>,
    archives: Arc<Mutex<Vec<Vec<String>>>>,
    failing: Arc<Mutex<HashSet<String>>>,
    delay: Option<Duration>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockBackend {
    /// Create a mock backend where every upload succeeds
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay each upload, simulating a slow remote engine. Useful for
    /// exercising mid-run behavior.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Make uploads of the named file fail until cleared
    pub fn fail_for<S: Into<String>>(&self, name: S) {
        lock(&self.failing).insert(name.into());
    }

    /// Let uploads of the named file succeed again
    pub fn clear_failure(&self, name: &str) {
        lock(&self.failing).remove(name);
    }

    /// Names of files uploaded so far, in call order
    #[must_use]
    pub fn upload_calls(&self) -> Vec<String> {
        lock(&self.uploads).clone()
    }

    /// Engine selected for each upload so far, in call order
    #[must_use]
    pub fn engine_calls(&self) -> Vec<Engine> {
        lock(&self.engines).clone()
    }

    /// Identifier lists passed to archive assembly so far
    #[must_use]
    pub fn archive_calls(&self) -> Vec<Vec<String>> {
        lock(&self.archives).clone()
    }

    /// The result identifier this mock assigns for a given file name
    #[must_use]
    pub fn result_id_for(name: &str) -> String {
        let stem = name.rsplit_once('.').map_or(name, |(stem, _)| stem);
        format!("{}_nobg.png", stem)
    }
}

#[async_trait]
impl UploadBackend for MockBackend {
    async fn upload(&self, file: &ImageFile, engine: Engine) -> Result<ResultDescriptor> {
        lock(&self.uploads).push(file.name().to_string());
        lock(&self.engines).push(engine);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if lock(&self.failing).contains(file.name()) {
            return Err(BgClientError::upload_failed(format!(
                "mock upload failure for '{}'",
                file.name()
            )));
        }
        let filename = Self::result_id_for(file.name());
        Ok(ResultDescriptor {
            original_url: Some(format!("/media/uploads/{}", file.name())),
            result_url: format!("/media/results/{}", filename),
            filename,
        })
    }
}

#[async_trait]
impl ArchiveBackend for MockBackend {
    async fn assemble(&self, filenames: &[String]) -> Result<Vec<u8>> {
        lock(&self.archives).push(filenames.to_vec());
        // A minimal payload with the ZIP local-file magic
        let mut archive = b"PK\x03\x04".to_vec();
        for name in filenames {
            archive.extend_from_slice(name.as_bytes());
        }
        Ok(archive)
    }
}
