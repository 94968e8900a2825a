//! Command facade binding queue, processor, and bundler for one client session
//!
//! All mutable state of the batch flow (queue, engine selection, activity
//! flag) lives in explicit fields of one `BatchSession` constructed per user
//! session; there are no ambient singletons. Any front end drives the same
//! command surface: `enqueue`, `run`, `clear`, `set_engine`, `bundle`.

use crate::backends::{ArchiveBackend, HttpBackend, UploadBackend};
use crate::bundler::ResultBundler;
use crate::config::{ClientConfig, Engine};
use crate::error::{BgClientError, Result};
use crate::processor::{BatchProcessor, RunFlag};
use crate::queue::BatchQueue;
use crate::services::BatchObserver;
use crate::types::{ImageFile, QueueItem, RunSummary};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// One batch-processing session against a remote background removal service
pub struct BatchSession {
    queue: BatchQueue,
    processor: BatchProcessor,
    bundler: ResultBundler,
    upload_backend: Arc<dyn UploadBackend>,
    engine: Mutex<Engine>,
    flag: RunFlag,
}

impl BatchSession {
    /// Create a session backed by the HTTP transport
    ///
    /// # Errors
    /// - Invalid configuration
    /// - Failed to create the HTTP client
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let backend = Arc::new(HttpBackend::new(config)?);
        Ok(Self::with_backends(
            backend.clone(),
            backend,
            config.engine,
        ))
    }

    /// Create a session over explicit backends, e.g. mocks in tests
    #[must_use]
    pub fn with_backends(
        upload: Arc<dyn UploadBackend>,
        archive: Arc<dyn ArchiveBackend>,
        engine: Engine,
    ) -> Self {
        let flag = RunFlag::new();
        Self {
            queue: BatchQueue::new(flag.clone()),
            processor: BatchProcessor::new(upload.clone(), flag.clone()),
            bundler: ResultBundler::new(archive),
            upload_backend: upload,
            engine: Mutex::new(engine),
            flag,
        }
    }

    /// Attach an observer for status and progress notifications
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn BatchObserver>) -> Self {
        self.processor = BatchProcessor::new(self.upload_backend.clone(), self.flag.clone())
            .with_observer(observer);
        self
    }

    fn engine_slot(&self) -> MutexGuard<'_, Engine> {
        self.engine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append candidate files to the queue; returns the accepted count.
    /// Permitted at any time, including while a run is active.
    pub fn enqueue(&self, files: Vec<ImageFile>) -> usize {
        self.queue.enqueue(files)
    }

    /// Cloned read view of the queue in insertion order
    #[must_use]
    pub fn items(&self) -> Vec<QueueItem> {
        self.queue.items()
    }

    /// Number of items in the queue
    #[must_use]
    pub fn size(&self) -> usize {
        self.queue.size()
    }

    /// Whether a batch run is currently active
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.flag.is_active()
    }

    /// The engine the next run will use
    #[must_use]
    pub fn engine(&self) -> Engine {
        *self.engine_slot()
    }

    /// Select the engine for future runs.
    ///
    /// # Errors
    /// - `InvalidState` while a run is active; the engine is fixed for the
    ///   duration of a run
    pub fn set_engine(&self, engine: Engine) -> Result<()> {
        // The flag is checked under the slot lock; see `run` for the pairing.
        let mut slot = self.engine_slot();
        if self.flag.is_active() {
            return Err(BgClientError::invalid_state(
                "cannot change engine while a batch run is active",
            ));
        }
        *slot = engine;
        Ok(())
    }

    /// Remove all items from the queue.
    ///
    /// # Errors
    /// - `InvalidState` while a run is active
    pub fn clear(&self) -> Result<()> {
        self.queue.clear()
    }

    /// Run one sequential pass over the queue's eligible items.
    ///
    /// # Errors
    /// - `AlreadyRunning` when a prior run has not completed
    pub async fn run(&self) -> Result<RunSummary> {
        // Acquire the flag while holding the engine slot, then copy the
        // engine. A concurrent `set_engine` either lands before the copy or
        // sees the active flag and fails; an accepted change always applies.
        let (engine, guard) = {
            let slot = self.engine_slot();
            let guard = self
                .flag
                .try_acquire()
                .ok_or(BgClientError::AlreadyRunning)?;
            (*slot, guard)
        };
        self.processor.run_guarded(&self.queue, engine, guard).await
    }

    /// Result identifiers of every `Done` item, in queue order. This is the
    /// accumulated list across runs, queryable at any time for bundling.
    #[must_use]
    pub fn results(&self) -> Vec<String> {
        self.queue
            .items()
            .iter()
            .filter_map(|item| item.result().map(|r| r.filename.clone()))
            .collect()
    }

    /// Bundle all accumulated results into one archive. `Ok(None)` when
    /// there is nothing to bundle.
    ///
    /// # Errors
    /// - `BundleFailed` when the remote assembly call does not succeed
    pub async fn bundle(&self) -> Result<Option<Vec<u8>>> {
        self.bundler.bundle(&self.results()).await
    }

    /// Bundle all accumulated results and save the archive under `dir`.
    ///
    /// # Errors
    /// - `BundleFailed` when the remote assembly call does not succeed
    /// - IO errors writing the archive to disk
    pub async fn bundle_to_dir(&self, dir: &Path) -> Result<Option<PathBuf>> {
        self.bundler.bundle_to_dir(&self.results(), dir).await
    }
}
