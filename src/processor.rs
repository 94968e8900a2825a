//! Sequential batch processor driving queue items through the remote engine
//!
//! The processor walks the queue in insertion order, uploads each eligible
//! item, and records per-item outcomes. A single item's failure never aborts
//! the run; partial-failure tolerance is the defining property of this
//! component. At most one upload is in flight at any time for a given run,
//! which bounds load on the remote engine and keeps progress reporting
//! deterministic.

use crate::backends::UploadBackend;
use crate::config::Engine;
use crate::error::{BgClientError, Result};
use crate::queue::{BatchQueue, Claim};
use crate::services::{BatchObserver, NoOpObserver};
use crate::types::{ItemStatus, RunSummary};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared activity flag for a batch run
///
/// The flag is the sole locking discipline required by the orchestrator: it
/// prevents a second concurrent run and lets the queue and session reject
/// clear or engine changes while a run is active.
#[derive(Debug, Clone, Default)]
pub struct RunFlag {
    active: Arc<AtomicBool>,
}

impl RunFlag {
    /// Create a new inactive flag
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a run currently holds the flag
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Attempt to mark a run as active. `None` when a run already holds the
    /// flag. The returned guard releases the flag on every exit path.
    pub(crate) fn try_acquire(&self) -> Option<RunGuard> {
        self.active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        Some(RunGuard {
            active: Arc::clone(&self.active),
        })
    }
}

/// RAII guard clearing the run flag on drop
pub(crate) struct RunGuard {
    active: Arc<AtomicBool>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.active.store(false, Ordering::Release);
    }
}

/// Sequential control loop over a batch queue
pub struct BatchProcessor {
    backend: Arc<dyn UploadBackend>,
    observer: Arc<dyn BatchObserver>,
    flag: RunFlag,
}

impl BatchProcessor {
    /// Create a processor over the given upload backend and run flag.
    /// Status changes are discarded until an observer is attached.
    #[must_use]
    pub fn new(backend: Arc<dyn UploadBackend>, flag: RunFlag) -> Self {
        Self {
            backend,
            observer: Arc::new(NoOpObserver),
            flag,
        }
    }

    /// Attach an observer for status and progress notifications
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn BatchObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Whether a run on this processor is currently active
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.flag.is_active()
    }

    /// Run one full sequential pass over the queue's eligible items.
    ///
    /// Items already `Done` are skipped (idempotent partial resume); `Error`
    /// items are retried. The engine is fixed for the duration of the run.
    /// Items enqueued behind the cursor while the run is in progress are
    /// picked up; items added at positions the cursor has passed wait for the
    /// next run.
    ///
    /// # Errors
    /// - `AlreadyRunning` when a prior run on this processor has not completed
    pub async fn run(&self, queue: &BatchQueue, engine: Engine) -> Result<RunSummary> {
        let guard = self
            .flag
            .try_acquire()
            .ok_or(BgClientError::AlreadyRunning)?;
        self.run_guarded(queue, engine, guard).await
    }

    /// Run with the flag already acquired. Lets the session resolve the
    /// engine after the flag is held, so an accepted engine change is never
    /// silently ignored by a run that started in the same instant.
    pub(crate) async fn run_guarded(
        &self,
        queue: &BatchQueue,
        engine: Engine,
        guard: RunGuard,
    ) -> Result<RunSummary> {
        let _guard = guard;

        log::info!(
            "Starting batch run over {} item(s) with engine '{}'",
            queue.size(),
            engine
        );

        let mut summary = RunSummary::default();
        let mut visited = 0;
        let mut index = 0;
        // Bound each step by the live queue length so late enqueues are
        // naturally included.
        while index < queue.size() {
            match queue.claim(index) {
                None => break,
                Some(Claim::Completed) => {
                    visited += 1;
                    summary.skipped += 1;
                },
                Some(Claim::Eligible(item)) => {
                    self.observer
                        .on_status(item.id, &item.name, ItemStatus::Processing);
                    match self.backend.upload(&item.file, engine).await {
                        Ok(descriptor) => {
                            summary.completed.push(descriptor.filename.clone());
                            queue.finish_ok(item.id, descriptor);
                            self.observer.on_status(item.id, &item.name, ItemStatus::Done);
                        },
                        Err(e) => {
                            log::warn!("Upload failed for '{}': {}", item.name, e);
                            queue.finish_err(item.id, e.to_string());
                            self.observer.on_status(item.id, &item.name, ItemStatus::Error);
                            summary.failed += 1;
                        },
                    }
                    visited += 1;
                },
            }
            self.observer.on_progress(visited, queue.size());
            index += 1;
        }

        summary.total = visited;
        log::info!(
            "Batch run finished: {} completed, {} failed, {} skipped",
            summary.completed.len(),
            summary.failed,
            summary.skipped
        );
        self.observer.on_finished(&summary);
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MockBackend;
    use crate::types::ImageFile;

    fn img(name: &str) -> ImageFile {
        ImageFile::new(name, "image/png", vec![0u8; 16])
    }

    #[test]
    fn test_run_flag_exclusive_acquire() {
        let flag = RunFlag::new();
        assert!(!flag.is_active());

        let guard = flag.try_acquire().unwrap();
        assert!(flag.is_active());
        assert!(flag.try_acquire().is_none());

        drop(guard);
        assert!(!flag.is_active());
        assert!(flag.try_acquire().is_some());
    }

    #[tokio::test]
    async fn test_run_rejected_while_flag_held() {
        let flag = RunFlag::new();
        let queue = BatchQueue::new(flag.clone());
        queue.enqueue(vec![img("a.png")]);
        let processor = BatchProcessor::new(Arc::new(MockBackend::new()), flag.clone());

        let _guard = flag.try_acquire().unwrap();
        let result = processor.run(&queue, Engine::default()).await;
        assert!(matches!(result, Err(BgClientError::AlreadyRunning)));
    }

    #[tokio::test]
    async fn test_empty_queue_run_completes() {
        let flag = RunFlag::new();
        let queue = BatchQueue::new(flag.clone());
        let backend = MockBackend::new();
        let processor = BatchProcessor::new(Arc::new(backend.clone()), flag);

        let summary = processor.run(&queue, Engine::default()).await.unwrap();
        assert_eq!(summary.total, 0);
        assert!(summary.completed.is_empty());
        assert!(backend.upload_calls().is_empty());
        assert!(!processor.is_active());
    }

    #[tokio::test]
    async fn test_flag_released_after_run() {
        let flag = RunFlag::new();
        let queue = BatchQueue::new(flag.clone());
        queue.enqueue(vec![img("a.png")]);
        let processor = BatchProcessor::new(Arc::new(MockBackend::new()), flag.clone());

        processor.run(&queue, Engine::default()).await.unwrap();
        assert!(!flag.is_active());

        // A later run over the same queue is permitted
        let summary = processor.run(&queue, Engine::default()).await.unwrap();
        assert_eq!(summary.skipped, 1);
    }
}
