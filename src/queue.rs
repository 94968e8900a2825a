//! Ordered queue of files selected for batch processing
//!
//! The queue owns the canonical item list and item identities. Intake
//! filtering happens here: files with an unaccepted media type never become
//! items. Mutation of item status is driven by the processor through the
//! crate-internal claim/finish API.

use crate::error::{BgClientError, Result};
use crate::processor::RunFlag;
use crate::types::{ImageFile, ItemId, QueueItem, ResultDescriptor};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Outcome of claiming a queue slot for processing
pub(crate) enum Claim {
    /// The item already holds a result from an earlier run; skip it.
    Completed,
    /// The item was moved into `Processing` and should be uploaded.
    Eligible(ClaimedItem),
}

/// Snapshot of an item claimed for upload, taken while the queue lock is held
pub(crate) struct ClaimedItem {
    pub id: ItemId,
    pub name: String,
    pub file: ImageFile,
}

/// Shared handle to the batch queue
///
/// Cloning the handle shares the underlying item list, so a front end can
/// keep rendering `items()` while a run mutates statuses.
#[derive(Clone)]
pub struct BatchQueue {
    items: Arc<Mutex<Vec<QueueItem>>>,
    run_flag: RunFlag,
}

impl BatchQueue {
    /// Create an empty queue guarded by the given run flag
    #[must_use]
    pub fn new(run_flag: RunFlag) -> Self {
        Self {
            items: Arc::new(Mutex::new(Vec::new())),
            run_flag,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<QueueItem>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append candidate files as `Pending` items, preserving input order.
    ///
    /// Files whose declared media type is not accepted are dropped without an
    /// error; the accepted count is the only surface of the filtering. This
    /// mirrors the intake contract: validation errors never reach the queue.
    pub fn enqueue(&self, files: Vec<ImageFile>) -> usize {
        let mut accepted = 0;
        let mut items = self.lock();
        for file in files {
            if file.is_supported() {
                items.push(QueueItem::new(file));
                accepted += 1;
            } else {
                log::debug!(
                    "Dropping '{}': unsupported media type '{}'",
                    file.name(),
                    file.media_type()
                );
            }
        }
        accepted
    }

    /// Cloned read view of all items in insertion order
    #[must_use]
    pub fn items(&self) -> Vec<QueueItem> {
        self.lock().clone()
    }

    /// Number of items currently in the queue
    #[must_use]
    pub fn size(&self) -> usize {
        self.lock().len()
    }

    /// Whether the queue holds no items
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Remove all items atomically.
    ///
    /// # Errors
    /// - `InvalidState` while a batch run is active
    pub fn clear(&self) -> Result<()> {
        if self.run_flag.is_active() {
            return Err(BgClientError::invalid_state(
                "cannot clear the queue while a batch run is active",
            ));
        }
        self.lock().clear();
        Ok(())
    }

    /// Claim the item at `index` for processing. `None` when the index is
    /// past the end of the queue.
    pub(crate) fn claim(&self, index: usize) -> Option<Claim> {
        let mut items = self.lock();
        let item = items.get_mut(index)?;
        if item.begin_processing() {
            Some(Claim::Eligible(ClaimedItem {
                id: item.id(),
                name: item.file().name().to_string(),
                file: item.file().clone(),
            }))
        } else {
            Some(Claim::Completed)
        }
    }

    /// Record a successful upload for a claimed item
    pub(crate) fn finish_ok(&self, id: ItemId, result: ResultDescriptor) {
        let mut items = self.lock();
        if let Some(item) = items.iter_mut().find(|i| i.id() == id) {
            item.complete(result);
        }
    }

    /// Record a failed upload for a claimed item
    pub(crate) fn finish_err(&self, id: ItemId, reason: String) {
        let mut items = self.lock();
        if let Some(item) = items.iter_mut().find(|i| i.id() == id) {
            item.fail(reason);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ItemStatus;

    fn img(name: &str, media_type: &str) -> ImageFile {
        ImageFile::new(name, media_type, vec![0u8; 16])
    }

    #[test]
    fn test_enqueue_filters_unsupported_types() {
        let queue = BatchQueue::new(RunFlag::new());
        let accepted = queue.enqueue(vec![
            img("x.jpg", "image/jpeg"),
            img("y.txt", "text/plain"),
        ]);
        assert_eq!(accepted, 1);
        assert_eq!(queue.size(), 1);
        assert_eq!(queue.items()[0].file().name(), "x.jpg");
    }

    #[test]
    fn test_enqueue_preserves_input_order() {
        let queue = BatchQueue::new(RunFlag::new());
        queue.enqueue(vec![
            img("a.png", "image/png"),
            img("b.png", "image/png"),
            img("c.png", "image/png"),
        ]);
        let names: Vec<_> = queue
            .items()
            .iter()
            .map(|i| i.file().name().to_string())
            .collect();
        assert_eq!(names, vec!["a.png", "b.png", "c.png"]);
    }

    #[test]
    fn test_enqueue_all_rejected_is_noop() {
        let queue = BatchQueue::new(RunFlag::new());
        let accepted = queue.enqueue(vec![img("a.gif", "image/gif"), img("b.pdf", "application/pdf")]);
        assert_eq!(accepted, 0);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_clear_rejected_while_run_active() {
        let flag = RunFlag::new();
        let queue = BatchQueue::new(flag.clone());
        queue.enqueue(vec![img("a.png", "image/png")]);

        let guard = flag.try_acquire().unwrap();
        let result = queue.clear();
        assert!(matches!(result, Err(BgClientError::InvalidState(_))));
        assert_eq!(queue.size(), 1);

        drop(guard);
        queue.clear().unwrap();
        assert!(queue.is_empty());
    }

    #[test]
    fn test_claim_marks_item_processing() {
        let queue = BatchQueue::new(RunFlag::new());
        queue.enqueue(vec![img("a.png", "image/png")]);

        match queue.claim(0) {
            Some(Claim::Eligible(claimed)) => {
                assert_eq!(claimed.name, "a.png");
                assert_eq!(queue.items()[0].status(), ItemStatus::Processing);
            },
            _ => panic!("expected an eligible claim"),
        }
        assert!(queue.claim(1).is_none());
    }

    #[test]
    fn test_finish_records_result_and_error() {
        let queue = BatchQueue::new(RunFlag::new());
        queue.enqueue(vec![img("a.png", "image/png"), img("b.png", "image/png")]);

        let a = match queue.claim(0) {
            Some(Claim::Eligible(c)) => c,
            _ => panic!("expected eligible"),
        };
        queue.finish_ok(
            a.id,
            ResultDescriptor {
                filename: "a_nobg.png".to_string(),
                original_url: None,
                result_url: "/media/results/a_nobg.png".to_string(),
            },
        );
        assert_eq!(queue.items()[0].status(), ItemStatus::Done);

        let b = match queue.claim(1) {
            Some(Claim::Eligible(c)) => c,
            _ => panic!("expected eligible"),
        };
        queue.finish_err(b.id, "timed out".to_string());
        assert_eq!(queue.items()[1].status(), ItemStatus::Error);
        assert_eq!(queue.items()[1].error(), Some("timed out"));

        // Done items are reported as already completed on the next claim
        assert!(matches!(queue.claim(0), Some(Claim::Completed)));
        // Error items become eligible again
        assert!(matches!(queue.claim(1), Some(Claim::Eligible(_))));
    }
}
