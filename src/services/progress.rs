//! Status and progress projection for batch runs
//!
//! This module separates status rendering from the orchestration core: the
//! processor emits item-status and progress notifications, and any front end
//! (terminal, web view, test harness) subscribes by implementing
//! [`BatchObserver`]. Rendering is a pure projection with no business logic.

use crate::types::{ItemId, ItemStatus, RunSummary};
use instant::Instant;

/// Progress fraction `visited / total`, clamped to `1.0` for an empty queue
#[must_use]
pub fn progress_fraction(visited: usize, total: usize) -> f64 {
    if total == 0 {
        1.0
    } else {
        visited as f64 / total as f64
    }
}

/// Subscriber to item-status changes and run progress
///
/// Notifications are emitted in queue order; the progress fraction is
/// non-decreasing over a run and reaches `1.0` at completion.
pub trait BatchObserver: Send + Sync {
    /// An item changed status
    fn on_status(&self, id: ItemId, name: &str, status: ItemStatus);

    /// The run visited another item
    fn on_progress(&self, visited: usize, total: usize);

    /// The run completed
    fn on_finished(&self, summary: &RunSummary) {
        let _ = summary;
    }
}

/// Observer that discards all notifications
pub struct NoOpObserver;

impl BatchObserver for NoOpObserver {
    fn on_status(&self, _id: ItemId, _name: &str, _status: ItemStatus) {
        // Intentionally empty
    }

    fn on_progress(&self, _visited: usize, _total: usize) {
        // Intentionally empty
    }
}

/// Observer that logs status lines, suitable for headless use
pub struct ConsoleObserver {
    verbose: bool,
    started: Instant,
}

impl ConsoleObserver {
    /// Create a console observer. Verbose mode adds per-item progress lines.
    #[must_use]
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            started: Instant::now(),
        }
    }
}

impl Default for ConsoleObserver {
    fn default() -> Self {
        Self::new(false)
    }
}

impl BatchObserver for ConsoleObserver {
    fn on_status(&self, _id: ItemId, name: &str, status: ItemStatus) {
        match status {
            ItemStatus::Error => log::warn!("[{}] {}", status, name),
            _ => log::info!("[{}] {}", status, name),
        }
    }

    fn on_progress(&self, visited: usize, total: usize) {
        if self.verbose {
            log::info!(
                "Processed {}/{} files ({:.0}%)",
                visited,
                total,
                progress_fraction(visited, total) * 100.0
            );
        }
    }

    fn on_finished(&self, summary: &RunSummary) {
        log::info!(
            "Batch completed in {}ms: {} succeeded, {} failed, {} skipped",
            self.started.elapsed().as_millis(),
            summary.completed.len(),
            summary.failed,
            summary.skipped
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_progress_fraction_bounds() {
        assert!((progress_fraction(0, 4) - 0.0).abs() < f64::EPSILON);
        assert!((progress_fraction(2, 4) - 0.5).abs() < f64::EPSILON);
        assert!((progress_fraction(4, 4) - 1.0).abs() < f64::EPSILON);
        // An empty queue counts as fully visited
        assert!((progress_fraction(0, 0) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_noop_observer_discards_everything() {
        let observer = NoOpObserver;
        observer.on_status(Uuid::new_v4(), "a.png", ItemStatus::Processing);
        observer.on_progress(1, 2);
        observer.on_finished(&RunSummary::default());
    }

    #[test]
    fn test_console_observer_handles_all_statuses() {
        let observer = ConsoleObserver::new(true);
        let id = Uuid::new_v4();
        for status in [
            ItemStatus::Pending,
            ItemStatus::Processing,
            ItemStatus::Done,
            ItemStatus::Error,
        ] {
            observer.on_status(id, "a.png", status);
        }
        observer.on_progress(1, 3);
        observer.on_finished(&RunSummary {
            completed: vec!["a_nobg.png".to_string()],
            failed: 1,
            skipped: 0,
            total: 2,
        });
    }
}
