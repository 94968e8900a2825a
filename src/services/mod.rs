//! Support services separated from the orchestration core

mod progress;

pub use progress::{progress_fraction, BatchObserver, ConsoleObserver, NoOpObserver};
