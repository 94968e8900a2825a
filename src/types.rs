//! Core data types for queue items and remote results

use crate::error::Result;
use serde::Deserialize;
use uuid::Uuid;

/// Media types accepted for both single and batch intake
pub const ACCEPTED_MEDIA_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];

/// Opaque unique token identifying a queue item for its entire lifetime
pub type ItemId = Uuid;

/// An in-memory image selected for processing: binary payload plus the
/// declared media type and display name supplied by the caller.
#[derive(Debug, Clone)]
pub struct ImageFile {
    name: String,
    media_type: String,
    data: Vec<u8>,
}

impl ImageFile {
    /// Create an image file from raw bytes
    #[must_use]
    pub fn new<S: Into<String>, T: Into<String>>(name: S, media_type: T, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            data,
        }
    }

    /// Read an image file from disk, deriving the media type from the file
    /// extension. Unknown extensions yield `application/octet-stream`, which
    /// is rejected at intake.
    ///
    /// # Errors
    /// - File cannot be read
    pub fn from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)
            .map_err(|e| crate::error::BgClientError::file_io_error("read image file", path, e))?;
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        let media_type = media_type_for_path(path);
        Ok(Self::new(name, media_type, data))
    }

    /// Display name of the file
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared media type (e.g. `image/png`)
    #[must_use]
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// Raw file contents
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Payload size in bytes
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Whether the declared media type is in the accepted image set
    #[must_use]
    pub fn is_supported(&self) -> bool {
        ACCEPTED_MEDIA_TYPES.contains(&self.media_type.as_str())
    }
}

/// Map a file extension to its declared media type
fn media_type_for_path(path: &std::path::Path) -> String {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg".to_string(),
        "png" => "image/png".to_string(),
        "webp" => "image/webp".to_string(),
        _ => "application/octet-stream".to_string(),
    }
}

/// Lifecycle status of a queue item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStatus {
    /// Enqueued, not yet visited by a run
    Pending,
    /// Upload to the remote engine is in flight
    Processing,
    /// Remote processing succeeded; a result descriptor is recorded
    Done,
    /// Remote processing failed; eligible for retry on the next run
    Error,
}

impl ItemStatus {
    /// Whether the state machine permits moving from `self` to `next`.
    ///
    /// Transitions follow `Pending -> Processing -> {Done, Error}` with
    /// `Error -> Processing` allowed so a later run can retry failed items.
    /// `Done` is terminal: repeated runs skip completed items.
    #[must_use]
    pub fn can_transition_to(self, next: ItemStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending | Self::Error, Self::Processing)
                | (Self::Processing, Self::Done | Self::Error)
        )
    }

    /// Whether no further transitions are possible
    #[must_use]
    pub fn is_terminal(self) -> bool {
        self == Self::Done
    }

    /// Lowercase label used in status displays
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Done => "done",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Success response of the upload and composite endpoints
///
/// `filename` is the server-assigned result identifier used later for
/// bundling or direct download. The composite endpoint omits `original_url`.
#[derive(Debug, Clone, Deserialize)]
pub struct ResultDescriptor {
    /// Server-assigned identifier of the processed artifact
    pub filename: String,
    /// Location of the uploaded original (upload endpoint only)
    #[serde(default)]
    pub original_url: Option<String>,
    /// Location of the processed rendition
    pub result_url: String,
}

/// One file tracked by the batch queue
#[derive(Debug, Clone)]
pub struct QueueItem {
    id: ItemId,
    file: ImageFile,
    status: ItemStatus,
    result: Option<ResultDescriptor>,
    error: Option<String>,
}

impl QueueItem {
    pub(crate) fn new(file: ImageFile) -> Self {
        Self {
            id: Uuid::new_v4(),
            file,
            status: ItemStatus::Pending,
            result: None,
            error: None,
        }
    }

    /// Stable unique identity of this item
    #[must_use]
    pub fn id(&self) -> ItemId {
        self.id
    }

    /// The file supplied at enqueue time
    #[must_use]
    pub fn file(&self) -> &ImageFile {
        &self.file
    }

    /// Current lifecycle status
    #[must_use]
    pub fn status(&self) -> ItemStatus {
        self.status
    }

    /// Remote result descriptor, present only once the item is `Done`
    #[must_use]
    pub fn result(&self) -> Option<&ResultDescriptor> {
        self.result.as_ref()
    }

    /// Failure reason, present only while the item is in `Error`
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Move the item into `Processing`. Returns `false` (leaving the item
    /// untouched) when the transition table forbids it.
    pub(crate) fn begin_processing(&mut self) -> bool {
        if !self.status.can_transition_to(ItemStatus::Processing) {
            return false;
        }
        self.status = ItemStatus::Processing;
        self.error = None;
        true
    }

    pub(crate) fn complete(&mut self, result: ResultDescriptor) {
        debug_assert!(self.status.can_transition_to(ItemStatus::Done));
        self.status = ItemStatus::Done;
        self.result = Some(result);
        self.error = None;
    }

    pub(crate) fn fail<S: Into<String>>(&mut self, reason: S) {
        debug_assert!(self.status.can_transition_to(ItemStatus::Error));
        self.status = ItemStatus::Error;
        self.error = Some(reason.into());
    }
}

/// Outcome of one full batch run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Result identifiers of items that reached `Done` during this run, in
    /// queue order. Items already `Done` before the run are not repeated.
    pub completed: Vec<String>,
    /// Number of items that ended the run in `Error`
    pub failed: usize,
    /// Number of items skipped because they were already `Done`
    pub skipped: usize,
    /// Total number of items visited
    pub total: usize,
}

impl RunSummary {
    /// Whether every visited item ended in `Done` (or was already there)
    #[must_use]
    pub fn is_full_success(&self) -> bool {
        self.failed == 0
    }
}
