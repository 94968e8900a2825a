//! Error types for background removal client operations

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, BgClientError>;

/// Error types for the background removal client
#[derive(Error, Debug)]
pub enum BgClientError {
    /// Input/output errors (file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport-level HTTP errors with operation context
    #[error("Network error: {0}")]
    Network(String),

    /// The remote engine rejected or failed to process an uploaded image
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    /// Archive assembly for a set of processed results failed
    #[error("Bundle failed: {0}")]
    BundleFailed(String),

    /// A batch run was started while a previous run is still active
    #[error("A batch run is already active")]
    AlreadyRunning,

    /// An operation violated a structural precondition (e.g. clearing the
    /// queue or switching engines mid-run)
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Declared media type is not in the accepted image set
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// Invalid configuration or parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The remote service returned a body that does not match the wire contract
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl BgClientError {
    /// Create a new upload failure error
    pub fn upload_failed<S: Into<String>>(msg: S) -> Self {
        Self::UploadFailed(msg.into())
    }

    /// Create a new bundle failure error
    pub fn bundle_failed<S: Into<String>>(msg: S) -> Self {
        Self::BundleFailed(msg.into())
    }

    /// Create a new invalid state error
    pub fn invalid_state<S: Into<String>>(msg: S) -> Self {
        Self::InvalidState(msg.into())
    }

    /// Create a new invalid configuration error
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a new unsupported media type error
    pub fn unsupported_media_type<S: Into<String>>(media_type: S) -> Self {
        Self::UnsupportedMediaType(media_type.into())
    }

    /// Create a new invalid response error
    pub fn invalid_response<S: Into<String>>(msg: S) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Create a network error with operation context
    pub fn network_error(operation: &str, error: &reqwest::Error) -> Self {
        Self::Network(format!("Failed to {}: {}", operation, error))
    }

    /// Create file I/O error with operation context
    pub fn file_io_error<P: AsRef<std::path::Path>>(
        operation: &str,
        path: P,
        error: std::io::Error,
    ) -> Self {
        let path_display = path.as_ref().display();
        Self::Io(std::io::Error::new(
            error.kind(),
            format!("Failed to {} '{}': {}", operation, path_display, error),
        ))
    }
}
