//! Error types for download management

use crate::transfer::TransferError;
use thiserror::Error;

/// Download errors
///
/// These are recorded on the track's entry as its `error` text; they are
/// never returned from the manager's public operations.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The track's audio is a bundled asset and can never be fetched
    #[error("Track \"{title}\" is a bundled asset and cannot be downloaded")]
    Undownloadable { title: String },

    /// The transfer failed; retryable by starting again
    #[error("Transfer failed: {0}")]
    Transfer(#[from] TransferError),

    /// Cache directory could not be prepared
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for download operations
pub type Result<T> = std::result::Result<T, DownloadError>;
