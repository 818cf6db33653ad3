//! Resumable transfer primitive contract
//!
//! The manager treats a transfer as opaque: it can be started (which
//! resolves when the file is complete or the transfer fails) and paused.
//! Retry and backoff belong to the implementation, not the manager.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// One progress tick from a running transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferProgress {
    /// Bytes present in the destination file
    pub bytes_written: u64,

    /// Total size, when the remote reports it
    pub bytes_expected: Option<u64>,
}

impl TransferProgress {
    /// Completed fraction in `[0, 1]`
    ///
    /// `None` when the total is unknown or zero.
    pub fn fraction(&self) -> Option<f32> {
        match self.bytes_expected {
            Some(total) if total > 0 => {
                Some((self.bytes_written as f64 / total as f64).clamp(0.0, 1.0) as f32)
            }
            _ => None,
        }
    }
}

/// Callback invoked on each transfer tick
pub type ProgressCallback = Arc<dyn Fn(TransferProgress) + Send + Sync>;

/// Transfer failures
#[derive(Debug, Error)]
pub enum TransferError {
    /// Transfer was paused before completing
    #[error("Transfer paused")]
    Paused,

    /// Remote answered with a failure status
    #[error("Server returned status {status}")]
    Http { status: u16 },

    /// Connection or protocol failure
    #[error("Network error: {0}")]
    Network(String),

    /// Destination file could not be written
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A single live transfer
#[async_trait]
pub trait TransferHandle: Send + Sync {
    /// Run (or resume) the transfer until the file is complete
    async fn start(&self) -> Result<PathBuf, TransferError>;

    /// Pause the transfer; a paused `start` resolves with `TransferError::Paused`
    async fn pause(&self) -> Result<(), TransferError>;
}

/// Factory for transfers
pub trait Transfer: Send + Sync {
    /// Prepare a transfer of `remote` into `dest`, reporting ticks to `on_progress`
    fn create(
        &self,
        remote: &str,
        dest: &Path,
        on_progress: ProgressCallback,
    ) -> Arc<dyn TransferHandle>;
}
