//! Per-track download entries

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Download status for a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadStatus {
    /// Not downloaded
    NotDownloaded,

    /// Transfer in flight
    Downloading,

    /// Available in the local cache
    Downloaded,

    /// Last attempt failed
    Error,
}

/// Download state of one track
///
/// `local_uri` is set if and only if the status is `Downloaded`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadEntry {
    pub status: DownloadStatus,

    /// Fraction transferred, in `[0, 1]`
    pub progress: f32,

    pub local_uri: Option<PathBuf>,

    pub error: Option<String>,
}

impl DownloadEntry {
    /// The entry reported for tracks the manager has never seen
    pub fn not_downloaded() -> Self {
        Self {
            status: DownloadStatus::NotDownloaded,
            progress: 0.0,
            local_uri: None,
            error: None,
        }
    }

    pub(crate) fn downloading(progress: f32) -> Self {
        Self {
            status: DownloadStatus::Downloading,
            progress: progress.clamp(0.0, 1.0),
            local_uri: None,
            error: None,
        }
    }

    pub(crate) fn downloaded(path: PathBuf) -> Self {
        Self {
            status: DownloadStatus::Downloaded,
            progress: 1.0,
            local_uri: Some(path),
            error: None,
        }
    }

    pub(crate) fn failed(reason: impl Into<String>) -> Self {
        Self {
            status: DownloadStatus::Error,
            progress: 0.0,
            local_uri: None,
            error: Some(reason.into()),
        }
    }

    /// Whether a transfer is in flight
    pub fn is_downloading(&self) -> bool {
        self.status == DownloadStatus::Downloading
    }

    /// Whether the track is claimed to be in the local cache
    pub fn is_downloaded(&self) -> bool {
        self.status == DownloadStatus::Downloaded && self.local_uri.is_some()
    }
}

impl Default for DownloadEntry {
    fn default() -> Self {
        Self::not_downloaded()
    }
}
