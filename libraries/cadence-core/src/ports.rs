//! Narrow ports between the playback engine and the stores it consults
//!
//! The engine never holds a store's full state. It reads the download
//! cache through [`CachedAudio`], checks favorites through
//! [`FavoriteLookup`], and writes plays through [`PlayRecorder`].

use crate::types::Track;
use async_trait::async_trait;
use std::path::PathBuf;

/// Snapshot read into the download cache
#[async_trait]
pub trait CachedAudio: Send + Sync {
    /// Local file for a downloaded track, only if it is still present on disk
    async fn cached_file(&self, track_id: &str) -> Option<PathBuf>;
}

/// Write-only port into the listening history
#[async_trait]
pub trait PlayRecorder: Send + Sync {
    /// Record that a track started playing
    async fn record_play(&self, track: &Track);
}

/// Read-only favorites membership check
pub trait FavoriteLookup: Send + Sync {
    /// Whether the track id is favorited
    fn is_favorite(&self, track_id: &str) -> bool;
}
