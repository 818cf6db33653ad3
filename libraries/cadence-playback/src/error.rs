//! Error types for playback

use thiserror::Error;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// No usable source, or the audio resource could not be acquired
    #[error("Failed to load track {track_id}: {reason}")]
    Load { track_id: String, reason: String },

    /// The audio resource rejected an operation
    #[error("Audio resource error: {0}")]
    Audio(String),

    /// No audio resource is loaded
    #[error("No track loaded")]
    NoTrackLoaded,
}

impl PlaybackError {
    /// Create a load error for a track
    pub fn load(track_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Load {
            track_id: track_id.into(),
            reason: reason.into(),
        }
    }

    /// Create an audio resource error
    pub fn audio(msg: impl Into<String>) -> Self {
        Self::Audio(msg.into())
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
