//! Core types for playback

use cadence_core::{Track, TrackId};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Repeat mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatMode {
    /// Stop at the end of the queue
    #[default]
    Off,

    /// Wrap around to the start of the queue
    All,

    /// Replay the current track
    One,
}

impl RepeatMode {
    /// Next mode in the `off → all → one → off` cycle
    #[must_use]
    pub fn cycle(self) -> Self {
        match self {
            Self::Off => Self::All,
            Self::All => Self::One,
            Self::One => Self::Off,
        }
    }
}

/// Resolved location the audio backend loads from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioSource {
    /// Downloaded file in the local cache
    File(PathBuf),

    /// Remote locator
    Remote(String),

    /// Asset bundled with the application
    Bundled(u64),
}

/// Options for acquiring an audio resource
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcquireOptions {
    /// Start playing as soon as the resource is loaded
    pub autoplay: bool,

    /// Initial volume in `[0, 1]`
    pub volume: f32,
}

/// Status update delivered by an audio resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackStatus {
    pub is_loaded: bool,
    pub is_playing: bool,
    pub position_ms: u64,
    pub duration_ms: Option<u64>,

    /// Set once when the track reaches its natural end
    pub did_just_finish: bool,

    pub error: Option<String>,
}

/// Observable engine state for renderers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackSnapshot {
    pub active_track: Option<Track>,
    pub is_playing: bool,
    pub is_loading: bool,
    pub position_ms: u64,
    pub duration_ms: Option<u64>,

    /// Ids in playback order
    pub queue: Vec<TrackId>,

    pub shuffle: bool,
    pub repeat: RepeatMode,
    pub volume: f32,
    pub sleep_timer_armed: bool,

    /// Whether the active track is a favorite
    pub is_favorite: bool,
}

impl PlaybackSnapshot {
    /// Position as a fraction of the duration, `0.0` when the duration is unknown
    pub fn progress(&self) -> f32 {
        match self.duration_ms {
            Some(duration) if duration > 0 => {
                (self.position_ms as f64 / duration as f64).clamp(0.0, 1.0) as f32
            }
            _ => 0.0,
        }
    }
}

/// Construction settings for the engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackConfig {
    /// Volume used when none has been persisted (default: 1.0)
    pub default_volume: f32,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            default_volume: 1.0,
        }
    }
}
