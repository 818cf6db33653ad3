//! Cadence Playback
//!
//! Playback state machine over an abstract audio backend.
//!
//! # Architecture
//!
//! - [`PlaybackEngine`]: the single owner of the active audio resource,
//!   queue, shuffle/repeat policy, volume and sleep timer
//! - [`PlayQueue`]: base order plus playback order, and the next/previous
//!   algebra including the end-of-queue policy
//! - [`AudioBackend`] / [`AudioHandle`]: the resource contract a platform
//!   audio layer implements
//!
//! The engine never reaches into other stores. It reads cached files through
//! [`cadence_core::CachedAudio`], favorites through
//! [`cadence_core::FavoriteLookup`], and records plays through
//! [`cadence_core::PlayRecorder`].
//!
//! # Example
//!
//! ```rust,no_run
//! use cadence_playback::{PlaybackConfig, PlaybackEngine, PlaybackPorts};
//! # async fn example(ports: PlaybackPorts, track: cadence_core::Track) {
//! let engine = PlaybackEngine::new(ports, PlaybackConfig::default()).await;
//! engine.play_song(&track, Some(vec![track.clone()])).await;
//! engine.toggle_repeat_mode().await;
//! let snapshot = engine.snapshot().await;
//! println!("{} {}", snapshot.is_playing, snapshot.progress());
//! # }
//! ```

mod backend;
mod engine;
mod error;
pub mod queue;
pub mod shuffle;
mod types;

pub use backend::{AudioBackend, AudioHandle, StatusListener};
pub use engine::{PlaybackEngine, PlaybackPorts};
pub use error::{PlaybackError, Result};
pub use queue::{Advance, PlayQueue};
pub use types::{
    AcquireOptions, AudioSource, PlaybackConfig, PlaybackSnapshot, PlaybackStatus, RepeatMode,
};
