//! Audio resource contract
//!
//! The engine owns exactly one [`AudioHandle`] at a time and always
//! releases it before acquiring the next.

use crate::error::Result;
use crate::types::{AcquireOptions, AudioSource, PlaybackStatus};
use async_trait::async_trait;
use std::sync::Arc;

/// Receives status updates from a live audio resource
///
/// May be invoked from any thread.
pub type StatusListener = Arc<dyn Fn(PlaybackStatus) + Send + Sync>;

/// A loaded audio resource
#[async_trait]
pub trait AudioHandle: Send + Sync {
    /// Current status
    async fn status(&self) -> Result<PlaybackStatus>;

    async fn play(&self) -> Result<()>;

    async fn pause(&self) -> Result<()>;

    /// Move the playhead
    async fn seek(&self, position_ms: u64) -> Result<()>;

    /// Set the volume in `[0, 1]`
    async fn set_volume(&self, volume: f32) -> Result<()>;

    /// Free the resource; the handle is unusable afterwards
    async fn release(&self) -> Result<()>;

    /// Restart from the beginning in place
    async fn replay(&self) -> Result<()> {
        self.seek(0).await?;
        self.play().await
    }
}

/// Factory for audio resources
#[async_trait]
pub trait AudioBackend: Send + Sync {
    /// Load `source`, delivering status updates to `listener`
    async fn acquire(
        &self,
        source: AudioSource,
        options: AcquireOptions,
        listener: StatusListener,
    ) -> Result<Box<dyn AudioHandle>>;
}
