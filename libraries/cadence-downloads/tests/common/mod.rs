//! Shared fixtures for download manager tests

use async_trait::async_trait;
use cadence_core::{MediaSource, Track};
use cadence_downloads::{ProgressCallback, Transfer, TransferError, TransferHandle, TransferProgress};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

/// Bytes written by every successful scripted transfer
pub const AUDIO_BYTES: &[u8] = b"ID3fake-audio";

pub fn remote_track(id: &str) -> Track {
    Track::new(
        id,
        format!("Song {id}"),
        "Artist",
        MediaSource::remote(format!("https://cdn.example.com/{id}.mp3")),
    )
}

pub fn bundled_track(id: &str) -> Track {
    Track::new(id, format!("Bundled {id}"), "Artist", MediaSource::Bundled(7))
}

/// How the next transfer behaves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    /// Ticks to completion and writes the file
    Succeed,

    /// Ticks once, then fails
    Fail,

    /// Ticks once, then waits for `release()` or a pause
    Hold,
}

/// Transfer double driven by a [`Script`]
pub struct ScriptedTransfer {
    script: Mutex<Script>,
    created: AtomicUsize,
    release: Arc<Notify>,
    last_callback: Mutex<Option<ProgressCallback>>,
}

impl ScriptedTransfer {
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script),
            created: AtomicUsize::new(0),
            release: Arc::new(Notify::new()),
            last_callback: Mutex::new(None),
        })
    }

    pub fn set_script(&self, script: Script) {
        *self.script.lock().unwrap() = script;
    }

    /// Number of transfers created so far
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// Let a held transfer complete
    pub fn release(&self) {
        self.release.notify_one();
    }

    /// Deliver a tick through the most recent transfer's callback
    pub fn tick(&self, bytes_written: u64, bytes_expected: u64) {
        let callback = self.last_callback.lock().unwrap().clone().expect("no transfer created");
        callback(TransferProgress {
            bytes_written,
            bytes_expected: Some(bytes_expected),
        });
    }
}

impl Transfer for ScriptedTransfer {
    fn create(
        &self,
        _remote: &str,
        dest: &Path,
        on_progress: ProgressCallback,
    ) -> Arc<dyn TransferHandle> {
        self.created.fetch_add(1, Ordering::SeqCst);
        *self.last_callback.lock().unwrap() = Some(on_progress.clone());

        Arc::new(ScriptedHandle {
            script: *self.script.lock().unwrap(),
            dest: dest.to_path_buf(),
            on_progress,
            release: self.release.clone(),
            paused: CancellationToken::new(),
        })
    }
}

struct ScriptedHandle {
    script: Script,
    dest: PathBuf,
    on_progress: ProgressCallback,
    release: Arc<Notify>,
    paused: CancellationToken,
}

impl ScriptedHandle {
    fn tick(&self, written: u64) {
        (self.on_progress)(TransferProgress {
            bytes_written: written,
            bytes_expected: Some(100),
        });
    }

    async fn write_file(&self) -> Result<PathBuf, TransferError> {
        tokio::fs::write(&self.dest, AUDIO_BYTES).await?;
        Ok(self.dest.clone())
    }
}

#[async_trait]
impl TransferHandle for ScriptedHandle {
    async fn start(&self) -> Result<PathBuf, TransferError> {
        match self.script {
            Script::Succeed => {
                for written in [0, 50, 100] {
                    self.tick(written);
                }
                self.write_file().await
            }
            Script::Fail => {
                self.tick(30);
                Err(TransferError::Network("connection reset".into()))
            }
            Script::Hold => {
                self.tick(10);
                tokio::select! {
                    _ = self.release.notified() => self.write_file().await,
                    _ = self.paused.cancelled() => Err(TransferError::Paused),
                }
            }
        }
    }

    async fn pause(&self) -> Result<(), TransferError> {
        self.paused.cancel();
        Ok(())
    }
}

/// Poll until `cond` holds, yielding to spawned tasks in between
pub async fn wait_until(cond: impl Fn() -> bool) {
    for _ in 0..400 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}
