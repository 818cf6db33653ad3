//! Download manager
//!
//! Owns the per-track [`DownloadEntry`] map, drives transfers and persists
//! the map under [`DOWNLOADS_KEY`] after every terminal transition.

use crate::entry::{DownloadEntry, DownloadStatus};
use crate::error::DownloadError;
use crate::transfer::{ProgressCallback, Transfer, TransferHandle, TransferProgress};
use async_trait::async_trait;
use cadence_core::{CachedAudio, KeyValueStore, Track, TrackId};
use cadence_storage::keys::DOWNLOADS_KEY;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};
use tracing::{debug, error, info, warn};

/// Cache file name for a track: `{id}_{sanitized title}.mp3`
///
/// Every character outside `[A-Za-z0-9]` becomes `_`, so the name is safe
/// on every filesystem and can't escape the cache directory.
pub fn cache_file_name(track: &Track) -> String {
    fn sanitize(s: &str) -> String {
        s.chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect()
    }
    format!("{}_{}.mp3", sanitize(&track.id), sanitize(&track.title))
}

/// A registered in-flight transfer
///
/// `generation` identifies which `start_download` call owns the slot, so a
/// superseded transfer can't write its result over a newer state.
struct ActiveTransfer {
    generation: u64,
    handle: Arc<dyn TransferHandle>,
}

struct Inner {
    store: Arc<dyn KeyValueStore>,
    transfer: Arc<dyn Transfer>,
    download_dir: PathBuf,
    entries: RwLock<HashMap<TrackId, DownloadEntry>>,
    active: Mutex<HashMap<TrackId, ActiveTransfer>>,
    next_generation: AtomicU64,
    persist_lock: tokio::sync::Mutex<()>,
}

/// Download manager
///
/// Cheap to clone; clones share state. Never returns errors from its
/// operations: failures are recorded on the track's entry.
#[derive(Clone)]
pub struct DownloadManager {
    inner: Arc<Inner>,
}

impl DownloadManager {
    /// Create a manager with no entries
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        transfer: Arc<dyn Transfer>,
        download_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                transfer,
                download_dir: download_dir.into(),
                entries: RwLock::new(HashMap::new()),
                active: Mutex::new(HashMap::new()),
                next_generation: AtomicU64::new(1),
                persist_lock: tokio::sync::Mutex::new(()),
            }),
        }
    }

    /// Load persisted entries and reconcile them with the filesystem
    ///
    /// Only `downloaded` entries whose file still exists survive; transfers
    /// from a previous run are gone, so other statuses are dropped too.
    pub async fn load(
        store: Arc<dyn KeyValueStore>,
        transfer: Arc<dyn Transfer>,
        download_dir: impl Into<PathBuf>,
    ) -> Self {
        let manager = Self::new(store, transfer, download_dir);

        let persisted: HashMap<TrackId, DownloadEntry> =
            match manager.inner.store.get(DOWNLOADS_KEY).await {
                Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                    error!(error = %e, "Persisted downloads are not valid JSON, ignoring");
                    HashMap::new()
                }),
                Ok(None) => HashMap::new(),
                Err(e) => {
                    error!(error = %e, "Failed to load download metadata");
                    HashMap::new()
                }
            };

        let total = persisted.len();
        let mut verified = HashMap::with_capacity(total);
        for (id, entry) in persisted {
            let Some(path) = entry.local_uri.as_deref().filter(|_| entry.is_downloaded()) else {
                continue;
            };
            if file_exists(path).await {
                verified.insert(id, DownloadEntry::downloaded(path.to_path_buf()));
            } else {
                warn!(track_id = %id, path = %path.display(), "Downloaded file missing, dropping entry");
            }
        }

        let kept = verified.len();
        *manager.write() = verified;
        info!(kept, dropped = total - kept, "Loaded download metadata");

        if kept != total {
            manager.persist().await;
        }
        manager
    }

    /// Directory downloaded files are written to
    pub fn download_dir(&self) -> &Path {
        &self.inner.download_dir
    }

    /// Download a track into the local cache
    ///
    /// Resolves when the transfer ends and returns the track's entry at that
    /// point. Starting a track that is already downloading or downloaded is
    /// a no-op. A cancel while in flight wins over the transfer's outcome.
    pub async fn start_download(&self, track: &Track) -> DownloadEntry {
        if !track.has_valid_id() {
            warn!("Refusing to download a track without an id");
            return DownloadEntry::not_downloaded();
        }
        let id = track.id.clone();

        let Some(remote) = track.audio_source.as_remote() else {
            let current = self.get_download_status(&id);
            if current.is_downloaded() {
                return current;
            }
            let reason = DownloadError::Undownloadable {
                title: track.title.clone(),
            };
            warn!(track_id = %id, "{}", reason);
            return self.finish(&id, DownloadEntry::failed(reason.to_string())).await;
        };

        let dest = self.inner.download_dir.join(cache_file_name(track));
        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);

        // Check and claim in one critical section, before any await, so
        // concurrent starts for the same id create one transfer.
        let handle = {
            let mut entries = self.write();
            if let Some(current) = entries.get(&id).filter(|entry| {
                matches!(
                    entry.status,
                    DownloadStatus::Downloading | DownloadStatus::Downloaded
                )
            }) {
                debug!(track_id = %id, status = ?current.status, "Download already in progress or complete");
                return current.clone();
            }

            let handle = self.inner.transfer.create(
                remote,
                &dest,
                progress_callback(Arc::downgrade(&self.inner), id.clone(), generation),
            );
            entries.insert(id.clone(), DownloadEntry::downloading(0.0));
            self.lock_active().insert(
                id.clone(),
                ActiveTransfer {
                    generation,
                    handle: handle.clone(),
                },
            );
            handle
        };
        self.persist().await;

        let result = match tokio::fs::create_dir_all(&self.inner.download_dir).await {
            Ok(()) if !self.owns_slot(&id, generation) => {
                debug!(track_id = %id, "Download cancelled before the transfer started");
                return self.get_download_status(&id);
            }
            Ok(()) => {
                info!(track_id = %id, url = %remote, dest = %dest.display(), "Starting download");
                handle.start().await.map_err(DownloadError::from)
            }
            Err(e) => Err(DownloadError::from(e)),
        };

        if !self.release_slot(&id, generation) {
            debug!(track_id = %id, "Transfer finished after cancel, ignoring outcome");
            return self.get_download_status(&id);
        }

        match result {
            Ok(path) => {
                info!(track_id = %id, path = %path.display(), "Download complete");
                self.finish(&id, DownloadEntry::downloaded(path)).await
            }
            Err(reason) => {
                error!(track_id = %id, error = %reason, "Download failed");
                self.finish(&id, DownloadEntry::failed(reason.to_string())).await
            }
        }
    }

    fn owns_slot(&self, track_id: &str, generation: u64) -> bool {
        self.lock_active()
            .get(track_id)
            .is_some_and(|slot| slot.generation == generation)
    }

    /// Drop the active slot if `generation` still owns it
    fn release_slot(&self, track_id: &str, generation: u64) -> bool {
        let mut active = self.lock_active();
        match active.get(track_id) {
            Some(slot) if slot.generation == generation => {
                active.remove(track_id);
                true
            }
            _ => false,
        }
    }

    /// Stop an in-flight transfer and reset the track to `not_downloaded`
    ///
    /// The partial file is left for a later resume.
    pub async fn cancel_download(&self, track_id: &str) {
        let slot = self.lock_active().remove(track_id);
        self.write()
            .insert(track_id.to_string(), DownloadEntry::not_downloaded());

        if let Some(slot) = slot {
            if let Err(e) = slot.handle.pause().await {
                warn!(track_id = %track_id, error = %e, "Failed to pause transfer");
            }
        }
        info!(track_id = %track_id, "Download cancelled");
        self.persist().await;
    }

    /// Delete a downloaded file and forget the track's entry
    pub async fn delete_download(&self, track_id: &str) {
        let local = self
            .read()
            .get(track_id)
            .and_then(|entry| entry.local_uri.clone());

        if let Some(path) = local {
            if file_exists(&path).await {
                if let Err(e) = tokio::fs::remove_file(&path).await {
                    warn!(track_id = %track_id, path = %path.display(), error = %e, "Failed to delete downloaded file");
                }
            }
        }

        self.write().remove(track_id);
        info!(track_id = %track_id, "Download deleted");
        self.persist().await;
    }

    /// Entry for a track; `not_downloaded` when unknown
    pub fn get_download_status(&self, track_id: &str) -> DownloadEntry {
        self.read().get(track_id).cloned().unwrap_or_default()
    }

    /// Snapshot of every known entry
    pub fn downloads(&self) -> HashMap<TrackId, DownloadEntry> {
        self.read().clone()
    }

    /// Whether a transfer for the track is registered
    pub fn is_active(&self, track_id: &str) -> bool {
        self.lock_active().contains_key(track_id)
    }

    async fn finish(&self, track_id: &str, entry: DownloadEntry) -> DownloadEntry {
        self.write().insert(track_id.to_string(), entry.clone());
        self.persist().await;
        entry
    }

    async fn persist(&self) {
        persist(&self.inner).await;
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<TrackId, DownloadEntry>> {
        self.inner.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<TrackId, DownloadEntry>> {
        self.inner.entries.write().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_active(&self) -> std::sync::MutexGuard<'_, HashMap<TrackId, ActiveTransfer>> {
        self.inner.active.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl CachedAudio for DownloadManager {
    async fn cached_file(&self, track_id: &str) -> Option<PathBuf> {
        let entry = self.get_download_status(track_id);
        let path = entry.local_uri.filter(|_| entry.status == DownloadStatus::Downloaded)?;

        if file_exists(&path).await {
            Some(path)
        } else {
            warn!(track_id = %track_id, path = %path.display(), "Cached file vanished");
            None
        }
    }
}

/// Progress ticks for one transfer generation
///
/// Ticks are dropped once the generation is no longer registered (cancelled
/// or replaced), and progress only ever moves forward.
fn progress_callback(inner: Weak<Inner>, track_id: TrackId, generation: u64) -> ProgressCallback {
    Arc::new(move |tick: TransferProgress| {
        let Some(inner) = inner.upgrade() else {
            return;
        };
        let Some(fraction) = tick.fraction() else {
            return;
        };

        let current = inner
            .active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&track_id)
            .is_some_and(|slot| slot.generation == generation);
        if !current {
            return;
        }

        let mut entries = inner.entries.write().unwrap_or_else(|e| e.into_inner());
        if let Some(entry) = entries.get_mut(&track_id) {
            if entry.is_downloading() && fraction > entry.progress {
                entry.progress = fraction.min(1.0);
            }
        }
    })
}

async fn persist(inner: &Inner) {
    let _guard = inner.persist_lock.lock().await;

    let json = {
        let entries = inner.entries.read().unwrap_or_else(|e| e.into_inner());
        serde_json::to_string(&*entries)
    };
    let json = match json {
        Ok(json) => json,
        Err(e) => {
            error!(error = %e, "Failed to serialize download metadata");
            return;
        }
    };

    if let Err(e) = inner.store.set(DOWNLOADS_KEY, &json).await {
        error!(error = %e, "Failed to persist download metadata");
    }
}

async fn file_exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}
