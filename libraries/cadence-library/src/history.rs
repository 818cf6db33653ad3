//! Listening history
//!
//! Maintains a bounded, most-recent-first list of played track ids.
//! Replaying a track moves it to the front instead of adding a second entry.

use async_trait::async_trait;
use cadence_core::{Catalog, KeyValueStore, PlayRecorder, Track, TrackId};
use cadence_storage::keys::HISTORY_KEY;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

/// Maximum number of history entries
pub const MAX_HISTORY_LENGTH: usize = 100;

/// Bounded listening history
///
/// Callers only ever see materialized tracks; ids the catalog no longer
/// knows are skipped on read but kept in the persisted list.
pub struct HistoryTracker {
    store: Arc<dyn KeyValueStore>,
    catalog: Arc<dyn Catalog>,

    /// Most recent at the front
    ids: RwLock<VecDeque<TrackId>>,

    max_len: usize,

    /// Bumped on every snapshot taken for persistence
    revision: AtomicU64,

    /// Last revision written; older snapshots are skipped
    written: Arc<Mutex<u64>>,
}

impl HistoryTracker {
    /// Create an empty history with the default bound
    pub fn new(store: Arc<dyn KeyValueStore>, catalog: Arc<dyn Catalog>) -> Self {
        Self::with_max_len(store, catalog, MAX_HISTORY_LENGTH)
    }

    /// Create an empty history with a custom bound
    pub fn with_max_len(
        store: Arc<dyn KeyValueStore>,
        catalog: Arc<dyn Catalog>,
        max_len: usize,
    ) -> Self {
        let max_len = max_len.max(1);
        Self {
            store,
            catalog,
            ids: RwLock::new(VecDeque::with_capacity(max_len)),
            max_len,
            revision: AtomicU64::new(0),
            written: Arc::new(Mutex::new(0)),
        }
    }

    /// Load persisted history
    ///
    /// A read or parse failure is logged and yields an empty history.
    pub async fn load(
        store: Arc<dyn KeyValueStore>,
        catalog: Arc<dyn Catalog>,
        max_len: usize,
    ) -> Self {
        let history = Self::with_max_len(store, catalog, max_len);

        let ids: Vec<TrackId> = match history.store.get(HISTORY_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(ids) => ids,
                Err(e) => {
                    error!(error = %e, "Persisted history is not a JSON id array, ignoring");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                error!(error = %e, "Failed to load listening history");
                Vec::new()
            }
        };

        {
            let mut seen = HashSet::new();
            let mut state = history.write();
            for id in ids {
                if state.len() == history.max_len {
                    break;
                }
                if seen.insert(id.clone()) {
                    state.push_back(id);
                }
            }
        }

        info!(count = history.tracks().len(), "Loaded listening history");
        history
    }

    /// Record a play: move (or insert) the track to the front
    ///
    /// The in-memory list is updated before returning; the write to the
    /// store happens in the background.
    pub async fn add_song_to_history(&self, track: &Track) {
        if !track.has_valid_id() {
            return;
        }

        let snapshot = {
            let mut ids = self.write();
            ids.retain(|id| id != &track.id);
            ids.push_front(track.id.clone());
            ids.truncate(self.max_len);
            self.snapshot(&ids)
        };

        debug!(track_id = %track.id, "Recorded play in history");
        self.persist_in_background(snapshot);
    }

    /// Played tracks, most recent first
    pub fn tracks(&self) -> Vec<Track> {
        self.read()
            .iter()
            .filter_map(|id| self.catalog.by_id(id).cloned())
            .collect()
    }

    /// Number of stored entries, including ids the catalog no longer knows
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Check if the history is empty
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Maximum number of entries
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Forget all plays; persisted in the background
    pub async fn clear(&self) {
        let snapshot = {
            let mut ids = self.write();
            ids.clear();
            self.snapshot(&ids)
        };
        info!("Cleared listening history");
        self.persist_in_background(snapshot);
    }

    /// Write the current list now
    ///
    /// Background writes still pending after this are stale and skipped.
    pub async fn flush(&self) {
        let snapshot = self.snapshot(&self.read());
        if let Some((revision, json)) = snapshot {
            write_snapshot(self.store.as_ref(), &self.written, revision, json).await;
        }
    }

    /// Serialize `ids` under the caller's lock, tagging it with a revision
    fn snapshot(&self, ids: &VecDeque<TrackId>) -> Option<(u64, String)> {
        match serde_json::to_string(ids) {
            Ok(json) => Some((self.revision.fetch_add(1, Ordering::Relaxed) + 1, json)),
            Err(e) => {
                error!(error = %e, "Failed to serialize listening history");
                None
            }
        }
    }

    fn persist_in_background(&self, snapshot: Option<(u64, String)>) {
        let Some((revision, json)) = snapshot else {
            return;
        };
        let store = self.store.clone();
        let written = self.written.clone();
        tokio::spawn(async move {
            write_snapshot(store.as_ref(), &written, revision, json).await;
        });
    }

    fn read(&self) -> RwLockReadGuard<'_, VecDeque<TrackId>> {
        self.ids.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, VecDeque<TrackId>> {
        self.ids.write().unwrap_or_else(|e| e.into_inner())
    }
}

async fn write_snapshot(
    store: &dyn KeyValueStore,
    written: &Mutex<u64>,
    revision: u64,
    json: String,
) {
    let mut last = written.lock().await;
    if *last >= revision {
        return;
    }
    *last = revision;

    if let Err(e) = store.set(HISTORY_KEY, &json).await {
        error!(error = %e, "Failed to save listening history");
    }
}

#[async_trait]
impl PlayRecorder for HistoryTracker {
    async fn record_play(&self, track: &Track) {
        self.add_song_to_history(track).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::{MediaSource, MemoryCatalog};
    use cadence_storage::MemoryStore;

    fn track(id: &str) -> Track {
        Track::new(id, format!("Song {id}"), "Artist", MediaSource::Bundled(1))
    }

    fn tracker(max_len: usize) -> HistoryTracker {
        let catalog = MemoryCatalog::new((1..=5).map(|i| track(&i.to_string())).collect());
        HistoryTracker::with_max_len(Arc::new(MemoryStore::new()), Arc::new(catalog), max_len)
    }

    fn ids(history: &HistoryTracker) -> Vec<String> {
        history.tracks().into_iter().map(|t| t.id).collect()
    }

    #[tokio::test]
    async fn most_recent_first() {
        let history = tracker(10);
        history.add_song_to_history(&track("1")).await;
        history.add_song_to_history(&track("2")).await;
        history.add_song_to_history(&track("3")).await;

        assert_eq!(ids(&history), vec!["3", "2", "1"]);
    }

    #[tokio::test]
    async fn replay_moves_to_front() {
        let history = tracker(10);
        history.add_song_to_history(&track("1")).await;
        history.add_song_to_history(&track("2")).await;
        history.add_song_to_history(&track("1")).await;

        assert_eq!(ids(&history), vec!["1", "2"]);
    }

    #[tokio::test]
    async fn bounded_drops_oldest() {
        let history = tracker(3);
        for id in ["1", "2", "3", "4"] {
            history.add_song_to_history(&track(id)).await;
        }

        assert_eq!(history.len(), 3);
        assert_eq!(ids(&history), vec!["4", "3", "2"]);
    }

    #[tokio::test]
    async fn invalid_track_is_ignored() {
        let history = tracker(3);
        history.add_song_to_history(&track("")).await;
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn unknown_ids_are_hidden_but_kept() {
        let history = tracker(10);
        history.add_song_to_history(&track("1")).await;
        history.add_song_to_history(&track("gone")).await;

        assert_eq!(history.len(), 2);
        assert_eq!(ids(&history), vec!["1"]);
    }

    #[tokio::test]
    async fn clear_empties() {
        let history = tracker(10);
        history.add_song_to_history(&track("1")).await;
        history.clear().await;
        assert!(history.tracks().is_empty());
    }
}
