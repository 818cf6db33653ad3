//! Favorites store
//!
//! Insertion order is favorite order. The id set mirrors `items` exactly.

use cadence_core::{Catalog, FavoriteLookup, KeyValueStore, Track, TrackId};
use cadence_storage::keys::FAVORITES_KEY;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Persisted favorites entry
///
/// Older builds stored bare ids; those are resolved through the catalog.
#[derive(Deserialize)]
#[serde(untagged)]
enum PersistedFavorite {
    Track(Track),
    Id(String),
    Unknown(serde_json::Value),
}

#[derive(Debug, Default)]
struct Favorites {
    items: Vec<Track>,
    ids: HashSet<TrackId>,
}

impl Favorites {
    fn from_tracks(tracks: impl IntoIterator<Item = Track>) -> Self {
        let mut favorites = Self::default();
        for track in tracks {
            if favorites.ids.insert(track.id.clone()) {
                favorites.items.push(track);
            }
        }
        favorites
    }
}

/// Ordered set of favorited tracks
pub struct FavoritesStore {
    store: Arc<dyn KeyValueStore>,
    state: RwLock<Favorites>,
    // Serializes writes so the last write always carries the latest snapshot
    persist_lock: Mutex<()>,
}

impl FavoritesStore {
    /// Create an empty store
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            state: RwLock::new(Favorites::default()),
            persist_lock: Mutex::new(()),
        }
    }

    /// Load persisted favorites, normalized against the catalog
    ///
    /// Legacy id-only entries are resolved through the catalog, and entries
    /// whose id the catalog no longer knows are dropped. A read failure is
    /// logged and yields an empty store.
    pub async fn load(store: Arc<dyn KeyValueStore>, catalog: &dyn Catalog) -> Self {
        let favorites = Self::new(store);

        let raw = match favorites.store.get(FAVORITES_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return favorites,
            Err(e) => {
                error!(error = %e, "Failed to load favorites");
                return favorites;
            }
        };

        let entries: Vec<PersistedFavorite> = match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                error!(error = %e, "Persisted favorites are not a JSON array, ignoring");
                return favorites;
            }
        };

        let tracks = entries.into_iter().filter_map(|entry| match entry {
            PersistedFavorite::Track(track) if catalog.contains(&track.id) => Some(track),
            PersistedFavorite::Id(id) => catalog.by_id(&id).cloned(),
            PersistedFavorite::Track(track) => {
                debug!(track_id = %track.id, "Dropping favorite missing from catalog");
                None
            }
            PersistedFavorite::Unknown(value) => {
                warn!(entry = %value, "Dropping unreadable favorite entry");
                None
            }
        });

        *favorites.write() = Favorites::from_tracks(tracks);
        info!(count = favorites.len(), "Loaded favorites");
        favorites
    }

    /// Add a track to the end of the favorites
    ///
    /// Returns `false` (and changes nothing) if it is already a favorite.
    pub async fn add_favorite(&self, track: &Track) -> bool {
        if !track.has_valid_id() {
            warn!("add_favorite called with a track without id");
            return false;
        }

        {
            let mut state = self.write();
            if state.ids.contains(&track.id) {
                info!(track_id = %track.id, title = %track.title, "Track is already a favorite");
                return false;
            }
            state.ids.insert(track.id.clone());
            state.items.push(track.clone());
        }

        debug!(track_id = %track.id, "Added favorite");
        self.persist().await;
        true
    }

    /// Remove a track from the favorites
    ///
    /// Returns `false` if it was not a favorite.
    pub async fn remove_favorite(&self, track_id: &str) -> bool {
        {
            let mut state = self.write();
            if !state.ids.remove(track_id) {
                return false;
            }
            state.items.retain(|track| track.id != track_id);
        }

        debug!(track_id = %track_id, "Removed favorite");
        self.persist().await;
        true
    }

    /// Add if absent, remove if present; returns the new membership
    pub async fn toggle_favorite(&self, track: &Track) -> bool {
        if self.is_favorite(&track.id) {
            self.remove_favorite(&track.id).await;
            false
        } else {
            self.add_favorite(track).await
        }
    }

    /// Whether a track id is favorited
    pub fn is_favorite(&self, track_id: &str) -> bool {
        self.read().ids.contains(track_id)
    }

    /// Favorited tracks in favorite order
    pub fn items(&self) -> Vec<Track> {
        self.read().items.clone()
    }

    /// Favorited ids
    pub fn ids(&self) -> HashSet<TrackId> {
        self.read().ids.clone()
    }

    /// Number of favorites
    pub fn len(&self) -> usize {
        self.read().items.len()
    }

    /// Check if there are no favorites
    pub fn is_empty(&self) -> bool {
        self.read().items.is_empty()
    }

    async fn persist(&self) {
        let _guard = self.persist_lock.lock().await;

        let json = match serde_json::to_string(&self.read().items) {
            Ok(json) => json,
            Err(e) => {
                error!(error = %e, "Failed to serialize favorites");
                return;
            }
        };

        if let Err(e) = self.store.set(FAVORITES_KEY, &json).await {
            error!(error = %e, "Failed to save favorites");
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Favorites> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Favorites> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl FavoriteLookup for FavoritesStore {
    fn is_favorite(&self, track_id: &str) -> bool {
        FavoritesStore::is_favorite(self, track_id)
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

    #[tokio::test]
    async fn add_is_idempotent() {
        let favorites = FavoritesStore::new(Arc::new(MemoryStore::new()));

        assert!(favorites.add_favorite(&track("1")).await);
        assert!(!favorites.add_favorite(&track("1")).await);

        assert_eq!(favorites.len(), 1);
    }

    #[tokio::test]
    async fn remove_absent_is_noop() {
        let favorites = FavoritesStore::new(Arc::new(MemoryStore::new()));
        favorites.add_favorite(&track("1")).await;

        assert!(!favorites.remove_favorite("2").await);
        assert_eq!(favorites.len(), 1);
    }

    #[tokio::test]
    async fn toggle_flips_membership() {
        let favorites = FavoritesStore::new(Arc::new(MemoryStore::new()));

        assert!(favorites.toggle_favorite(&track("1")).await);
        assert!(favorites.is_favorite("1"));
        assert!(!favorites.toggle_favorite(&track("1")).await);
        assert!(!favorites.is_favorite("1"));
    }

    #[tokio::test]
    async fn track_without_id_is_rejected() {
        let favorites = FavoritesStore::new(Arc::new(MemoryStore::new()));
        assert!(!favorites.add_favorite(&track("")).await);
        assert!(favorites.is_empty());
    }

    #[tokio::test]
    async fn duplicate_persisted_entries_collapse() {
        let catalog = MemoryCatalog::new(vec![track("1")]);
        let store = Arc::new(MemoryStore::with_entries([(FAVORITES_KEY, r#"["1","1"]"#)]));

        let favorites = FavoritesStore::load(store, &catalog).await;
        assert_eq!(favorites.len(), 1);
    }
}
