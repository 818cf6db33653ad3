//! Catalog index contract and the in-memory catalog
//!
//! The catalog is the immutable, ordered song index every store resolves
//! ids against. It is loaded once and never mutated for the session.

use crate::error::{CoreError, Result};
use crate::types::Track;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// Read-only song index
///
/// Implementors must return the same order from `list_all` for the whole
/// session; `by_id` is expected to be O(1).
pub trait Catalog: Send + Sync {
    /// All tracks in catalog order
    fn list_all(&self) -> &[Track];

    /// Look up a track by id
    fn by_id(&self, id: &str) -> Option<&Track>;

    /// Check whether an id is known to the catalog
    fn contains(&self, id: &str) -> bool {
        self.by_id(id).is_some()
    }

    /// Case-insensitive substring search over title and artist
    ///
    /// An empty query matches nothing.
    fn search(&self, query: &str) -> Vec<Track> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }

        self.list_all()
            .iter()
            .filter(|track| {
                track.title.to_lowercase().contains(&query)
                    || track.artist.to_lowercase().contains(&query)
            })
            .cloned()
            .collect()
    }

    /// All tracks by an artist, in catalog order
    fn by_artist(&self, artist: &str) -> Vec<Track> {
        self.list_all()
            .iter()
            .filter(|track| track.artist == artist)
            .cloned()
            .collect()
    }

    /// All tracks from an album, in catalog order
    fn by_album(&self, album: &str) -> Vec<Track> {
        self.list_all()
            .iter()
            .filter(|track| track.album.as_deref() == Some(album))
            .cloned()
            .collect()
    }

    /// All tracks tagged with a genre, in catalog order
    fn by_genre(&self, genre: &str) -> Vec<Track> {
        self.list_all()
            .iter()
            .filter(|track| track.genre.iter().any(|g| g == genre))
            .cloned()
            .collect()
    }
}

/// Catalog held entirely in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    tracks: Vec<Track>,
    index: HashMap<String, usize>,
}

impl MemoryCatalog {
    /// Build a catalog from an ordered list of tracks
    ///
    /// Duplicate ids keep their first occurrence.
    pub fn new(tracks: Vec<Track>) -> Self {
        let mut kept = Vec::with_capacity(tracks.len());
        let mut index = HashMap::with_capacity(tracks.len());

        for track in tracks {
            if index.contains_key(&track.id) {
                warn!(track_id = %track.id, "Duplicate track id in catalog, keeping first");
                continue;
            }
            index.insert(track.id.clone(), kept.len());
            kept.push(track);
        }

        Self {
            tracks: kept,
            index,
        }
    }

    /// Parse a catalog from a JSON array of track records
    pub fn from_json(json: &str) -> Result<Self> {
        let tracks: Vec<Track> = serde_json::from_str(json)?;
        Ok(Self::new(tracks))
    }

    /// Load a catalog from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            CoreError::catalog(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let catalog = Self::from_json(&json)?;
        debug!(path = %path.display(), tracks = catalog.len(), "Loaded catalog");
        Ok(catalog)
    }

    /// Number of tracks
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Check if the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

impl Catalog for MemoryCatalog {
    fn list_all(&self) -> &[Track] {
        &self.tracks
    }

    fn by_id(&self, id: &str) -> Option<&Track> {
        self.index.get(id).map(|&i| &self.tracks[i])
    }
}
