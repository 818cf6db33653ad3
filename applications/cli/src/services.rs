//! Service bootstrap
//!
//! Stores are constructed once at startup and handed to their consumers.
//! Initialization order: Favorites, History, Downloads, then the Playback
//! engine, which reads the stores through its ports.

use crate::config::CadenceConfig;
use crate::error::{CliError, Result};
use cadence_core::{Catalog, KeyValueStore, MemoryCatalog, Track};
use cadence_downloads::{DownloadManager, HttpTransfer, Transfer};
use cadence_library::{FavoritesStore, HistoryTracker};
use cadence_playback::{AudioBackend, PlaybackConfig, PlaybackEngine, PlaybackPorts};
use cadence_storage::SqliteStore;
use std::sync::Arc;
use tracing::info;

/// The persisted stores and the catalog they resolve against
pub struct Stores {
    pub catalog: Arc<MemoryCatalog>,
    pub store: Arc<dyn KeyValueStore>,
    pub favorites: Arc<FavoritesStore>,
    pub history: Arc<HistoryTracker>,
    pub downloads: DownloadManager,
    playback: PlaybackConfig,
}

impl Stores {
    /// Load every store from `store`, reconciling downloads with the disk
    pub async fn load(
        config: &CadenceConfig,
        catalog: Arc<MemoryCatalog>,
        store: Arc<dyn KeyValueStore>,
        transfer: Arc<dyn Transfer>,
    ) -> Self {
        let favorites = Arc::new(FavoritesStore::load(store.clone(), catalog.as_ref()).await);
        let history = Arc::new(
            HistoryTracker::load(
                store.clone(),
                catalog.clone(),
                config.playback.max_history,
            )
            .await,
        );
        let downloads =
            DownloadManager::load(store.clone(), transfer, config.storage.download_dir.clone())
                .await;

        info!(
            tracks = catalog.len(),
            favorites = favorites.len(),
            history = history.len(),
            downloads = downloads.downloads().len(),
            "Stores loaded"
        );

        Self {
            catalog,
            store,
            favorites,
            history,
            downloads,
            playback: config.playback_config(),
        }
    }

    /// Open the configured catalog file and SQLite store, using HTTP transfers
    pub async fn open(config: &CadenceConfig) -> Result<Self> {
        let catalog = Arc::new(MemoryCatalog::load(&config.catalog.path)?);
        let store = Arc::new(SqliteStore::open(&config.storage.database_url).await?);

        Ok(Self::load(config, catalog, store, Arc::new(HttpTransfer::new())).await)
    }

    /// Look up a catalog track by id
    pub fn track(&self, id: &str) -> Result<&Track> {
        self.catalog
            .by_id(id)
            .ok_or_else(|| CliError::UnknownTrack(id.to_string()))
    }
}

/// Stores plus the playback engine wired to them
pub struct Services {
    pub stores: Stores,
    pub engine: PlaybackEngine,
}

impl Services {
    /// Build the playback engine over loaded stores
    pub async fn start(stores: Stores, backend: Arc<dyn AudioBackend>) -> Self {
        let ports = PlaybackPorts {
            backend,
            cache: Arc::new(stores.downloads.clone()),
            history: stores.history.clone(),
            favorites: stores.favorites.clone(),
            store: stores.store.clone(),
        };
        let engine = PlaybackEngine::new(ports, stores.playback).await;

        Self { stores, engine }
    }

    /// Cancel the sleep timer, release the audio resource and write out
    /// the listening history
    pub async fn shutdown(&self) {
        self.engine.shutdown().await;
        self.stores.history.flush().await;
    }
}
