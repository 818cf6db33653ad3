//! Test doubles for the playback engine

use async_trait::async_trait;
use cadence_core::{CachedAudio, FavoriteLookup, MediaSource, PlayRecorder, Track};
use cadence_playback::{
    AcquireOptions, AudioBackend, AudioHandle, AudioSource, PlaybackConfig, PlaybackEngine,
    PlaybackError, PlaybackPorts, PlaybackStatus, StatusListener,
};
use cadence_storage::MemoryStore;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const DURATION_MS: u64 = 180_000;

pub fn track(id: &str) -> Track {
    Track::new(
        id,
        format!("Song {id}"),
        "Artist",
        MediaSource::remote(format!("https://cdn.example/{id}.mp3")),
    )
}

pub fn tracks(ids: &[&str]) -> Vec<Track> {
    ids.iter().map(|id| track(id)).collect()
}

pub fn url_of(id: &str) -> String {
    format!("https://cdn.example/{id}.mp3")
}

/// Every call made against the backend and its handles, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Acquire {
        handle: usize,
        source: AudioSource,
        volume: f32,
    },
    Play(usize),
    Pause(usize),
    Seek(usize, u64),
    SetVolume(usize, f32),
    Release(usize),
}

#[derive(Default)]
pub struct MockBackend {
    calls: Arc<Mutex<Vec<Call>>>,
    listeners: Mutex<Vec<StatusListener>>,
    failing: Mutex<HashSet<String>>,
    acquire_delay: Mutex<Option<Duration>>,
    fail_seeks: Arc<AtomicBool>,
}

impl MockBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make acquiring this remote locator fail
    pub fn fail_url(&self, url: impl Into<String>) {
        self.failing.lock().unwrap().insert(url.into());
    }

    pub fn clear_failures(&self) {
        self.failing.lock().unwrap().clear();
    }

    pub fn set_acquire_delay(&self, delay: Duration) {
        *self.acquire_delay.lock().unwrap() = Some(delay);
    }

    pub fn fail_seeks(&self) {
        self.fail_seeks.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Sources of every successful acquire
    pub fn acquired(&self) -> Vec<AudioSource> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Acquire { source, .. } => Some(source),
                _ => None,
            })
            .collect()
    }

    /// Deliver a status update as if from handle number `handle`
    pub fn emit(&self, handle: usize, status: PlaybackStatus) {
        let listener = self.listeners.lock().unwrap()[handle].clone();
        listener(status);
    }

    /// Index of the most recently acquired handle
    pub fn latest_handle(&self) -> usize {
        self.listeners.lock().unwrap().len() - 1
    }

    /// Signal natural completion on the latest handle
    pub fn finish_latest(&self) {
        self.emit(
            self.latest_handle(),
            PlaybackStatus {
                is_loaded: true,
                is_playing: false,
                position_ms: DURATION_MS,
                duration_ms: Some(DURATION_MS),
                did_just_finish: true,
                error: None,
            },
        );
    }
}

#[async_trait]
impl AudioBackend for MockBackend {
    async fn acquire(
        &self,
        source: AudioSource,
        options: AcquireOptions,
        listener: StatusListener,
    ) -> cadence_playback::Result<Box<dyn AudioHandle>> {
        let delay = *self.acquire_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let AudioSource::Remote(url) = &source {
            if self.failing.lock().unwrap().contains(url) {
                return Err(PlaybackError::audio(format!("cannot open {url}")));
            }
        }

        let handle = {
            let mut listeners = self.listeners.lock().unwrap();
            listeners.push(listener);
            listeners.len() - 1
        };
        self.calls.lock().unwrap().push(Call::Acquire {
            handle,
            source,
            volume: options.volume,
        });

        Ok(Box::new(MockHandle {
            id: handle,
            calls: self.calls.clone(),
            fail_seeks: self.fail_seeks.clone(),
        }))
    }
}

struct MockHandle {
    id: usize,
    calls: Arc<Mutex<Vec<Call>>>,
    fail_seeks: Arc<AtomicBool>,
}

impl MockHandle {
    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl AudioHandle for MockHandle {
    async fn status(&self) -> cadence_playback::Result<PlaybackStatus> {
        Ok(PlaybackStatus {
            is_loaded: true,
            is_playing: true,
            position_ms: 0,
            duration_ms: Some(DURATION_MS),
            did_just_finish: false,
            error: None,
        })
    }

    async fn play(&self) -> cadence_playback::Result<()> {
        self.record(Call::Play(self.id));
        Ok(())
    }

    async fn pause(&self) -> cadence_playback::Result<()> {
        self.record(Call::Pause(self.id));
        Ok(())
    }

    async fn seek(&self, position_ms: u64) -> cadence_playback::Result<()> {
        if self.fail_seeks.load(Ordering::SeqCst) {
            return Err(PlaybackError::audio("seek rejected"));
        }
        self.record(Call::Seek(self.id, position_ms));
        Ok(())
    }

    async fn set_volume(&self, volume: f32) -> cadence_playback::Result<()> {
        self.record(Call::SetVolume(self.id, volume));
        Ok(())
    }

    async fn release(&self) -> cadence_playback::Result<()> {
        self.record(Call::Release(self.id));
        Ok(())
    }
}

/// Download cache double keyed by track id
#[derive(Default)]
pub struct CacheStub {
    files: Mutex<HashMap<String, PathBuf>>,
}

impl CacheStub {
    pub fn insert(&self, id: &str, path: impl Into<PathBuf>) {
        self.files.lock().unwrap().insert(id.to_string(), path.into());
    }
}

#[async_trait]
impl CachedAudio for CacheStub {
    async fn cached_file(&self, track_id: &str) -> Option<PathBuf> {
        self.files.lock().unwrap().get(track_id).cloned()
    }
}

/// Records played ids, optionally taking a while to do so
#[derive(Default)]
pub struct RecorderStub {
    plays: Mutex<Vec<String>>,
    delay: Mutex<Option<Duration>>,
}

impl RecorderStub {
    pub fn plays(&self) -> Vec<String> {
        self.plays.lock().unwrap().clone()
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }
}

#[async_trait]
impl PlayRecorder for RecorderStub {
    async fn record_play(&self, track: &Track) {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.plays.lock().unwrap().push(track.id.clone());
    }
}

#[derive(Default)]
pub struct FavoritesStub {
    ids: Mutex<HashSet<String>>,
}

impl FavoritesStub {
    pub fn add(&self, id: &str) {
        self.ids.lock().unwrap().insert(id.to_string());
    }
}

impl FavoriteLookup for FavoritesStub {
    fn is_favorite(&self, track_id: &str) -> bool {
        self.ids.lock().unwrap().contains(track_id)
    }
}

pub struct Harness {
    pub engine: PlaybackEngine,
    pub backend: Arc<MockBackend>,
    pub cache: Arc<CacheStub>,
    pub history: Arc<RecorderStub>,
    pub favorites: Arc<FavoritesStub>,
    pub store: Arc<MemoryStore>,
}

pub async fn harness() -> Harness {
    harness_with_store(Arc::new(MemoryStore::new()), PlaybackConfig::default()).await
}

pub async fn harness_with_store(store: Arc<MemoryStore>, config: PlaybackConfig) -> Harness {
    let backend = MockBackend::new();
    let cache = Arc::new(CacheStub::default());
    let history = Arc::new(RecorderStub::default());
    let favorites = Arc::new(FavoritesStub::default());

    let engine = PlaybackEngine::new(
        PlaybackPorts {
            backend: backend.clone(),
            cache: cache.clone(),
            history: history.clone(),
            favorites: favorites.clone(),
            store: store.clone(),
        },
        config,
    )
    .await;

    Harness {
        engine,
        backend,
        cache,
        history,
        favorites,
        store,
    }
}

/// Poll an async condition until it holds
pub async fn eventually<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..400 {
        if check().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}

/// Give spawned status handlers a chance to run
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    tokio::time::sleep(Duration::from_millis(20)).await;
}
