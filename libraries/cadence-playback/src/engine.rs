//! Playback engine
//!
//! Owns the single active audio resource, the play queue, shuffle/repeat
//! policy, volume and the sleep timer. Reads the download cache and
//! favorites through narrow ports and records plays into the history.
//!
//! Errors never cross the public operations: a failed load leaves the
//! engine with the attempted track active and `is_playing == false`.

use crate::backend::{AudioBackend, AudioHandle, StatusListener};
use crate::error::PlaybackError;
use crate::queue::{Advance, PlayQueue};
use crate::types::{
    AcquireOptions, AudioSource, PlaybackConfig, PlaybackSnapshot, PlaybackStatus, RepeatMode,
};
use cadence_core::{
    current_line, parse_lrc, CachedAudio, FavoriteLookup, KeyValueStore, LyricLine, MediaSource,
    PlayRecorder, Track,
};
use cadence_storage::keys::VOLUME_KEY;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::runtime::Handle as RuntimeHandle;
use tokio::sync::{Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Collaborators the engine is constructed with
pub struct PlaybackPorts {
    pub backend: Arc<dyn AudioBackend>,
    pub cache: Arc<dyn CachedAudio>,
    pub history: Arc<dyn PlayRecorder>,
    pub favorites: Arc<dyn FavoriteLookup>,
    pub store: Arc<dyn KeyValueStore>,
}

struct EngineState {
    active: Option<Track>,
    handle: Option<Box<dyn AudioHandle>>,

    /// Generation of `handle`; status updates from other generations are stale
    handle_generation: u64,

    is_playing: bool,
    position_ms: u64,
    duration_ms: Option<u64>,
    queue: PlayQueue,
    shuffle: bool,
    repeat: RepeatMode,
    volume: f32,
}

struct SleepTimer {
    id: u64,
    task: JoinHandle<()>,
}

struct EngineInner {
    ports: PlaybackPorts,
    runtime: RuntimeHandle,
    state: Mutex<EngineState>,

    /// Held for the duration of a load; re-entrant loads are dropped
    loading: AtomicBool,

    next_generation: AtomicU64,
    sleep_timer: std::sync::Mutex<Option<SleepTimer>>,
}

/// Clears the loading flag when a load ends, including on early return
struct LoadingGuard<'a>(&'a AtomicBool);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Playback engine
///
/// Cheap to clone; clones drive the same engine. Must be created inside a
/// tokio runtime, which is used to process status updates and timers.
#[derive(Clone)]
pub struct PlaybackEngine {
    inner: Arc<EngineInner>,
}

impl PlaybackEngine {
    /// Create the engine, restoring the persisted volume
    ///
    /// Falls back to `config.default_volume` when nothing usable is stored.
    pub async fn new(ports: PlaybackPorts, config: PlaybackConfig) -> Self {
        let volume = load_volume(ports.store.as_ref(), config.default_volume).await;
        info!(volume, "Playback engine ready");

        Self {
            inner: Arc::new(EngineInner {
                ports,
                runtime: RuntimeHandle::current(),
                state: Mutex::new(EngineState {
                    active: None,
                    handle: None,
                    handle_generation: 0,
                    is_playing: false,
                    position_ms: 0,
                    duration_ms: None,
                    queue: PlayQueue::new(),
                    shuffle: false,
                    repeat: RepeatMode::Off,
                    volume,
                }),
                loading: AtomicBool::new(false),
                next_generation: AtomicU64::new(1),
                sleep_timer: std::sync::Mutex::new(None),
            }),
        }
    }

    /// Play a track, optionally replacing the queue
    ///
    /// Playing the already-loaded track toggles pause instead of reloading.
    /// Calls arriving while another load is in flight are dropped.
    pub async fn play_song(&self, track: &Track, queue: Option<Vec<Track>>) {
        if !track.has_valid_id() {
            warn!("play_song called with a track without an id");
            return;
        }
        if self.is_loading() {
            debug!(track_id = %track.id, "Load in progress, dropping play request");
            return;
        }

        {
            let mut state = self.inner.state.lock().await;
            let same_track = state.active.as_ref().is_some_and(|t| t.id == track.id);
            if same_track && state.handle.is_some() {
                toggle(&mut state).await;
                return;
            }
        }

        if self
            .inner
            .loading
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(track_id = %track.id, "Load in progress, dropping play request");
            return;
        }
        let loading = LoadingGuard(&self.inner.loading);

        info!(track_id = %track.id, title = %track.title, "Loading track");
        let (previous, volume) = {
            let mut state = self.inner.state.lock().await;
            state.active = Some(track.clone());
            state.is_playing = false;
            state.position_ms = 0;
            state.duration_ms = None;
            (state.handle.take(), state.volume)
        };

        // Unlocked across release and acquire; the loading flag keeps other
        // loads out and the generation keeps early status updates out.
        if let Some(previous) = previous {
            if let Err(e) = previous.release().await {
                warn!(error = %e, "Failed to release previous audio resource");
            }
        }

        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
        let loaded = self.load(track, volume, generation).await;

        let mut state = self.inner.state.lock().await;
        match loaded {
            Ok((handle, status)) => {
                if state.volume != volume {
                    if let Err(e) = handle.set_volume(state.volume).await {
                        warn!(error = %e, "Failed to apply volume changed during load");
                    }
                }
                state.handle = Some(handle);
                state.handle_generation = generation;
                state.is_playing = true;
                state.position_ms = status.position_ms;
                state.duration_ms = status.duration_ms;

                if let Some(queue) = queue {
                    let shuffle = state.shuffle;
                    state
                        .queue
                        .replace(queue, &track.id, shuffle, &mut rand::thread_rng());
                }
                drop(state);
                drop(loading);

                info!(track_id = %track.id, "Playback started");
                self.inner.ports.history.record_play(track).await;
            }
            Err(e) => {
                error!(track_id = %track.id, error = %e, "Failed to load track");
            }
        }
    }

    /// Resolve the source and acquire a resource for it
    async fn load(
        &self,
        track: &Track,
        volume: f32,
        generation: u64,
    ) -> Result<(Box<dyn AudioHandle>, PlaybackStatus), PlaybackError> {
        let source = self.resolve_source(track).await?;
        debug!(track_id = %track.id, source = ?source, "Resolved audio source");

        let options = AcquireOptions {
            autoplay: true,
            volume,
        };
        let handle = self
            .inner
            .ports
            .backend
            .acquire(source, options, self.status_listener(generation))
            .await
            .map_err(|e| PlaybackError::load(&track.id, e.to_string()))?;

        let status = match handle.status().await {
            Ok(status) => status,
            Err(e) => {
                warn!(track_id = %track.id, error = %e, "Failed to read initial status");
                PlaybackStatus::default()
            }
        };
        Ok((handle, status))
    }

    /// Cached file if present on disk, else the track's own source
    async fn resolve_source(&self, track: &Track) -> Result<AudioSource, PlaybackError> {
        if let Some(path) = self.inner.ports.cache.cached_file(&track.id).await {
            debug!(track_id = %track.id, path = %path.display(), "Playing from local cache");
            return Ok(AudioSource::File(path));
        }

        match &track.audio_source {
            MediaSource::Bundled(asset) => Ok(AudioSource::Bundled(*asset)),
            remote => remote
                .as_remote()
                .map(|url| AudioSource::Remote(url.to_string()))
                .ok_or_else(|| PlaybackError::load(&track.id, "no audio source")),
        }
    }

    fn status_listener(&self, generation: u64) -> StatusListener {
        let weak: Weak<EngineInner> = Arc::downgrade(&self.inner);
        let runtime = self.inner.runtime.clone();

        Arc::new(move |status: PlaybackStatus| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            runtime.spawn(async move {
                PlaybackEngine { inner }
                    .handle_status(generation, status)
                    .await;
            });
        })
    }

    /// Apply a status update from the resource of `generation`
    async fn handle_status(&self, generation: u64, status: PlaybackStatus) {
        let mut state = self.inner.state.lock().await;
        if state.handle.is_none() || state.handle_generation != generation {
            debug!(generation, "Ignoring status from a replaced audio resource");
            return;
        }

        if !status.is_loaded {
            if let Some(err) = status.error {
                error!(error = %err, "Playback error");
                state.is_playing = false;
            }
            return;
        }

        state.is_playing = status.is_playing;
        state.position_ms = status.position_ms;
        if status.duration_ms.is_some() {
            state.duration_ms = status.duration_ms;
        }

        if !status.did_just_finish {
            return;
        }

        let repeat = state.repeat;
        debug!(repeat = ?repeat, "Track finished");
        match repeat {
            RepeatMode::One => replay(&mut state).await,
            RepeatMode::All => {
                drop(state);
                self.play_next(true).await;
            }
            RepeatMode::Off => {
                drop(state);
                self.play_next(false).await;
            }
        }
    }

    /// Toggle pause/resume; reloads the active track if no resource is held
    pub async fn handle_play_pause(&self) {
        if self.is_loading() {
            return;
        }

        let mut state = self.inner.state.lock().await;
        if state.handle.is_some() {
            toggle(&mut state).await;
            return;
        }

        let active = state.active.clone();
        drop(state);
        if let Some(track) = active {
            self.play_song(&track, None).await;
        }
    }

    /// Move the playhead; failures are logged
    pub async fn seek_to(&self, position_ms: u64) {
        let mut state = self.inner.state.lock().await;
        let Some(handle) = state.handle.as_ref() else {
            return;
        };

        let result = handle.seek(position_ms).await;
        match result {
            Ok(()) => state.position_ms = position_ms,
            Err(e) => warn!(position_ms, error = %e, "Seek failed"),
        }
    }

    /// Advance through the queue
    ///
    /// `repeat_all` marks a repeat-all continuation, which always steps
    /// sequentially and wraps.
    pub async fn play_next(&self, repeat_all: bool) {
        let mut state = self.inner.state.lock().await;
        let Some(active) = state.active.clone() else {
            return;
        };

        let advance =
            state
                .queue
                .next(&active.id, state.shuffle, repeat_all, &mut rand::thread_rng());
        match advance {
            Advance::Play(track) if track.id == active.id => replay(&mut state).await,
            Advance::Play(track) => {
                drop(state);
                self.play_song(&track, None).await;
            }
            Advance::EndOfQueue => {
                info!("Reached end of queue, stopping");
                if let Some(handle) = state.handle.as_ref() {
                    if let Err(e) = handle.pause().await {
                        warn!(error = %e, "Failed to pause at end of queue");
                    }
                    if let Err(e) = handle.seek(0).await {
                        warn!(error = %e, "Failed to rewind at end of queue");
                    }
                }
                state.is_playing = false;
                state.position_ms = 0;
            }
            Advance::Empty => {}
        }
    }

    /// Step back through the queue
    pub async fn play_previous(&self) {
        let mut state = self.inner.state.lock().await;
        let Some(active) = state.active.clone() else {
            return;
        };

        let advance = state
            .queue
            .previous(&active.id, state.shuffle, &mut rand::thread_rng());
        match advance {
            Advance::Play(track) if track.id == active.id => replay(&mut state).await,
            Advance::Play(track) => {
                drop(state);
                self.play_song(&track, None).await;
            }
            Advance::EndOfQueue | Advance::Empty => {}
        }
    }

    /// Flip shuffle and recompute the playback order around the active track
    pub async fn toggle_shuffle(&self) -> bool {
        let mut state = self.inner.state.lock().await;
        state.shuffle = !state.shuffle;

        let anchor = state.active.as_ref().map(|t| t.id.clone());
        if state.shuffle {
            state
                .queue
                .shuffle(anchor.as_deref(), &mut rand::thread_rng());
        } else {
            state.queue.unshuffle(anchor.as_deref());
        }

        info!(shuffle = state.shuffle, "Shuffle toggled");
        state.shuffle
    }

    /// Cycle `off → all → one → off`
    pub async fn toggle_repeat_mode(&self) -> RepeatMode {
        let mut state = self.inner.state.lock().await;
        state.repeat = state.repeat.cycle();
        info!(repeat = ?state.repeat, "Repeat mode changed");
        state.repeat
    }

    /// Pause after `duration`, replacing any pending timer
    pub fn set_sleep_timer(&self, duration: Duration) {
        let id = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
        let weak = Arc::downgrade(&self.inner);

        let task = self.inner.runtime.spawn(async move {
            tokio::time::sleep(duration).await;
            if let Some(inner) = weak.upgrade() {
                PlaybackEngine { inner }.sleep_timer_fired(id).await;
            }
        });

        let previous = self
            .lock_sleep_timer()
            .replace(SleepTimer { id, task });
        if let Some(previous) = previous {
            previous.task.abort();
        }
        info!(duration_ms = duration.as_millis() as u64, "Sleep timer set");
    }

    /// Cancel the pending sleep timer, if any
    pub fn clear_sleep_timer(&self) {
        if let Some(timer) = self.lock_sleep_timer().take() {
            timer.task.abort();
            info!("Sleep timer cleared");
        }
    }

    async fn sleep_timer_fired(&self, id: u64) {
        {
            let mut slot = self.lock_sleep_timer();
            if slot.as_ref().map(|t| t.id) != Some(id) {
                return;
            }
            *slot = None;
        }

        let mut state = self.inner.state.lock().await;
        if state.is_playing {
            if let Some(handle) = state.handle.as_ref() {
                if let Err(e) = handle.pause().await {
                    warn!(error = %e, "Sleep timer failed to pause");
                    return;
                }
                state.is_playing = false;
            }
        }
        info!("Sleep timer elapsed");
    }

    /// Set the volume, clamped to `[0, 1]`, and persist it
    pub async fn set_song_volume(&self, volume: f32) {
        if volume.is_nan() {
            warn!("Ignoring NaN volume");
            return;
        }
        let volume = volume.clamp(0.0, 1.0);

        {
            let mut state = self.inner.state.lock().await;
            state.volume = volume;
            if let Some(handle) = state.handle.as_ref() {
                if let Err(e) = handle.set_volume(volume).await {
                    warn!(volume, error = %e, "Failed to apply volume");
                }
            }
        }

        if let Err(e) = self
            .inner
            .ports
            .store
            .set(VOLUME_KEY, &volume.to_string())
            .await
        {
            error!(error = %e, "Failed to persist volume");
        }
    }

    /// Whether a load is in flight
    pub fn is_loading(&self) -> bool {
        self.inner.loading.load(Ordering::Acquire)
    }

    /// Observable state for renderers
    pub async fn snapshot(&self) -> PlaybackSnapshot {
        let sleep_timer_armed = self.lock_sleep_timer().is_some();
        let state = self.inner.state.lock().await;
        let is_favorite = state
            .active
            .as_ref()
            .is_some_and(|t| self.inner.ports.favorites.is_favorite(&t.id));

        PlaybackSnapshot {
            active_track: state.active.clone(),
            is_playing: state.is_playing,
            is_loading: self.is_loading(),
            position_ms: state.position_ms,
            duration_ms: state.duration_ms,
            queue: state.queue.ids(),
            shuffle: state.shuffle,
            repeat: state.repeat,
            volume: state.volume,
            sleep_timer_armed,
            is_favorite,
        }
    }

    /// Queue in playback order
    pub async fn queue(&self) -> Vec<Track> {
        self.inner.state.lock().await.queue.tracks().to_vec()
    }

    /// Queue in the caller's order
    pub async fn base_queue(&self) -> Vec<Track> {
        self.inner.state.lock().await.queue.base().to_vec()
    }

    /// Parsed lyrics of the active track and the line at the playhead
    pub async fn lyrics(&self) -> (Vec<LyricLine>, Option<usize>) {
        let state = self.inner.state.lock().await;
        let lines = state
            .active
            .as_ref()
            .and_then(|t| t.lyrics.as_deref())
            .map(parse_lrc)
            .unwrap_or_default();
        let current = current_line(&lines, state.position_ms);
        (lines, current)
    }

    /// Cancel the sleep timer and release the audio resource
    pub async fn shutdown(&self) {
        self.clear_sleep_timer();

        let mut state = self.inner.state.lock().await;
        if let Some(handle) = state.handle.take() {
            if let Err(e) = handle.release().await {
                warn!(error = %e, "Failed to release audio resource");
            }
        }
        state.is_playing = false;
        info!("Playback engine shut down");
    }

    fn lock_sleep_timer(&self) -> std::sync::MutexGuard<'_, Option<SleepTimer>> {
        self.inner
            .sleep_timer
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }
}

/// Pause or resume the held resource, mirroring `is_playing` on success
async fn toggle(state: &mut MutexGuard<'_, EngineState>) {
    let Some(handle) = state.handle.as_ref() else {
        return;
    };

    let result = if state.is_playing {
        handle.pause().await
    } else {
        handle.play().await
    };
    match result {
        Ok(()) => state.is_playing = !state.is_playing,
        Err(e) => warn!(error = %e, "Failed to toggle playback"),
    }
}

/// Restart the held resource in place
async fn replay(state: &mut MutexGuard<'_, EngineState>) {
    let Some(handle) = state.handle.as_ref() else {
        return;
    };

    let result = handle.replay().await;
    match result {
        Ok(()) => {
            state.is_playing = true;
            state.position_ms = 0;
        }
        Err(e) => warn!(error = %e, "Failed to replay track"),
    }
}

async fn load_volume(store: &dyn KeyValueStore, default: f32) -> f32 {
    let stored = match store.get(VOLUME_KEY).await {
        Ok(value) => value,
        Err(e) => {
            error!(error = %e, "Failed to load volume");
            None
        }
    };

    stored
        .and_then(|raw| raw.trim().parse::<f32>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(default)
        .clamp(0.0, 1.0)
}
