//! Shared fixtures for library integration tests

use async_trait::async_trait;
use cadence_core::{CoreError, KeyValueStore, MediaSource, MemoryCatalog, Track};
use cadence_storage::MemoryStore;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Semaphore;

pub fn track(id: &str) -> Track {
    Track::new(
        id,
        format!("Song {id}"),
        "Test Artist",
        MediaSource::remote(format!("https://cdn.example/{id}.mp3")),
    )
}

pub fn catalog_of(count: usize) -> MemoryCatalog {
    MemoryCatalog::new((1..=count).map(|i| track(&i.to_string())).collect())
}

/// Store whose writes always fail, counting attempts
#[derive(Default)]
pub struct FailingStore {
    pub writes: AtomicUsize,
}

#[async_trait]
impl KeyValueStore for FailingStore {
    async fn get(&self, _key: &str) -> cadence_core::Result<Option<String>> {
        Err(CoreError::storage("disk unavailable"))
    }

    async fn set(&self, _key: &str, _value: &str) -> cadence_core::Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Err(CoreError::storage("disk unavailable"))
    }
}

/// Store whose writes wait for a permit before landing
pub struct GatedStore {
    pub inner: MemoryStore,
    gate: Semaphore,
}

impl GatedStore {
    pub fn closed() -> Self {
        Self {
            inner: MemoryStore::new(),
            gate: Semaphore::new(0),
        }
    }

    pub fn open(&self) {
        self.gate.add_permits(1);
    }
}

#[async_trait]
impl KeyValueStore for GatedStore {
    async fn get(&self, key: &str) -> cadence_core::Result<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> cadence_core::Result<()> {
        let _permit = self.gate.acquire().await;
        self.inner.set(key, value).await
    }
}

/// Poll a condition until it holds
pub async fn eventually<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..200 {
        if check().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}
