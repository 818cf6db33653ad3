//! Integration tests for the listening history

mod common;

use cadence_core::{Catalog, PlayRecorder};
use cadence_library::{HistoryTracker, MAX_HISTORY_LENGTH};
use cadence_storage::{keys, MemoryStore};
use common::{catalog_of, eventually, track, FailingStore, GatedStore};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn adding_same_track_twice_keeps_one_entry_at_front() {
    let history = HistoryTracker::new(Arc::new(MemoryStore::new()), Arc::new(catalog_of(3)));

    history.add_song_to_history(&track("1")).await;
    history.add_song_to_history(&track("2")).await;
    history.add_song_to_history(&track("1")).await;
    history.add_song_to_history(&track("1")).await;

    let ids: Vec<_> = history.tracks().into_iter().map(|t| t.id).collect();
    assert_eq!(ids, vec!["1", "2"]);
}

#[tokio::test]
async fn hundred_and_one_plays_keep_exactly_one_hundred() {
    let catalog = Arc::new(catalog_of(101));
    let history = HistoryTracker::new(Arc::new(MemoryStore::new()), catalog.clone());

    for t in catalog.list_all() {
        history.add_song_to_history(t).await;
    }

    let tracks = history.tracks();
    assert_eq!(tracks.len(), MAX_HISTORY_LENGTH);
    assert_eq!(tracks[0].id, "101");
    assert!(tracks.iter().all(|t| t.id != "1"), "oldest play should be evicted");
}

#[tokio::test]
async fn persisted_as_id_array_most_recent_first() {
    let store = Arc::new(MemoryStore::new());
    let history = HistoryTracker::new(store.clone(), Arc::new(catalog_of(3)));

    history.add_song_to_history(&track("1")).await;
    history.add_song_to_history(&track("3")).await;
    history.flush().await;

    let raw = store.peek(keys::HISTORY_KEY).unwrap();
    let ids: Vec<String> = serde_json::from_str(&raw).unwrap();
    assert_eq!(ids, vec!["3", "1"]);
}

#[tokio::test]
async fn load_filters_ids_missing_from_catalog_on_read() {
    let store = Arc::new(MemoryStore::with_entries([(
        keys::HISTORY_KEY,
        r#"["2", "removed", "1", "2"]"#,
    )]));

    let history = HistoryTracker::load(store, Arc::new(catalog_of(2)), MAX_HISTORY_LENGTH).await;

    let ids: Vec<_> = history.tracks().into_iter().map(|t| t.id).collect();
    assert_eq!(ids, vec!["2", "1"]);
    assert_eq!(history.len(), 3);
}

#[tokio::test]
async fn load_respects_smaller_bound() {
    let store = Arc::new(MemoryStore::with_entries([(keys::HISTORY_KEY, r#"["1","2","3"]"#)]));
    let history = HistoryTracker::load(store, Arc::new(catalog_of(3)), 2).await;

    let ids: Vec<_> = history.tracks().into_iter().map(|t| t.id).collect();
    assert_eq!(ids, vec!["1", "2"]);
}

#[tokio::test]
async fn round_trip_through_store() {
    let store = Arc::new(MemoryStore::new());
    let catalog = Arc::new(catalog_of(4));

    let history = HistoryTracker::new(store.clone(), catalog.clone());
    history.add_song_to_history(&track("4")).await;
    history.add_song_to_history(&track("2")).await;
    history.flush().await;

    let reloaded = HistoryTracker::load(store, catalog, MAX_HISTORY_LENGTH).await;
    let ids: Vec<_> = reloaded.tracks().into_iter().map(|t| t.id).collect();
    assert_eq!(ids, vec!["2", "4"]);
}

#[tokio::test]
async fn persistence_failure_never_blocks_the_update() {
    let history = HistoryTracker::load(
        Arc::new(FailingStore::default()),
        Arc::new(catalog_of(2)),
        MAX_HISTORY_LENGTH,
    )
    .await;

    history.add_song_to_history(&track("2")).await;

    assert_eq!(history.tracks()[0].id, "2");
}

#[tokio::test]
async fn records_through_play_recorder_port() {
    let history = Arc::new(HistoryTracker::new(
        Arc::new(MemoryStore::new()),
        Arc::new(catalog_of(2)),
    ));
    let recorder: Arc<dyn PlayRecorder> = history.clone();

    recorder.record_play(&track("1")).await;

    assert_eq!(history.tracks()[0].id, "1");
}

#[tokio::test]
async fn recording_does_not_wait_for_the_store() {
    let store = Arc::new(GatedStore::closed());
    let history = HistoryTracker::new(store.clone(), Arc::new(catalog_of(2)));

    tokio::time::timeout(
        Duration::from_millis(200),
        history.add_song_to_history(&track("1")),
    )
    .await
    .expect("recording a play waited for persistence");

    assert_eq!(history.tracks()[0].id, "1");
    assert_eq!(store.inner.peek(keys::HISTORY_KEY), None);

    store.open();
    let gated = &store;
    eventually(|| async move { gated.inner.peek(keys::HISTORY_KEY).is_some() }).await;
    assert_eq!(store.inner.peek(keys::HISTORY_KEY).as_deref(), Some(r#"["1"]"#));
}

#[tokio::test]
async fn background_writes_settle_on_latest_list() {
    let store = Arc::new(GatedStore::closed());
    let history = HistoryTracker::new(store.clone(), Arc::new(catalog_of(3)));

    for id in ["1", "2", "3", "1"] {
        history.add_song_to_history(&track(id)).await;
    }
    store.open();

    let expected = r#"["1","3","2"]"#;
    let gated = &store;
    eventually(|| async move { gated.inner.peek(keys::HISTORY_KEY).as_deref() == Some(expected) })
        .await;

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(store.inner.peek(keys::HISTORY_KEY).as_deref(), Some(expected));
}

#[tokio::test]
async fn clear_is_persisted_on_flush() {
    let store = Arc::new(MemoryStore::new());
    let history = HistoryTracker::new(store.clone(), Arc::new(catalog_of(2)));

    history.add_song_to_history(&track("1")).await;
    history.clear().await;
    history.flush().await;

    assert_eq!(store.peek(keys::HISTORY_KEY).as_deref(), Some("[]"));
}
