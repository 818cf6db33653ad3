//! Cadence Library
//!
//! The user's personal collections, each backed by a `KeyValueStore`:
//! - [`FavoritesStore`]: ordered favorites with O(1) membership
//! - [`HistoryTracker`]: bounded, most-recent-first listening history
//!
//! Both keep in-memory state authoritative after the initial load. Every
//! mutation updates memory first and then persists; a persistence failure is
//! logged and never undoes or blocks the in-memory change.

mod favorites;
mod history;

pub use favorites::FavoritesStore;
pub use history::{HistoryTracker, MAX_HISTORY_LENGTH};
