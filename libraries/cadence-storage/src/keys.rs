//! Fixed storage keys, one per persisted store
//!
//! Blob formats:
//! - volume: stringified float in `[0, 1]`
//! - downloads: JSON object keyed by track id
//! - favorites: JSON array of track records
//! - history: JSON array of track ids, most recent first

/// Playback volume preference
pub const VOLUME_KEY: &str = "player.volume";

/// Download manager entries
pub const DOWNLOADS_KEY: &str = "downloads.entries";

/// Favorited tracks
pub const FAVORITES_KEY: &str = "library.favorites";

/// Listening history ids
pub const HISTORY_KEY: &str = "library.history";
