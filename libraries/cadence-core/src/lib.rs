//! Cadence Core
//!
//! Platform-agnostic core types, contracts, and error handling for Cadence.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Track`, `MediaSource`, `LyricLine`
//! - **Contracts**: `Catalog` (the song index) and `KeyValueStore` (persistence)
//! - **Ports**: the narrow read/write views the playback engine has into other stores
//! - **Error Handling**: Unified `CoreError` and `Result` types
//!
//! Every store and engine in the workspace depends on these contracts only,
//! never on a concrete backend.
//!
//! # Example
//!
//! ```rust
//! use cadence_core::{Catalog, MediaSource, MemoryCatalog, Track};
//!
//! let catalog = MemoryCatalog::new(vec![
//!     Track::new("1", "Blue Hour", "Nova", MediaSource::remote("https://cdn.example/1.mp3")),
//!     Track::new("2", "Tidal", "Nova", MediaSource::Bundled(7)),
//! ]);
//!
//! assert_eq!(catalog.list_all().len(), 2);
//! assert!(catalog.by_id("2").is_some());
//! assert_eq!(catalog.search("blue").len(), 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod catalog;
pub mod error;
pub mod lyrics;
pub mod ports;
pub mod store;
mod time;
pub mod types;

pub use catalog::{Catalog, MemoryCatalog};
pub use error::{CoreError, Result};
pub use lyrics::{current_line, parse_lrc, LyricLine};
pub use ports::{CachedAudio, FavoriteLookup, PlayRecorder};
pub use store::KeyValueStore;
pub use time::format_time;
pub use types::{MediaSource, Track, TrackId};
