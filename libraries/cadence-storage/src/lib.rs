//! Cadence Storage
//!
//! Key-value persistence backends implementing `cadence_core::KeyValueStore`.
//!
//! - [`SqliteStore`]: a single `key_value` table in a SQLite file, used by the
//!   application at runtime
//! - [`MemoryStore`]: a process-local map, used by tests and ephemeral sessions
//!
//! Stores write opaque strings; each consumer owns the format of its blob and
//! uses one of the fixed key constants in [`keys`].
//!
//! # Example
//!
//! ```rust,no_run
//! use cadence_core::KeyValueStore;
//! use cadence_storage::{keys, SqliteStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = SqliteStore::open("sqlite://cadence.db").await?;
//! store.set(keys::VOLUME_KEY, "0.8").await?;
//! assert_eq!(store.get(keys::VOLUME_KEY).await?.as_deref(), Some("0.8"));
//! # Ok(())
//! # }
//! ```

mod database;
mod error;
pub mod keys;
mod memory;

pub use database::SqliteStore;
pub use error::{Result, StorageError};
pub use memory::MemoryStore;
