//! Persistent store contract

use crate::error::Result;
use async_trait::async_trait;

/// Asynchronous key-value persistence for opaque string blobs
///
/// Every store in the workspace writes under a fixed key constant and
/// treats this backend as a side effect: in-memory state stays
/// authoritative after the initial load.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the blob stored under `key`
    ///
    /// Returns `Ok(None)` when nothing has been stored yet.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous blob
    async fn set(&self, key: &str, value: &str) -> Result<()>;
}
