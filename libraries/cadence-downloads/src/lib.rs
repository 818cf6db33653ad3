//! Cadence Downloads
//!
//! Per-track download state machine over a resumable transfer primitive,
//! plus the offline cache the playback engine prefers over the network.
//!
//! ```text
//! not_downloaded ──start──▶ downloading ──ok──▶ downloaded
//!        ▲                      │  │                 │
//!        └──────cancel──────────┘  └─fail─▶ error    │
//!        ▲                                    │      │
//!        │                       start(retry) ┘      │
//!        └──────────────────delete───────────────────┘
//! ```
//!
//! Persisted metadata never claims a file that isn't present: on load,
//! every `downloaded` entry is checked against the filesystem and dropped
//! if its file is gone.

mod entry;
mod error;
pub mod http;
mod manager;
mod transfer;

pub use entry::{DownloadEntry, DownloadStatus};
pub use error::{DownloadError, Result};
pub use http::HttpTransfer;
pub use manager::{cache_file_name, DownloadManager};
pub use transfer::{ProgressCallback, Transfer, TransferError, TransferHandle, TransferProgress};
