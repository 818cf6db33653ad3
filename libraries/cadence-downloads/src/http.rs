//! HTTP transfer backed by reqwest
//!
//! Streams the response body into the destination file. Starting again
//! after a pause resumes from the partial file with a `Range` request;
//! servers that ignore ranges get the file rewritten from scratch.

use crate::transfer::{ProgressCallback, Transfer, TransferError, TransferHandle, TransferProgress};
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::RANGE;
use reqwest::{Client, StatusCode};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

impl From<reqwest::Error> for TransferError {
    fn from(e: reqwest::Error) -> Self {
        TransferError::Network(e.to_string())
    }
}

/// Transfer factory issuing plain HTTP(S) GETs
#[derive(Clone, Default)]
pub struct HttpTransfer {
    client: Client,
}

impl HttpTransfer {
    /// Create a transfer factory with a default client
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transfer factory sharing an existing client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Transfer for HttpTransfer {
    fn create(
        &self,
        remote: &str,
        dest: &Path,
        on_progress: ProgressCallback,
    ) -> Arc<dyn TransferHandle> {
        Arc::new(HttpDownload {
            client: self.client.clone(),
            url: remote.to_string(),
            dest: dest.to_path_buf(),
            on_progress,
            cancel: Mutex::new(CancellationToken::new()),
        })
    }
}

struct HttpDownload {
    client: Client,
    url: String,
    dest: PathBuf,
    on_progress: ProgressCallback,

    /// Replaced on each start so a paused download can be resumed
    cancel: Mutex<CancellationToken>,
}

impl HttpDownload {
    fn fresh_token(&self) -> CancellationToken {
        let mut slot = self.cancel.lock().unwrap_or_else(|e| e.into_inner());
        if slot.is_cancelled() {
            *slot = CancellationToken::new();
        }
        slot.clone()
    }

    fn report(&self, bytes_written: u64, bytes_expected: Option<u64>) {
        (self.on_progress)(TransferProgress {
            bytes_written,
            bytes_expected,
        });
    }
}

#[async_trait]
impl TransferHandle for HttpDownload {
    async fn start(&self) -> Result<PathBuf, TransferError> {
        let token = self.fresh_token();

        let offset = match tokio::fs::metadata(&self.dest).await {
            Ok(meta) => meta.len(),
            Err(_) => 0,
        };

        let mut request = self.client.get(&self.url);
        if offset > 0 {
            request = request.header(RANGE, format!("bytes={offset}-"));
        }
        debug!(url = %self.url, dest = %self.dest.display(), offset, "Requesting download");

        let response = tokio::select! {
            response = request.send() => response?,
            _ = token.cancelled() => return Err(TransferError::Paused),
        };

        let status = response.status();
        if status == StatusCode::RANGE_NOT_SATISFIABLE && offset > 0 {
            // Partial file already holds the whole body
            self.report(offset, Some(offset));
            return Ok(self.dest.clone());
        }
        if !status.is_success() {
            return Err(TransferError::Http {
                status: status.as_u16(),
            });
        }

        let resuming = offset > 0 && status == StatusCode::PARTIAL_CONTENT;
        let mut written = if resuming { offset } else { 0 };
        let expected = response.content_length().map(|len| len + written);

        if let Some(parent) = self.dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = if resuming {
            OpenOptions::new().append(true).open(&self.dest).await?
        } else {
            OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&self.dest)
                .await?
        };

        self.report(written, expected);

        let mut stream = response.bytes_stream();
        loop {
            tokio::select! {
                chunk = stream.next() => match chunk {
                    Some(chunk) => {
                        let chunk = chunk?;
                        file.write_all(&chunk).await?;
                        written += chunk.len() as u64;
                        self.report(written, expected);
                    }
                    None => break,
                },
                _ = token.cancelled() => {
                    file.flush().await?;
                    debug!(dest = %self.dest.display(), written, "Download paused");
                    return Err(TransferError::Paused);
                }
            }
        }

        file.flush().await?;
        info!(dest = %self.dest.display(), size = written, resumed = resuming, "File downloaded");

        Ok(self.dest.clone())
    }

    async fn pause(&self) -> Result<(), TransferError> {
        self.cancel
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .cancel();
        Ok(())
    }
}
