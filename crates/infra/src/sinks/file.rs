//! NDJSON file sink

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use courier_core::{ResponseSink, SinkError};
use courier_domain::ResponseRecord;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Appends one JSON object per line to a file.
///
/// Lines are written and flushed under a single lock, so concurrent
/// publishers never interleave partial records. Each write runs on its own
/// task: dropping a `publish` future never leaves half a line in the file.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    file: Arc<Mutex<Option<File>>>,
}

impl FileSink {
    /// Open `path` for appending, creating it and its parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Io`] if the directory or file cannot be created.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|e| {
                SinkError::Io(format!("failed to create directory {}: {e}", parent.display()))
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| SinkError::Io(format!("failed to open {}: {e}", path.display())))?;

        info!(path = %path.display(), "opened file sink");
        Ok(Self { path, file: Arc::new(Mutex::new(Some(file))) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ResponseSink for FileSink {
    async fn publish(&self, record: &ResponseRecord) -> Result<(), SinkError> {
        let mut line = serde_json::to_vec(record).map_err(|e| SinkError::Encode(e.to_string()))?;
        line.push(b'\n');

        let mut guard = Arc::clone(&self.file).lock_owned().await;
        if guard.is_none() {
            return Err(SinkError::Closed);
        }

        tokio::spawn(async move {
            let file = guard.as_mut().ok_or(SinkError::Closed)?;
            file.write_all(&line).await.map_err(|e| SinkError::Io(e.to_string()))?;
            file.flush().await.map_err(|e| SinkError::Io(e.to_string()))
        })
        .await
        .map_err(|e| SinkError::Io(format!("write task failed: {e}")))?
    }

    async fn close(&self) -> Result<(), SinkError> {
        let Some(mut file) = self.file.lock().await.take() else {
            return Ok(());
        };
        file.flush().await.map_err(|e| SinkError::Io(e.to_string()))?;
        file.sync_all().await.map_err(|e| SinkError::Io(e.to_string()))?;
        debug!(path = %self.path.display(), "closed file sink");
        Ok(())
    }
}
