//! Disk-backed [`FileStore`] using `tokio::fs`.

use std::io::{self, SeekFrom};
use std::path::Path;

use async_trait::async_trait;
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::{debug, instrument};

use super::{FileStore, RangeReader};

/// Non-blocking local filesystem store.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileStore;

impl LocalFileStore {
    /// Creates a local store.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn ensure_dir(&self, dir: &Path) -> io::Result<()> {
        fs::create_dir_all(dir).await
    }

    async fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        fs::write(path, contents).await
    }

    async fn exists(&self, path: &Path) -> bool {
        fs::metadata(path)
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false)
    }

    async fn size(&self, path: &Path) -> io::Result<u64> {
        Ok(fs::metadata(path).await?.len())
    }

    async fn open_range(&self, path: &Path, start: u64, len: u64) -> io::Result<RangeReader> {
        let mut file = File::open(path).await?;
        if start > 0 {
            file.seek(SeekFrom::Start(start)).await?;
        }
        Ok(Box::pin(file.take(len)))
    }

    #[instrument(level = "debug", skip(self, path), fields(path = %path.display()))]
    async fn remove(&self, path: &Path) -> io::Result<bool> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn remove_prefixed(&self, dir: &Path, prefix: &str) -> io::Result<usize> {
        let mut entries = match fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e),
        };

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if !name.starts_with(prefix) {
                continue;
            }
            if self.remove(&entry.path()).await? {
                debug!(file = name, "removed leftover file");
                removed += 1;
            }
        }
        Ok(removed)
    }
}
