//! In-memory [`FileStore`] for tests and dry runs.

use std::collections::HashMap;
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use super::{FileStore, RangeReader};

/// Shared in-memory file map. Clones share the same contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryFileStore {
    files: Arc<Mutex<HashMap<PathBuf, Vec<u8>>>>,
}

impl MemoryFileStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored paths, sorted.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.lock().keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Returns a copy of a file's contents.
    #[must_use]
    pub fn contents(&self, path: &Path) -> Option<Vec<u8>> {
        self.lock().get(path).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, Vec<u8>>> {
        // A panicking writer cannot leave a half-written entry behind.
        self.files
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("{} not found", path.display()),
    )
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn ensure_dir(&self, _dir: &Path) -> io::Result<()> {
        Ok(())
    }

    async fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        self.lock().insert(path.to_path_buf(), contents.to_vec());
        Ok(())
    }

    async fn exists(&self, path: &Path) -> bool {
        self.lock().contains_key(path)
    }

    async fn size(&self, path: &Path) -> io::Result<u64> {
        self.lock()
            .get(path)
            .map(|bytes| bytes.len() as u64)
            .ok_or_else(|| not_found(path))
    }

    async fn open_range(&self, path: &Path, start: u64, len: u64) -> io::Result<RangeReader> {
        let bytes = self.contents(path).ok_or_else(|| not_found(path))?;
        let start = usize::try_from(start).unwrap_or(usize::MAX).min(bytes.len());
        let end = start
            .saturating_add(usize::try_from(len).unwrap_or(usize::MAX))
            .min(bytes.len());
        Ok(Box::pin(Cursor::new(bytes[start..end].to_vec())))
    }

    async fn remove(&self, path: &Path) -> io::Result<bool> {
        Ok(self.lock().remove(path).is_some())
    }

    async fn remove_prefixed(&self, dir: &Path, prefix: &str) -> io::Result<usize> {
        let mut files = self.lock();
        let before = files.len();
        files.retain(|path, _| {
            let in_dir = path.parent() == Some(dir);
            let matches = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(prefix));
            !(in_dir && matches)
        });
        Ok(before - files.len())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn test_clones_share_contents() {
        let store = MemoryFileStore::new();
        let other = store.clone();
        store.write(Path::new("/d/a"), b"abc").await.unwrap();
        assert!(other.exists(Path::new("/d/a")).await);
        assert_eq!(other.size(Path::new("/d/a")).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_open_range_clamps_to_length() {
        let store = MemoryFileStore::new();
        store.write(Path::new("/d/a"), b"0123456789").await.unwrap();
        let mut reader = store.open_range(Path::new("/d/a"), 8, 100).await.unwrap();
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await.unwrap();
        assert_eq!(buf, b"89");
    }

    #[tokio::test]
    async fn test_missing_file_errors() {
        let store = MemoryFileStore::new();
        let err = store.size(Path::new("/nope")).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(store.open_range(Path::new("/nope"), 0, 1).await.is_err());
        assert!(!store.remove(Path::new("/nope")).await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_prefixed_scoped_to_dir() {
        let store = MemoryFileStore::new();
        store.write(Path::new("/d/x-1.part"), b"1").await.unwrap();
        store.write(Path::new("/d/x-1.mp3"), b"1").await.unwrap();
        store.write(Path::new("/other/x-1.mp3"), b"1").await.unwrap();
        assert_eq!(
            store.remove_prefixed(Path::new("/d"), "x-1").await.unwrap(),
            2
        );
        assert_eq!(store.paths(), vec![PathBuf::from("/other/x-1.mp3")]);
    }
}
