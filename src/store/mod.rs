//! File system seam for artifacts and scratch files.
//!
//! All filesystem side effects of the pipeline (directory creation, cookie
//! scratch files, artifact existence/size checks, range reads, deletion) go
//! through the [`FileStore`] trait so that tests can substitute the in-memory
//! [`MemoryFileStore`] for the real [`LocalFileStore`].

mod local;
mod memory;

use std::io;
use std::path::Path;
use std::pin::Pin;

use async_trait::async_trait;
use tokio::io::AsyncRead;

pub use local::LocalFileStore;
pub use memory::MemoryFileStore;

/// Boxed reader over a byte span of a stored file.
pub type RangeReader = Pin<Box<dyn AsyncRead + Send>>;

/// Data-access contract for transient files.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Creates a directory (and parents) if missing.
    async fn ensure_dir(&self, dir: &Path) -> io::Result<()>;

    /// Writes a whole file, replacing any existing content.
    async fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    /// Returns whether a regular file exists at `path`.
    async fn exists(&self, path: &Path) -> bool;

    /// Returns the file size in bytes.
    async fn size(&self, path: &Path) -> io::Result<u64>;

    /// Opens a reader yielding at most `len` bytes starting at `start`.
    async fn open_range(&self, path: &Path, start: u64, len: u64) -> io::Result<RangeReader>;

    /// Deletes a file. Returns `Ok(false)` when it was already gone.
    async fn remove(&self, path: &Path) -> io::Result<bool>;

    /// Deletes every file in `dir` whose name starts with `prefix`.
    ///
    /// Returns how many files were removed.
    async fn remove_prefixed(&self, dir: &Path, prefix: &str) -> io::Result<usize>;
}
