// src/storage/local.rs

//! Local filesystem storage.
//!
//! Snapshots are written pretty-printed with sorted keys so successive
//! versions diff cleanly, and always via temp-file-then-rename so a crash
//! mid-write never leaves a truncated `thread.json` behind.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{ThreadRef, ThreadSnapshot};
use crate::storage::ThreadStore;

/// Local filesystem storage backend rooted at the archive directory.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root_dir: PathBuf,
}

impl LocalStore {
    /// Create a new store rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Directory holding one thread's files.
    pub fn thread_dir(&self, thread: &ThreadRef) -> PathBuf {
        self.root_dir.join(&thread.board).join(&thread.id)
    }

    /// Directory holding one thread's media files.
    pub fn media_dir(&self, thread: &ThreadRef) -> PathBuf {
        self.thread_dir(thread).join("media")
    }

    fn snapshot_path(&self, thread: &ThreadRef) -> PathBuf {
        self.thread_dir(thread).join("thread.json")
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    /// Read bytes, returning None if the file doesn't exist.
    async fn read_bytes(&self, path: &Path) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}

#[async_trait]
impl ThreadStore for LocalStore {
    async fn load(&self, thread: &ThreadRef) -> Result<Option<ThreadSnapshot>> {
        match self.read_bytes(&self.snapshot_path(thread)).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, thread: &ThreadRef, snapshot: &ThreadSnapshot) -> Result<()> {
        // Round-tripping through Value sorts object keys, keeping the stored
        // JSON diffable across runs.
        let value = serde_json::to_value(snapshot)?;
        let bytes = serde_json::to_vec_pretty(&value)?;
        self.write_bytes(&self.snapshot_path(thread), &bytes).await
    }

    async fn media_files(&self, thread: &ThreadRef) -> Result<HashSet<String>> {
        let dir = self.media_dir(thread);
        let mut names = HashSet::new();

        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(names),
            Err(e) => return Err(AppError::Io(e)),
        };

        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                names.insert(entry.file_name().to_string_lossy().into_owned());
            }
        }
        Ok(names)
    }

    async fn write_media(&self, thread: &ThreadRef, filename: &str, bytes: &[u8]) -> Result<()> {
        self.write_bytes(&self.media_dir(thread).join(filename), bytes)
            .await
    }

    async fn remove_media(&self, thread: &ThreadRef, filename: &str) -> Result<()> {
        tokio::fs::remove_file(self.media_dir(thread).join(filename)).await?;
        Ok(())
    }

    fn media_path(&self, thread: &ThreadRef, filename: &str) -> PathBuf {
        self.media_dir(thread).join(filename)
    }

    async fn write_page(&self, thread: &ThreadRef, bytes: &[u8]) -> Result<()> {
        self.write_bytes(&self.thread_dir(thread).join("index.html"), bytes)
            .await
    }
}
