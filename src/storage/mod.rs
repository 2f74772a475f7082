// src/storage/mod.rs

//! Storage abstraction for archived threads.
//!
//! ## Directory layout
//!
//! ```text
//! {root}/
//! └── {board}/
//!     └── {thread_id}/
//!         ├── thread.json       # snapshot + local completion flags
//!         ├── index.html        # rendered page (optional)
//!         └── media/
//!             └── {tim}{ext}    # one file per attachment
//! ```
//!
//! The layout is partitioned by thread, so concurrent workers never write
//! the same path and no cross-thread locking is needed.

pub mod local;

use std::collections::HashSet;
use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{ThreadRef, ThreadSnapshot};

// Re-export for convenience
pub use local::LocalStore;

/// Persistence backend for thread snapshots and their media.
#[async_trait]
pub trait ThreadStore: Send + Sync {
    /// Load the stored snapshot for a thread, if one exists.
    async fn load(&self, thread: &ThreadRef) -> Result<Option<ThreadSnapshot>>;

    /// Persist a snapshot durably and atomically; no reader ever observes a
    /// partial file.
    async fn save(&self, thread: &ThreadRef, snapshot: &ThreadSnapshot) -> Result<()>;

    /// Names of the media files currently on disk for a thread.
    async fn media_files(&self, thread: &ThreadRef) -> Result<HashSet<String>>;

    /// Write one media file atomically under its deterministic filename.
    async fn write_media(&self, thread: &ThreadRef, filename: &str, bytes: &[u8]) -> Result<()>;

    /// Delete one media file (e.g. after a failed digest check).
    async fn remove_media(&self, thread: &ThreadRef, filename: &str) -> Result<()>;

    /// Filesystem path of a media file, for digest verification.
    fn media_path(&self, thread: &ThreadRef, filename: &str) -> PathBuf;

    /// Write the rendered HTML page for a thread.
    async fn write_page(&self, thread: &ThreadRef, bytes: &[u8]) -> Result<()>;
}
