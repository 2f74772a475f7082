// src/pipeline/media.rs

//! Media reconciliation and integrity checking.
//!
//! Derives the expected media set from a thread snapshot, downloads whatever
//! is missing, verifies every file's digest, and marks the thread
//! media-complete once it is terminal and fully verified. Files that fail
//! verification get exactly one delete-and-redownload pass.

use crate::error::{AppError, Result};
use crate::fetch::{FetchOutcome, Fetcher};
use crate::models::{MediaDescriptor, ThreadRef, ThreadSnapshot};
use crate::storage::ThreadStore;
use crate::verify;

/// Result of one media pass over a thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaOutcome {
    /// Everything verified and the thread is terminal; never re-checked
    Complete,
    /// `n` files were downloaded; the thread is still open
    Downloaded(usize),
    /// Everything currently verifies but the thread is still open, so more
    /// media may arrive later
    Partial,
}

/// Downloads and verifies a thread's media files.
pub struct MediaEngine<'a> {
    fetcher: &'a Fetcher,
    store: &'a dyn ThreadStore,
    media_host: &'a str,
}

impl<'a> MediaEngine<'a> {
    pub fn new(fetcher: &'a Fetcher, store: &'a dyn ThreadStore, media_host: &'a str) -> Self {
        Self {
            fetcher,
            store,
            media_host,
        }
    }

    /// Reconcile the thread's media directory with the snapshot.
    ///
    /// Must only be called after a successful sync of the same thread; the
    /// snapshot is mutated (and persisted) only to set `media_complete`.
    pub async fn sync_media(
        &self,
        thread: &ThreadRef,
        snapshot: &mut ThreadSnapshot,
    ) -> Result<MediaOutcome> {
        if snapshot.local.media_complete {
            log::debug!("{}: media already complete", thread.label());
            return Ok(MediaOutcome::Complete);
        }

        let expected = snapshot.media_descriptors();
        let on_disk = self.store.media_files(thread).await?;
        let mut downloaded = 0;

        if (on_disk.len() as u64) != snapshot.expected_media_total() {
            for media in &expected {
                if !on_disk.contains(&media.filename()) {
                    self.download(thread, media).await?;
                    downloaded += 1;
                }
            }
        }

        // Verify everything we expect, whether just downloaded or from an
        // earlier run.
        let mut failed: Vec<&MediaDescriptor> = expected
            .iter()
            .filter(|m| !self.verify_one(thread, m))
            .collect();

        if !failed.is_empty() {
            log::warn!(
                "{}: {} media files failed verification, redownloading",
                thread.label(),
                failed.len()
            );
            for media in &failed {
                self.remove_if_present(thread, &media.filename()).await?;
                self.download(thread, media).await?;
                downloaded += 1;
            }
            failed.retain(|m| !self.verify_one(thread, m));
        }

        if !failed.is_empty() {
            return Err(AppError::integrity(
                thread.label(),
                format!("{} media files failed digest verification", failed.len()),
            ));
        }

        if snapshot.is_terminal() {
            // The thread can never produce new media, so "done" is safe to
            // record permanently.
            snapshot.local.media_complete = true;
            self.store.save(thread, snapshot).await?;
            log::info!("{}: media complete ({} files)", thread.label(), expected.len());
            return Ok(MediaOutcome::Complete);
        }

        if downloaded > 0 {
            log::info!("{}: downloaded {} media files", thread.label(), downloaded);
            Ok(MediaOutcome::Downloaded(downloaded))
        } else {
            Ok(MediaOutcome::Partial)
        }
    }

    fn verify_one(&self, thread: &ThreadRef, media: &MediaDescriptor) -> bool {
        verify::verify(&self.store.media_path(thread, &media.filename()), &media.md5)
    }

    async fn remove_if_present(&self, thread: &ThreadRef, filename: &str) -> Result<()> {
        if self.store.media_path(thread, filename).is_file() {
            self.store.remove_media(thread, filename).await?;
        }
        Ok(())
    }

    /// Download one media file to its deterministic path.
    ///
    /// An existing file whose size matches the remote `Content-Length` is
    /// left alone; digest verification still decides whether it is kept.
    async fn download(&self, thread: &ThreadRef, media: &MediaDescriptor) -> Result<()> {
        let url = media.url(self.media_host, &thread.board);
        let path = self.store.media_path(thread, &media.filename());

        if let Ok(meta) = std::fs::metadata(&path) {
            if Some(meta.len()) == self.fetcher.head_content_length(&url).await {
                log::debug!("{}: {} already on disk", thread.label(), media.filename());
                return Ok(());
            }
        }

        log::debug!("{}: downloading {}", thread.label(), media.filename());
        match self.fetcher.get(&url).await? {
            FetchOutcome::Body(bytes) => {
                self.store
                    .write_media(thread, &media.filename(), &bytes)
                    .await
            }
            // Media pruned upstream; verification below will surface this as
            // a per-thread failure.
            FetchOutcome::NotFound => Err(AppError::status(&url, 404)),
        }
    }
}
