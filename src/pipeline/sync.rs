// src/pipeline/sync.rs

//! Thread state synchronization.
//!
//! Decides whether a thread's remote state changed, fetches it, merges the
//! local completion flags, and persists the result. Terminal threads
//! (archived or deleted upstream) are a hard stop: no network call is ever
//! made for them again.

use crate::error::{AppError, Result};
use crate::fetch::{FetchOutcome, Fetcher};
use crate::models::{ThreadRef, ThreadSnapshot};
use crate::storage::ThreadStore;

/// Collapsed sync result for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    Updated,
    Unchanged,
    Terminal,
}

/// Result of one sync pass, carrying the snapshot the media stage works on.
#[derive(Debug, Clone)]
pub enum SyncOutcome {
    /// Remote state changed (or was seen for the first time) and was persisted
    Updated(ThreadSnapshot),
    /// Remote state matches the stored snapshot; nothing was written
    Unchanged(ThreadSnapshot),
    /// The thread can never change again
    Terminal(ThreadSnapshot),
}

impl SyncOutcome {
    pub fn status(&self) -> SyncStatus {
        match self {
            Self::Updated(_) => SyncStatus::Updated,
            Self::Unchanged(_) => SyncStatus::Unchanged,
            Self::Terminal(_) => SyncStatus::Terminal,
        }
    }

    pub fn snapshot(&self) -> &ThreadSnapshot {
        match self {
            Self::Updated(s) | Self::Unchanged(s) | Self::Terminal(s) => s,
        }
    }

    pub fn into_snapshot(self) -> ThreadSnapshot {
        match self {
            Self::Updated(s) | Self::Unchanged(s) | Self::Terminal(s) => s,
        }
    }
}

/// Synchronizes one thread's stored snapshot with the upstream API.
pub struct SyncEngine<'a> {
    fetcher: &'a Fetcher,
    store: &'a dyn ThreadStore,
    api_host: &'a str,
}

impl<'a> SyncEngine<'a> {
    pub fn new(fetcher: &'a Fetcher, store: &'a dyn ThreadStore, api_host: &'a str) -> Self {
        Self {
            fetcher,
            store,
            api_host,
        }
    }

    /// Sync one thread.
    ///
    /// Reply-count equality on the OP is the sole change signal: a content
    /// edit without a new reply is not detected. This matches the upstream
    /// API's behavior of bumping `replies` for every new post and keeps
    /// re-fetch volume minimal.
    pub async fn sync(&self, thread: &ThreadRef) -> Result<SyncOutcome> {
        let previous = self.store.load(thread).await?;

        if let Some(prev) = previous {
            if prev.is_terminal() {
                log::debug!("{}: terminal, skipping fetch", thread.label());
                return Ok(SyncOutcome::Terminal(prev));
            }
            return self.fetch_and_merge(thread, Some(prev)).await;
        }

        self.fetch_and_merge(thread, None).await
    }

    async fn fetch_and_merge(
        &self,
        thread: &ThreadRef,
        previous: Option<ThreadSnapshot>,
    ) -> Result<SyncOutcome> {
        let url = thread.api_url(self.api_host);
        let current: Option<ThreadSnapshot> = match self.fetcher.get(&url).await? {
            FetchOutcome::Body(bytes) => Some(serde_json::from_slice(&bytes)?),
            FetchOutcome::NotFound => None,
        };

        match (current, previous) {
            // Never seen and upstream doesn't have it: a stale or bogus reference.
            (None, None) => Err(AppError::ThreadGone(thread.label())),

            // Pruned upstream after we archived it; record that permanently.
            (None, Some(mut prev)) => {
                log::info!("{}: gone upstream, marking 404", thread.label());
                prev.local.not_found = true;
                self.store.save(thread, &prev).await?;
                Ok(SyncOutcome::Terminal(prev))
            }

            (Some(current), Some(prev)) if current.reply_count() == prev.reply_count() => {
                log::debug!("{}: no new replies", thread.label());
                Ok(SyncOutcome::Unchanged(prev))
            }

            (Some(mut current), previous) => {
                // New posts replace the old sequence; locally-set flags carry
                // over, and the archived flag mirrors the fresh payload.
                if let Some(prev) = previous {
                    current.local = prev.local;
                }
                current.local.archived = current.archived_upstream();
                self.store.save(thread, &current).await?;
                log::info!(
                    "{}: updated ({} posts)",
                    thread.label(),
                    current.posts.len()
                );
                Ok(SyncOutcome::Updated(current))
            }
        }
    }
}
