// src/pipeline/run.rs

//! Bounded-concurrency orchestration of the per-thread pipeline.
//!
//! Each worker runs Sync → Media → Render for one thread at a time. Workers
//! share nothing mutable: the filesystem is partitioned per thread, so no
//! locking is needed. Cancellation stops dispatching new work and interrupts
//! in-flight workers at their next await point; finished results are kept.

use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::Result;
use crate::fetch::Fetcher;
use crate::models::ThreadRef;
use crate::pipeline::media::{MediaEngine, MediaOutcome};
use crate::pipeline::sync::{SyncEngine, SyncStatus};
use crate::render;
use crate::storage::ThreadStore;

/// What happened to one thread in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadOutcome {
    /// The pipeline ran through
    Archived {
        sync: SyncStatus,
        media: Option<MediaOutcome>,
    },
    /// The run was cancelled before or during this thread
    Cancelled,
}

/// Per-thread result of a run; failures are reported, never propagated
/// across threads.
#[derive(Debug)]
pub struct ThreadReport {
    pub thread: ThreadRef,
    pub outcome: Result<ThreadOutcome>,
}

/// Run the archival pipeline over `threads` with bounded concurrency.
///
/// The worker pool never exceeds `archive.concurrency` or the number of
/// threads. Ordering of results follows completion, not input.
pub async fn run_archiver(
    config: &Config,
    store: &dyn ThreadStore,
    threads: Vec<ThreadRef>,
    cancel: CancellationToken,
) -> Result<Vec<ThreadReport>> {
    if threads.is_empty() {
        return Ok(Vec::new());
    }

    let fetcher = Fetcher::new(&config.client, config.retry.clone())?;
    let concurrency = config.archive.concurrency.clamp(1, threads.len());
    log::info!(
        "Archiving {} threads with {} workers",
        threads.len(),
        concurrency
    );

    let fetcher = &fetcher;
    let reports: Vec<ThreadReport> = stream::iter(threads)
        .map(|thread| {
            let cancel = cancel.clone();
            async move {
                if cancel.is_cancelled() {
                    return ThreadReport {
                        thread,
                        outcome: Ok(ThreadOutcome::Cancelled),
                    };
                }

                let outcome = tokio::select! {
                    _ = cancel.cancelled() => Ok(ThreadOutcome::Cancelled),
                    res = archive_thread(config, store, fetcher, &thread) => res,
                };

                if let Err(e) = &outcome {
                    log::warn!("{}: failed: {}", thread.label(), e);
                }
                ThreadReport { thread, outcome }
            }
        })
        .buffer_unordered(concurrency)
        .collect()
        .await;

    Ok(reports)
}

/// The full pipeline for a single thread.
async fn archive_thread(
    config: &Config,
    store: &dyn ThreadStore,
    fetcher: &Fetcher,
    thread: &ThreadRef,
) -> Result<ThreadOutcome> {
    let sync_engine = SyncEngine::new(fetcher, store, &config.archive.api_host);
    let outcome = sync_engine.sync(thread).await?;
    let sync = outcome.status();
    let mut snapshot = outcome.into_snapshot();

    let media = if config.archive.preserve_media {
        let media_engine = MediaEngine::new(fetcher, store, &config.archive.media_host);
        Some(media_engine.sync_media(thread, &mut snapshot).await?)
    } else {
        None
    };

    // Rendering is best-effort: it runs after the archival stages and a
    // failure must never corrupt or block the archived state.
    if !config.archive.skip_render {
        let html = render::render_thread(thread, &snapshot, &config.archive);
        if let Err(e) = store.write_page(thread, html.as_bytes()).await {
            log::warn!("{}: failed to write rendered page: {}", thread.label(), e);
        }
    }

    Ok(ThreadOutcome::Archived { sync, media })
}
