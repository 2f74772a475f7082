// src/main.rs

//! archive-chan CLI
//!
//! Archives imageboard threads (state, media, rendered page) incrementally.

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;

use archive_chan::config::Config;
use archive_chan::error::{AppError, Result};
use archive_chan::fetch::Fetcher;
use archive_chan::models::ThreadRef;
use archive_chan::pipeline::{SyncStatus, ThreadOutcome, ThreadReport, run_archiver};
use archive_chan::services::{BoardClient, BoardScope};
use archive_chan::shutdown;
use archive_chan::storage::LocalStore;

/// archive-chan - incremental imageboard thread archiver
#[derive(Parser, Debug)]
#[command(
    name = "archive-chan",
    version,
    about = "Archives imageboard threads and their media"
)]
struct Cli {
    /// Thread URL, bare board code, or path to a .txt file of thread URLs
    target: String,

    /// Path to a TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Folder threads are saved under
    #[arg(long)]
    root: Option<PathBuf>,

    /// Save images and video files locally
    #[arg(short = 'p', long)]
    preserve_media: bool,

    /// Include threads from the board archive as well
    #[arg(short = 'a', long)]
    archived: bool,

    /// Only archive threads from the board archive
    #[arg(long)]
    archived_only: bool,

    /// Download thread state only, even when media preservation is configured
    #[arg(long)]
    text_only: bool,

    /// Skip writing rendered HTML pages
    #[arg(long)]
    skip_render: bool,

    /// Cap on the number of replies rendered per thread
    #[arg(long)]
    posts: Option<usize>,

    /// Retry a failed request this many times
    #[arg(short = 'r', long)]
    retries: Option<u32>,

    /// Maximum concurrent thread pipelines
    #[arg(short = 'c', long)]
    concurrency: Option<usize>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Fold CLI flags into the loaded configuration.
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(root) = &cli.root {
        config.archive.root = root.clone();
    }
    if let Some(retries) = cli.retries {
        // The budget counts total attempts, including the first one.
        config.retry.max_attempts = retries + 1;
    }
    if let Some(concurrency) = cli.concurrency {
        config.archive.concurrency = concurrency;
    }
    if cli.preserve_media {
        config.archive.preserve_media = true;
    }
    if cli.text_only {
        config.archive.preserve_media = false;
    }
    if cli.skip_render {
        config.archive.skip_render = true;
    }
    if let Some(posts) = cli.posts {
        config.archive.post_cap = Some(posts);
    }
}

/// Expand the positional target into thread references.
///
/// Accepts a `.txt` file of thread URLs (malformed lines are skipped with a
/// warning), a single thread URL, or a bare board code.
async fn resolve_targets(cli: &Cli, fetcher: &Fetcher, config: &Config) -> Result<Vec<ThreadRef>> {
    let target = cli.target.trim();

    if target.ends_with(".txt") {
        let content = tokio::fs::read_to_string(target)
            .await
            .map_err(|e| AppError::target(target, e))?;
        let mut threads = Vec::new();
        for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
            match ThreadRef::parse(line) {
                Some(thread) => threads.push(thread),
                None => log::warn!("Skipping unrecognized thread URL: {}", line),
            }
        }
        return Ok(threads);
    }

    if let Some(thread) = ThreadRef::parse(target) {
        return Ok(vec![thread]);
    }

    let board = target.trim_matches('/');
    if !board.is_empty() && board.chars().all(|c| c.is_ascii_alphanumeric()) {
        let scope = if cli.archived_only {
            BoardScope::ArchivedOnly
        } else if cli.archived {
            BoardScope::LiveAndArchived
        } else {
            BoardScope::Live
        };
        return BoardClient::new(fetcher, &config.archive.api_host)
            .list(board, scope)
            .await;
    }

    Err(AppError::target(
        target,
        "not a thread URL, board code, or .txt list file",
    ))
}

fn summarize(reports: &[ThreadReport]) {
    let mut updated = 0;
    let mut unchanged = 0;
    let mut terminal = 0;
    let mut cancelled = 0;
    let mut failed = 0;

    for report in reports {
        match &report.outcome {
            Ok(ThreadOutcome::Archived { sync, .. }) => match sync {
                SyncStatus::Updated => updated += 1,
                SyncStatus::Unchanged => unchanged += 1,
                SyncStatus::Terminal => terminal += 1,
            },
            Ok(ThreadOutcome::Cancelled) => cancelled += 1,
            Err(_) => failed += 1,
        }
    }

    log::info!(
        "Run summary: {} updated, {} unchanged, {} terminal, {} failed, {} cancelled",
        updated,
        unchanged,
        terminal,
        failed,
        cancelled
    );
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let start = Instant::now();

    let mut config = match &cli.config {
        Some(path) => Config::load_or_default(path),
        None => Config::default(),
    };
    apply_overrides(&mut config, &cli);
    config.validate()?;

    let store = LocalStore::new(&config.archive.root);
    let fetcher = Fetcher::new(&config.client, config.retry.clone())?;

    let threads = resolve_targets(&cli, &fetcher, &config).await?;
    if threads.is_empty() {
        log::warn!("Nothing to archive.");
        return Ok(());
    }

    let cancel = shutdown::install_signal_handler();
    let reports = run_archiver(&config, &store, threads, cancel).await?;
    summarize(&reports);

    log::info!("Time elapsed: {:.2?}", start.elapsed());
    Ok(())
}
