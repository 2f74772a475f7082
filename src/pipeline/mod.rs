// src/pipeline/mod.rs

//! Per-thread archival pipeline and its orchestrator.
//!
//! - `sync`: fetch and persist thread state when it changed
//! - `media`: reconcile and verify the thread's media files
//! - `run`: fan the Sync → Media pipeline across a bounded worker pool

pub mod media;
pub mod run;
pub mod sync;

pub use media::{MediaEngine, MediaOutcome};
pub use run::{ThreadOutcome, ThreadReport, run_archiver};
pub use sync::{SyncEngine, SyncOutcome, SyncStatus};
