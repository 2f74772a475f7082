// src/services/boards.rs

//! Board-level thread enumeration.
//!
//! Expands a bare board code into thread references using the upstream
//! catalog endpoints: `threads.json` (paginated live threads) and
//! `archive.json` (flat list of archived thread ids).

use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::fetch::Fetcher;
use crate::models::ThreadRef;

/// One page of the live thread catalog.
#[derive(Debug, Deserialize)]
struct CatalogPage {
    #[allow(dead_code)]
    page: u32,
    threads: Vec<CatalogThread>,
}

#[derive(Debug, Deserialize)]
struct CatalogThread {
    no: u64,
}

/// Which parts of a board to enumerate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardScope {
    Live,
    LiveAndArchived,
    ArchivedOnly,
}

/// Lists threads for whole boards via the upstream catalog endpoints.
pub struct BoardClient<'a> {
    fetcher: &'a Fetcher,
    api_host: &'a str,
}

impl<'a> BoardClient<'a> {
    pub fn new(fetcher: &'a Fetcher, api_host: &'a str) -> Self {
        Self { fetcher, api_host }
    }

    fn endpoint(&self, board: &str, file: &str) -> String {
        format!("{}/{}/{}", self.api_host.trim_end_matches('/'), board, file)
    }

    /// Thread references for a board under the given scope.
    pub async fn list(&self, board: &str, scope: BoardScope) -> Result<Vec<ThreadRef>> {
        let mut threads = Vec::new();
        if scope != BoardScope::ArchivedOnly {
            threads.extend(self.live_threads(board).await?);
        }
        if scope != BoardScope::Live {
            threads.extend(self.archived_threads(board).await?);
        }
        log::info!("Board /{}/: {} threads to archive", board, threads.len());
        Ok(threads)
    }

    /// Live threads from the paginated catalog.
    pub async fn live_threads(&self, board: &str) -> Result<Vec<ThreadRef>> {
        let url = self.endpoint(board, "threads.json");
        let pages: Vec<CatalogPage> = self
            .fetcher
            .get_json(&url)
            .await?
            .ok_or_else(|| AppError::target(board, "board not found upstream"))?;

        Ok(pages
            .into_iter()
            .flat_map(|page| page.threads)
            .map(|t| ThreadRef::new(board, t.no))
            .collect())
    }

    /// Archived thread ids; boards without an archive yield an empty list.
    pub async fn archived_threads(&self, board: &str) -> Result<Vec<ThreadRef>> {
        let url = self.endpoint(board, "archive.json");
        let ids: Option<Vec<u64>> = self.fetcher.get_json(&url).await?;
        Ok(ids
            .unwrap_or_default()
            .into_iter()
            .map(|id| ThreadRef::new(board, id))
            .collect())
    }
}
