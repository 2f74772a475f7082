// src/fetch.rs

//! HTTP fetching with a bounded retry budget.
//!
//! Every network call in the archiver goes through [`Fetcher`]. Connection
//! errors, timeouts, and a fixed set of transient statuses are retried with
//! exponential backoff; 404 is reported as [`FetchOutcome::NotFound`] so
//! callers can tell "resource absent" apart from transient failure.

use std::time::Duration;

use reqwest::StatusCode;

use crate::config::{ClientConfig, RetryPolicy};
use crate::error::{AppError, Result};

/// Statuses worth retrying: rate limits and upstream hiccups.
const RETRYABLE_STATUSES: &[u16] = &[413, 429, 500, 502, 503, 504];

/// Outcome of a fetch once retries are settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// 200 with the response body
    Body(Vec<u8>),
    /// 404, an expected terminal answer rather than a failure
    NotFound,
}

impl FetchOutcome {
    /// The body bytes, or `None` for an absent resource.
    pub fn into_body(self) -> Option<Vec<u8>> {
        match self {
            Self::Body(bytes) => Some(bytes),
            Self::NotFound => None,
        }
    }
}

pub(crate) fn is_retryable_status(status: StatusCode) -> bool {
    RETRYABLE_STATUSES.contains(&status.as_u16())
}

/// HTTP client wrapper applying the configured retry budget to every call.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl Fetcher {
    /// Build a fetcher from the client and retry configuration.
    pub fn new(client: &ClientConfig, retry: RetryPolicy) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&client.user_agent)
            .timeout(Duration::from_secs(client.timeout_secs))
            .build()?;
        Ok(Self { client, retry })
    }

    /// GET a URL, retrying transient failures up to the attempt budget.
    pub async fn get(&self, url: &str) -> Result<FetchOutcome> {
        let mut last_err: Option<AppError> = None;

        for attempt in 0..self.retry.max_attempts {
            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status == StatusCode::NOT_FOUND {
                        return Ok(FetchOutcome::NotFound);
                    }
                    if status.is_success() {
                        return Ok(FetchOutcome::Body(response.bytes().await?.to_vec()));
                    }
                    if !is_retryable_status(status) {
                        return Err(AppError::status(url, status.as_u16()));
                    }
                    last_err = Some(AppError::status(url, status.as_u16()));
                }
                Err(e) => {
                    last_err = Some(e.into());
                }
            }

            if attempt + 1 < self.retry.max_attempts {
                let delay = self.retry.delay_for_retry(attempt);
                log::warn!(
                    "Transient failure fetching {} (attempt {}/{}), retrying in {:?}: {}",
                    url,
                    attempt + 1,
                    self.retry.max_attempts,
                    delay,
                    last_err.as_ref().map(|e| e.to_string()).unwrap_or_default()
                );
                tokio::time::sleep(delay).await;
            }
        }

        Err(last_err.unwrap_or_else(|| AppError::config("retry.max_attempts must be > 0")))
    }

    /// HEAD a URL and return its `Content-Length`, if the server reports one.
    ///
    /// Used to skip re-downloading files whose size already matches. Any
    /// failure degrades to `None`; the caller then downloads normally.
    pub async fn head_content_length(&self, url: &str) -> Option<u64> {
        let response = self.client.head(url).send().await.ok()?;
        if !response.status().is_success() {
            return None;
        }
        response.content_length()
    }

    /// GET a URL and deserialize the JSON body.
    ///
    /// `Ok(None)` means the resource is absent upstream.
    pub async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<Option<T>> {
        match self.get(url).await? {
            FetchOutcome::Body(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            FetchOutcome::NotFound => Ok(None),
        }
    }
}
