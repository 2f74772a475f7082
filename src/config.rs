// src/config.rs

//! Application configuration structures.
//!
//! Loaded once at startup (optionally from a TOML file), overridden by CLI
//! flags, then passed down as an immutable value. There is no process-wide
//! mutable configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP client settings
    #[serde(default)]
    pub client: ClientConfig,

    /// Retry budget for upstream requests
    #[serde(default)]
    pub retry: RetryPolicy,

    /// Archival behavior settings
    #[serde(default)]
    pub archive: ArchiveConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.client.user_agent.trim().is_empty() {
            return Err(AppError::config("client.user_agent is empty"));
        }
        if self.client.timeout_secs == 0 {
            return Err(AppError::config("client.timeout_secs must be > 0"));
        }
        if self.retry.max_attempts == 0 {
            return Err(AppError::config("retry.max_attempts must be > 0"));
        }
        if self.archive.concurrency == 0 {
            return Err(AppError::config("archive.concurrency must be > 0"));
        }
        for host in [&self.archive.api_host, &self.archive.media_host] {
            let parsed = url::Url::parse(host)?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(AppError::config(format!(
                    "host {host} must be an http(s) URL"
                )));
            }
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            client: ClientConfig::default(),
            retry: RetryPolicy::default(),
            archive: ArchiveConfig::default(),
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Retry budget and backoff shape for upstream requests.
///
/// The delay before retry `n` (0-indexed) is `base_delay_ms * 2^n`, capped at
/// `max_delay_ms`, so every attempt waits at least as long as the previous one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts per request, including the first one
    #[serde(default = "defaults::max_attempts")]
    pub max_attempts: u32,

    /// Base backoff delay in milliseconds
    #[serde(default = "defaults::base_delay")]
    pub base_delay_ms: u64,

    /// Backoff ceiling in milliseconds
    #[serde(default = "defaults::max_delay")]
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: defaults::max_attempts(),
            base_delay_ms: defaults::base_delay(),
            max_delay_ms: defaults::max_delay(),
        }
    }
}

impl RetryPolicy {
    /// Compute the backoff delay before retry `n` (0-indexed).
    pub fn delay_for_retry(&self, retry: u32) -> std::time::Duration {
        let exp = self
            .base_delay_ms
            .saturating_mul(1u64.checked_shl(retry).unwrap_or(u64::MAX));
        std::time::Duration::from_millis(exp.min(self.max_delay_ms))
    }
}

/// Archival behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Root directory threads are archived under
    #[serde(default = "defaults::root")]
    pub root: PathBuf,

    /// Maximum concurrent thread pipelines
    #[serde(default = "defaults::concurrency")]
    pub concurrency: usize,

    /// Download media files, not just thread JSON
    #[serde(default)]
    pub preserve_media: bool,

    /// Skip writing rendered HTML pages
    #[serde(default)]
    pub skip_render: bool,

    /// Cap on the number of replies rendered (None renders all)
    #[serde(default)]
    pub post_cap: Option<usize>,

    /// Base URL of the upstream JSON API
    #[serde(default = "defaults::api_host")]
    pub api_host: String,

    /// Base URL of the upstream media host
    #[serde(default = "defaults::media_host")]
    pub media_host: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            root: defaults::root(),
            concurrency: defaults::concurrency(),
            preserve_media: false,
            skip_render: false,
            post_cap: None,
            api_host: defaults::api_host(),
            media_host: defaults::media_host(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    pub fn user_agent() -> String {
        format!("archive-chan/{}", env!("CARGO_PKG_VERSION"))
    }

    pub fn timeout() -> u64 {
        16
    }

    pub fn max_attempts() -> u32 {
        4
    }

    pub fn base_delay() -> u64 {
        1_000
    }

    pub fn max_delay() -> u64 {
        30_000
    }

    pub fn root() -> PathBuf {
        PathBuf::from("threads")
    }

    pub fn concurrency() -> usize {
        4
    }

    pub fn api_host() -> String {
        "https://a.4cdn.org".to_string()
    }

    pub fn media_host() -> String {
        "https://i.4cdn.org".to_string()
    }
}
