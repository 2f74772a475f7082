// src/error.rs

//! Unified error handling for the archiver.

use std::fmt;

use thiserror::Error;

/// Result type alias for archiver operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Upstream responded with a status that is neither success nor retryable
    #[error("Upstream error {status} for {url}")]
    Status { url: String, status: u16 },

    /// Thread was never seen before and the upstream no longer has it
    #[error("Thread {0} does not exist upstream and was never archived")]
    ThreadGone(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Target URL or list file could not be understood
    #[error("Invalid target '{target}': {message}")]
    Target { target: String, message: String },

    /// Media integrity failure that survived the redownload pass
    #[error("Integrity error for {context}: {message}")]
    Integrity { context: String, message: String },
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a target parsing error.
    pub fn target(target: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Target {
            target: target.into(),
            message: message.to_string(),
        }
    }

    /// Create an integrity error with context.
    pub fn integrity(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Integrity {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create an unexpected-status error.
    pub fn status(url: impl Into<String>, status: u16) -> Self {
        Self::Status {
            url: url.into(),
            status,
        }
    }
}
