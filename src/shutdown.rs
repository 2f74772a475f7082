// src/shutdown.rs

//! Cooperative shutdown.
//!
//! The first Ctrl+C cancels a [`CancellationToken`] so the worker pool stops
//! dispatching requests and drains; a second Ctrl+C force-exits.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use tokio_util::sync::CancellationToken;

/// Install a Ctrl+C handler and return the token it cancels.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let count = Arc::new(AtomicU32::new(0));

    let handler_token = token.clone();
    tokio::spawn(async move {
        loop {
            if tokio::signal::ctrl_c().await.is_err() {
                log::warn!("Failed to listen for Ctrl+C; shutdown signal disabled");
                return;
            }

            let prev = count.fetch_add(1, Ordering::SeqCst);
            if prev == 0 {
                log::info!("Interrupt received, stopping after in-flight downloads...");
                log::info!("Press Ctrl+C again to force exit");
                handler_token.cancel();
            } else {
                log::warn!("Force exit requested");
                std::process::exit(130);
            }
        }
    });

    token
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_starts_uncancelled() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
    }

    #[tokio::test]
    async fn test_install_returns_live_token() {
        let token = install_signal_handler();
        assert!(!token.is_cancelled());
    }
}
