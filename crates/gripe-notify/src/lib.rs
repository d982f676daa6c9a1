pub mod cleanup;
pub mod config;
pub mod triggers;

use thiserror::Error;

/// Why a trigger handler produced no notification (or failed trying).
/// Every variant is terminal: nothing here is retried, callers log and stop.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("no recipient: {0}")]
    MissingRecipient(String),

    #[error("failed to enqueue notification: {0}")]
    Enqueue(anyhow::Error),
}
