//! Error types shared across the tracker workspace.
//!
//! `TrackerError` covers provider, validation and plumbing failures; the feed,
//! the pipeline and `main` all propagate it with `?`.
use std::io;
use std::sync::PoisonError;

use thiserror::Error;

/// Unified error type shared by the feed, the pipeline and the binary.
#[derive(Error, Debug)]
pub enum TrackerError {
    /// I/O error originating from the standard library (stdin, terminal, log file).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A value could not be formatted, recorded or joined; carries a description.
    #[error("Format error: {0}")]
    Format(String),

    /// Provider payload or renderer output could not be (de)serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A market data provider call failed; `operation` names the call.
    #[error("Provider error during {operation}: {message}")]
    Provider {
        /// Provider operation that failed (`quote`, `option_chain`, `history`).
        operation: &'static str,
        /// Provider-specific description of the failure.
        message: String,
    },

    /// Operator input could not be turned into a ticker symbol.
    #[error("Invalid ticker symbol: {0:?}")]
    InvalidTicker(String),

    /// A configuration value is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The receiving side of a command channel is gone.
    #[error("Channel send failed: {0}")]
    ChannelSend(String),

    /// The handoff queue lock was poisoned by a panicking thread.
    #[error("Mutex Lock Poisoned: {0}")]
    MutexLock(String),

    /// A price was recorded with a timestamp that is not after the latest entry.
    #[error("Out of order price record: {0}")]
    OutOfOrder(String),
}

impl TrackerError {
    /// Shorthand for a provider failure.
    pub fn provider(operation: &'static str, message: impl Into<String>) -> Self {
        TrackerError::Provider {
            operation,
            message: message.into(),
        }
    }
}

impl<T> From<PoisonError<T>> for TrackerError {
    fn from(err: PoisonError<T>) -> Self {
        TrackerError::MutexLock(err.to_string())
    }
}
