//! Core error types.

use thiserror::Error;

/// Errors raised by the routing engine.
#[derive(Debug, Error)]
pub enum Error {
    /// Protocol-level error from record construction.
    #[error("protocol error: {0}")]
    Proto(#[from] fieldwatch_proto::Error),

    /// A watcher callback failed.
    #[error("watcher callback failed: {0}")]
    Callback(String),

    /// A watcher was built without a callback.
    #[error("watcher has no callback")]
    MissingCallback,
}

impl Error {
    /// Create a callback failure error.
    pub fn callback(message: impl Into<String>) -> Self {
        Error::Callback(message.into())
    }
}
