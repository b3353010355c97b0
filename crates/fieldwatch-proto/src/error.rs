//! Protocol error types.

use thiserror::Error;

/// Errors raised while building or parsing change records.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// Operation code or name that does not map to a known kind.
    #[error("unknown operation: {0:?}")]
    UnknownOperation(String),

    /// Composite key with mismatched column/value counts.
    #[error("composite key has {names} column(s) but {values} value(s)")]
    KeyShapeMismatch {
        /// Number of key columns given.
        names: usize,
        /// Number of key values given.
        values: usize,
    },
}
