//! Errors for the history/compaction crate.

use thiserror::Error;

/// Errors raised by the history store, pin manager, and compaction engine.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// A record index was not a tool_result or did not exist.
    #[error("record index {0} is not a tool_result record")]
    NotAToolResult(usize),
    /// A record index was out of range.
    #[error("record index {0} out of range")]
    IndexOutOfRange(usize),
    /// A pin operation failed.
    #[error(transparent)]
    Pin(#[from] agentloom_core::CoreError),
}

/// Convenience alias for fallible history operations.
pub type HistoryResult<T> = Result<T, HistoryError>;
