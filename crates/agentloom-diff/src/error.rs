//! Errors for the turn diff tracker.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the turn diff tracker.
#[derive(Debug, Error)]
pub enum DiffError {
    /// A path was locked a second time before being unlocked.
    #[error("file {0} is already locked")]
    AlreadyLocked(PathBuf),
    /// An I/O operation failed while applying an edit or undo.
    #[error("io error on {path}: {source}")]
    Io {
        /// The path the operation targeted.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Convenience alias for fallible diff tracker operations.
pub type DiffResult<T> = Result<T, DiffError>;
