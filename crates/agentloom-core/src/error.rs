//! Error types shared by the data model.

use thiserror::Error;

/// Errors raised while constructing or mutating core data model types.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A pin was created with empty text.
    #[error("pin text must not be empty")]
    EmptyPinText,
    /// A content block index was out of range for a message record.
    #[error("block index {0} out of range")]
    BlockIndexOutOfRange(usize),
}

/// Convenience alias for fallible core operations.
pub type CoreResult<T> = Result<T, CoreError>;
