//! Errors for the context session crate.

use thiserror::Error;

/// Errors raised by the context session facade.
#[derive(Debug, Error)]
pub enum ContextError {
    /// A `/config set group.field=value` style override named an unknown
    /// settings group.
    #[error("unknown settings group '{0}'")]
    UnknownGroup(String),
    /// A `/config set` override named an unknown field within a known
    /// group.
    #[error("unknown field '{field}' for settings group '{group}'")]
    UnknownField {
        /// The settings group.
        group: String,
        /// The unrecognized field.
        field: String,
    },
    /// A `/config set` override's value could not be parsed for the
    /// target field's type.
    #[error("cannot parse '{value}' for field '{field}'")]
    InvalidOverrideValue {
        /// The field being overridden.
        field: String,
        /// The raw string value that failed to parse.
        value: String,
    },
    /// An underlying history/pin error.
    #[error(transparent)]
    History(#[from] agentloom_history::HistoryError),
}

/// Convenience alias for fallible context session operations.
pub type ContextResult<T> = Result<T, ContextError>;
