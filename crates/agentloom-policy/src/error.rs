//! Policy denial errors.

use thiserror::Error;

/// A policy check failed, with the human-readable reason surfaced to
/// the model.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct PolicyError(pub String);

impl PolicyError {
    /// Construct a denial carrying `reason`.
    pub fn denied(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Convenience alias for fallible policy checks.
pub type PolicyResult<T> = Result<T, PolicyError>;
