//! Scheduler and oracle errors.

use thiserror::Error;

/// An error from the LLM oracle.
#[derive(Debug, Error, Clone)]
pub enum OracleError {
    /// The oracle is rate-limiting; retried with backoff per the
    /// scheduler's retry policy.
    #[error("rate limited")]
    RateLimited,
    /// Any other oracle failure; rolls back the current turn.
    #[error("oracle error: {0}")]
    Other(String),
}

/// Errors the scheduler itself can raise, outside of the per-turn state
/// machine's own stop conditions.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The prompt passed to `run` was empty.
    #[error("prompt must not be empty")]
    EmptyPrompt,
    /// The oracle failed with a non-rate-limit error after the current
    /// turn was rolled back.
    #[error(transparent)]
    Oracle(#[from] OracleError),
}

/// Convenience alias for fallible scheduler operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
