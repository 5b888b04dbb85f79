//! Agentloom Diff - per-turn tracking of filesystem edits (C11).
//!
//! Created once per user turn. Write-capable tool handlers lock a path
//! before mutating it and record the edit after the mutation succeeds; the
//! tracker can then summarize, diff, report conflicts, and undo the whole
//! turn.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

mod error;
mod tracker;

pub use error::{DiffError, DiffResult};
pub use tracker::{EditAction, FileEdit, TurnDiffTracker};
