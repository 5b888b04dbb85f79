//! Error taxonomy for tool dispatch (§7).

use thiserror::Error;

/// The error taxonomy every tool failure is tagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorKind {
    /// Schema violation or bad argument; surfaced to the model, never
    /// aborts the run.
    Validation,
    /// Handler threw, timed out, or returned failure; surfaced to the
    /// model; aborts only when `exit_on_tool_error=true`.
    Recoverable,
    /// Policy or approval rejected the call; surfaced as an error; counted
    /// separately in telemetry.
    PolicyDenied,
    /// Unrecoverable; the scheduler stops with `fatal_tool_error`.
    Fatal,
}

/// Errors raised while dispatching a tool call through the registry.
#[derive(Debug, Error)]
pub enum ToolError {
    /// No handler is registered under this name.
    #[error("unknown tool '{0}'")]
    UnknownTool(String),
    /// The handler registered for this name does not accept this payload
    /// kind.
    #[error("tool '{name}' does not accept this payload kind")]
    PayloadKindMismatch {
        /// The tool name that was looked up.
        name: String,
    },
    /// The tool's input failed strict schema validation.
    #[error("invalid arguments for '{tool}': {reason}")]
    InvalidArguments {
        /// The tool name.
        tool: String,
        /// A human-readable validation failure.
        reason: String,
    },
    /// The underlying execution policy denied the call.
    #[error(transparent)]
    Policy(#[from] agentloom_policy::PolicyError),
    /// The diff tracker rejected a lock/edit operation.
    #[error(transparent)]
    Diff(#[from] agentloom_diff::DiffError),
}

/// Convenience alias for fallible tool-dispatch operations.
pub type ToolResult<T> = Result<T, ToolError>;
