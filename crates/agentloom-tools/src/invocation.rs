//! The shape a handler receives, and the shape it returns.

use std::path::PathBuf;
use std::sync::Arc;

use agentloom_diff::TurnDiffTracker;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::ToolErrorKind;
use crate::payload::ToolPayload;

/// Everything a handler needs to execute one tool call.
///
/// Handlers receive only what they need to act: no direct access to the
/// context session. Write-capable handlers take the shared tracker handle
/// to lock paths and record edits; the tracker's own per-path lock (not
/// this struct) is what actually prevents concurrent writers from
/// colliding.
pub struct ToolInvocation {
    /// The turn this call belongs to.
    pub turn_id: u64,
    /// The oracle-assigned call id.
    pub call_id: String,
    /// The tool's registered name.
    pub tool_name: String,
    /// The parsed payload.
    pub payload: ToolPayload,
    /// The shared turn diff tracker, for write-capable handlers.
    pub tracker: Arc<Mutex<TurnDiffTracker>>,
    /// The working directory tool execution is rooted at.
    pub cwd: PathBuf,
}

/// Structured metadata a handler may attach to a failed (or notable)
/// result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolOutputMetadata {
    /// The error taxonomy tag, when the call failed.
    pub error_type: Option<ToolErrorKind>,
    /// Set when a per-call timeout was enforced and exceeded.
    pub timed_out: Option<bool>,
    /// Whether the rendered content was truncated to satisfy tool-output
    /// caps.
    pub truncated: bool,
    /// Paths the call touched (or, in dry-run mode, would have touched).
    pub paths: Vec<String>,
}

/// What every handler returns, success or failure.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// The rendered result content (joined text for multi-part results).
    pub content: String,
    /// Whether the call succeeded.
    pub success: bool,
    /// Optional structured metadata.
    pub metadata: ToolOutputMetadata,
}

impl ToolOutput {
    /// Construct a successful output with no metadata.
    pub fn ok(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            success: true,
            metadata: ToolOutputMetadata::default(),
        }
    }

    /// Construct a failed output tagged with an error kind.
    pub fn failed(content: impl Into<String>, kind: ToolErrorKind) -> Self {
        Self {
            content: content.into(),
            success: false,
            metadata: ToolOutputMetadata {
                error_type: Some(kind),
                ..Default::default()
            },
        }
    }
}
