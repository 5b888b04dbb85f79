//! Building and dispatching one tool call (C9), independent of the
//! parallel arbitration `ToolCallRuntime` layers on top.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use agentloom_core::ContentBlock;
use agentloom_diff::TurnDiffTracker;
use tokio::sync::Mutex;

use crate::error::ToolResult;
use crate::invocation::{ToolInvocation, ToolOutputMetadata};
use crate::payload::ToolCall;
use crate::registry::ToolRegistry;

/// The outcome of one dispatched call: the wire-ready result block plus
/// the bookkeeping telemetry needs, which doesn't otherwise survive the
/// `ContentBlock` shape.
#[derive(Debug, Clone)]
pub struct DispatchedCall {
    /// The `tool_result` block, ready to append to history.
    pub block: ContentBlock,
    /// The tool name that was dispatched.
    pub tool_name: String,
    /// Wall-clock time the call took.
    pub duration: Duration,
    /// Whether the call succeeded.
    pub success: bool,
    /// Structured metadata the handler attached, if any.
    pub metadata: ToolOutputMetadata,
}

/// Parses assistant `tool_use` blocks and dispatches them through a
/// registry, shaping the result back into a `tool_result` block.
pub struct ToolRouter {
    registry: Arc<ToolRegistry>,
    cwd: PathBuf,
}

impl ToolRouter {
    /// Build a router over `registry`, rooting handler execution at
    /// `cwd`.
    pub fn new(registry: Arc<ToolRegistry>, cwd: PathBuf) -> Self {
        Self { registry, cwd }
    }

    /// Parse an assistant `tool_use` block into a [`ToolCall`]. Returns
    /// `None` for any other block kind.
    pub fn build_tool_call(&self, block: &ContentBlock) -> Option<ToolCall> {
        ToolCall::from_block(block)
    }

    /// Dispatch `call` for `turn_id`, using `tracker` for write-capable
    /// handlers, and shape the outcome as a `tool_result` content block.
    ///
    /// Dispatch errors (unknown tool, policy denial, tracker conflict)
    /// are folded into an `is_error=true` tool_result rather than
    /// propagated, since every tool_use must be answered.
    pub async fn dispatch_tool_call(
        &self,
        turn_id: u64,
        call: ToolCall,
        tracker: Arc<Mutex<TurnDiffTracker>>,
    ) -> DispatchedCall {
        let call_id = call.call_id.clone();
        let tool_name = call.tool_name.clone();
        let invocation = ToolInvocation {
            turn_id,
            call_id: call_id.clone(),
            tool_name: call.tool_name,
            payload: call.payload,
            tracker,
            cwd: self.cwd.clone(),
        };

        let started = Instant::now();
        match self.dispatch(invocation).await {
            Ok(output) => DispatchedCall {
                block: ContentBlock::ToolResult {
                    tool_use_id: call_id,
                    content: output.content,
                    is_error: !output.success,
                },
                tool_name,
                duration: started.elapsed(),
                success: output.success,
                metadata: output.metadata,
            },
            Err(err) => DispatchedCall {
                block: ContentBlock::ToolResult {
                    tool_use_id: call_id,
                    content: err.to_string(),
                    is_error: true,
                },
                tool_name,
                duration: started.elapsed(),
                success: false,
                metadata: ToolOutputMetadata::default(),
            },
        }
    }

    async fn dispatch(
        &self,
        invocation: ToolInvocation,
    ) -> ToolResult<crate::invocation::ToolOutput> {
        self.registry.dispatch(invocation).await
    }
}
