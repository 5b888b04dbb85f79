//! The MCP handler (C15): resolves `server/tool` calls through the
//! client pool.

use std::sync::Arc;

use agentloom_mcp::McpClientPool;
use agentloom_tools::{ToolError, ToolErrorKind, ToolHandler, ToolInvocation, ToolOutput, ToolPayload, ToolResult};
use async_trait::async_trait;

/// Forwards `Mcp` payloads to a pooled client, joining the server's
/// result content and propagating its `is_error` flag.
pub struct McpToolHandler {
    pool: Arc<McpClientPool>,
}

impl McpToolHandler {
    /// Build a handler backed by `pool`.
    pub fn new(pool: Arc<McpClientPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ToolHandler for McpToolHandler {
    async fn call(&self, invocation: ToolInvocation) -> ToolResult<ToolOutput> {
        let ToolPayload::Mcp {
            server,
            tool,
            arguments,
        } = invocation.payload
        else {
            return Err(ToolError::PayloadKindMismatch {
                name: invocation.tool_name.clone(),
            });
        };

        let client = match self.pool.get_client(&server).await {
            Ok(client) => client,
            Err(err) => {
                return Ok(ToolOutput::failed(err.to_string(), ToolErrorKind::Recoverable));
            }
        };

        let arguments = serde_json::Value::Object(arguments.into_iter().collect());
        match client.call_tool(&tool, arguments).await {
            Ok(result) if result.is_error => {
                Ok(ToolOutput::failed(result.content, ToolErrorKind::Recoverable))
            }
            Ok(result) => Ok(ToolOutput::ok(result.content)),
            Err(err) => {
                self.pool.mark_unhealthy(&server).await;
                Ok(ToolOutput::failed(err.to_string(), ToolErrorKind::Recoverable))
            }
        }
    }
}
