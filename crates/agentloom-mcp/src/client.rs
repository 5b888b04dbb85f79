//! The client protocol every pooled MCP connection implements, and the
//! factory protocol the pool uses to create one.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::McpResult;

/// One tool a server publishes.
#[derive(Debug, Clone)]
pub struct ToolDefinition {
    /// The tool's name on its server.
    pub name: String,
    /// A human-readable description.
    pub description: String,
    /// The tool's JSON-Schema input shape.
    pub input_schema: Value,
}

/// The result of a successful `call_tool`.
#[derive(Debug, Clone)]
pub struct ToolCallResult {
    /// The rendered result content.
    pub content: String,
    /// Whether the server reported the call as an error.
    pub is_error: bool,
}

/// A live connection to one MCP server.
#[async_trait]
pub trait McpClient: Send + Sync {
    /// List the tools this server currently publishes.
    async fn list_tools(&self) -> McpResult<Vec<ToolDefinition>>;
    /// Invoke one tool by name.
    async fn call_tool(&self, name: &str, arguments: Value) -> McpResult<ToolCallResult>;
    /// A lightweight liveness check; a pooled entry failing this is
    /// evicted and recreated on next use.
    async fn is_healthy(&self) -> bool;
    /// Close the underlying connection. Called once, when the pool
    /// evicts or shuts down this entry.
    async fn aclose(&self);
}

/// Produces a fresh [`McpClient`] for a server name, on pool miss.
#[async_trait]
pub trait McpClientFactory: Send + Sync {
    /// Connect to `server` and return a ready client.
    async fn connect(&self, server: &str) -> McpResult<std::sync::Arc<dyn McpClient>>;
}
