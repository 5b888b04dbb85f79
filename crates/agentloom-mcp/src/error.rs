//! MCP pool and client errors.

use thiserror::Error;

/// Errors raised by a client or the pool that owns it.
#[derive(Debug, Error)]
pub enum McpError {
    /// No factory is registered for this server name.
    #[error("no mcp server registered under '{0}'")]
    UnknownServer(String),
    /// The factory failed to produce a client.
    #[error("failed to connect to mcp server '{server}': {reason}")]
    ConnectFailed {
        /// The server name.
        server: String,
        /// A human-readable failure reason.
        reason: String,
    },
    /// No tool by this name is published on this server.
    #[error("mcp server '{server}' has no tool '{tool}'")]
    UnknownTool {
        /// The server name.
        server: String,
        /// The requested tool name.
        tool: String,
    },
    /// The tool call itself failed.
    #[error("mcp tool call '{server}/{tool}' failed: {reason}")]
    CallFailed {
        /// The server name.
        server: String,
        /// The tool name.
        tool: String,
        /// A human-readable failure reason.
        reason: String,
    },
}

/// Convenience alias for fallible MCP operations.
pub type McpResult<T> = Result<T, McpError>;
