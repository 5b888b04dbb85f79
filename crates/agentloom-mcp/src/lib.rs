//! Agentloom MCP - the per-server client pool (C12): factory-created
//! entries, TTL/health-based eviction, and drained shutdown.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod client;
pub mod error;
pub mod pool;

pub use client::{McpClient, McpClientFactory, ToolCallResult, ToolDefinition};
pub use error::{McpError, McpResult};
pub use pool::McpClientPool;
