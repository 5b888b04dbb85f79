//! Agentloom Runtime - the turn scheduler (C14), the Oracle seam it
//! drives (C16), and the MCP tool handler (part of C15) that wires the
//! client pool into dispatch.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod error;
pub mod mcp_handler;
pub mod oracle;
pub mod scheduler;

pub use error::{OracleError, RuntimeError, RuntimeResult};
pub use mcp_handler::McpToolHandler;
pub use oracle::{Oracle, OracleRequest, OracleResponse, StopReason as OracleStopReason, Usage};
pub use scheduler::{RunOutcome, SchedulerConfig, StopReason, TurnScheduler};
