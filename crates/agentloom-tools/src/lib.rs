//! Agentloom Tools - typed tool specs, the registry/router/runtime with
//! parallel arbitration (C8/C9), and the Function/Shell/MCP handler
//! protocol (C15).

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod error;
pub mod handlers;
pub mod invocation;
pub mod payload;
pub mod registry;
pub mod router;
pub mod runtime;
pub mod spec;
pub mod truncate;

pub use error::{ToolError, ToolErrorKind, ToolResult};
pub use handlers::{FunctionHandler, ShellHandler, ToolFunction};
pub use invocation::{ToolInvocation, ToolOutput, ToolOutputMetadata};
pub use payload::{ToolCall, ToolPayload};
pub use registry::{Capability, ConfiguredToolSpec, ToolHandler, ToolKind, ToolRegistry};
pub use router::{DispatchedCall, ToolRouter};
pub use runtime::ToolCallRuntime;
pub use spec::ToolSpec;
pub use truncate::truncate_output;
