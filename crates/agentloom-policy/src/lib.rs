//! Agentloom Policy - the sandbox/approval/timeout gate (C10) applied to
//! shell and write-capable tool handlers. The tool registry itself is
//! policy-free; handlers that mutate state or spawn processes consult
//! an [`ExecutionContext`] before acting.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod approval;
pub mod context;
pub mod error;

pub use approval::{AlwaysAllow, AlwaysDeny, ApprovalPolicy, Approver};
pub use context::{ExecutionContext, SandboxPolicy};
pub use error::{PolicyError, PolicyResult};
