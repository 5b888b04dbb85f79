//! When to ask a human, and how to ask.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// When a tool invocation requires explicit approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalPolicy {
    /// Never ask.
    Never,
    /// Only when the caller explicitly requests it (front-end specific;
    /// never triggered by the policy gate itself).
    OnRequest,
    /// Ask before any write-capable call.
    OnWrite,
    /// Ask before every call.
    Always,
}

/// The front-end callback consulted when a call requires approval. A
/// timeout or a negative answer denies the tool.
#[async_trait]
pub trait Approver: Send + Sync {
    /// Ask whether `tool_name` may proceed. `is_write` reflects whether
    /// the call is write-capable.
    async fn approve(&self, tool_name: &str, is_write: bool) -> bool;
}

/// An approver that always denies, for headless runs with no attached
/// operator.
pub struct AlwaysDeny;

#[async_trait]
impl Approver for AlwaysDeny {
    async fn approve(&self, _tool_name: &str, _is_write: bool) -> bool {
        false
    }
}

/// An approver that always allows, for tests and trusted automation.
pub struct AlwaysAllow;

#[async_trait]
impl Approver for AlwaysAllow {
    async fn approve(&self, _tool_name: &str, _is_write: bool) -> bool {
        true
    }
}
