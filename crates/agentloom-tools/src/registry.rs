//! The tool registry (C8): what tools exist, what they declare about
//! themselves, and the handler protocol they implement.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ToolError, ToolResult};
use crate::invocation::{ToolInvocation, ToolOutput};
use crate::spec::ToolSpec;

/// A capability a tool declares it needs. The parallel-arbitration rule
/// reads these sets directly: see [`ConfiguredToolSpec::is_parallel_safe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Reads from the filesystem.
    ReadFs,
    /// Writes to or otherwise mutates the filesystem.
    WriteFs,
    /// Spawns a subprocess.
    ExecShell,
    /// Makes an outbound network call.
    Network,
}

/// Which dispatch path a registered tool uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    /// An in-process function handler.
    Function,
    /// A remote MCP tool, resolved through the MCP client pool.
    Mcp,
    /// A unified shell execution handler.
    UnifiedExec,
}

/// A tool as registered: its public spec plus the declarations that drive
/// dispatch and arbitration.
#[derive(Clone)]
pub struct ConfiguredToolSpec {
    /// The spec advertised to the LLM.
    pub spec: ToolSpec,
    /// Which dispatch path this tool uses.
    pub kind: ToolKind,
    /// The capabilities this tool declares.
    pub capabilities: Vec<Capability>,
}

impl ConfiguredToolSpec {
    /// A tool is parallel-safe iff its capability set intersects
    /// `{read_fs}` and does not intersect `{write_fs, exec_shell,
    /// network}`.
    pub fn is_parallel_safe(&self) -> bool {
        let touches_read = self.capabilities.contains(&Capability::ReadFs);
        let touches_exclusive = self.capabilities.iter().any(|c| {
            matches!(
                c,
                Capability::WriteFs | Capability::ExecShell | Capability::Network
            )
        });
        touches_read && !touches_exclusive
    }
}

/// The protocol every tool handler implements.
///
/// A single handler instance may back more than one registered name (the
/// MCP handler backs every `server/tool` pair, for instance); the
/// registry passes the resolved name and payload through
/// [`ToolInvocation`].
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Execute one call. Implementations should never panic; any failure
    /// the model should see comes back as a non-`success` [`ToolOutput`],
    /// and only setup/environment failures should produce an `Err`.
    async fn call(&self, invocation: ToolInvocation) -> ToolResult<ToolOutput>;
}

/// The set of tools available in a run: specs published to the LLM, plus
/// the handlers that actually execute calls.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    specs: HashMap<String, ConfiguredToolSpec>,
    handlers: HashMap<String, Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under `spec.spec.name`, backed by `handler`.
    pub fn register(&mut self, spec: ConfiguredToolSpec, handler: Arc<dyn ToolHandler>) {
        let name = spec.spec.name.clone();
        self.specs.insert(name.clone(), spec);
        self.handlers.insert(name, handler);
    }

    /// Register `handler` as the catch-all for MCP dispatch, under the
    /// literal key `mcp`. `ToolRouter` looks this up whenever a call's
    /// name contains a `/`.
    pub fn register_mcp_handler(&mut self, handler: Arc<dyn ToolHandler>) {
        self.handlers.insert("mcp".to_string(), handler);
    }

    /// The specs of every registered tool, in registration order isn't
    /// guaranteed; callers that need a stable prompt order should sort.
    pub fn specs(&self) -> impl Iterator<Item = &ConfiguredToolSpec> {
        self.specs.values()
    }

    /// Look up a tool's declared spec.
    pub fn spec(&self, name: &str) -> Option<&ConfiguredToolSpec> {
        self.specs.get(name)
    }

    /// Whether `name` is registered as a function or unified-exec tool.
    pub fn contains(&self, name: &str) -> bool {
        self.specs.contains_key(name)
    }

    /// Dispatch one invocation through the handler registered for its
    /// tool name (or the MCP catch-all, for `server/tool` names).
    pub async fn dispatch(&self, invocation: ToolInvocation) -> ToolResult<ToolOutput> {
        let key = if invocation.tool_name.contains('/') {
            "mcp"
        } else {
            invocation.tool_name.as_str()
        };
        let handler = self
            .handlers
            .get(key)
            .ok_or_else(|| ToolError::UnknownTool(invocation.tool_name.clone()))?;
        handler.call(invocation).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str, caps: Vec<Capability>) -> ConfiguredToolSpec {
        ConfiguredToolSpec {
            spec: ToolSpec::new(name, "test tool", serde_json::json!({}), vec![]),
            kind: ToolKind::Function,
            capabilities: caps,
        }
    }

    #[test]
    fn read_only_tool_is_parallel_safe() {
        let s = spec("read_file", vec![Capability::ReadFs]);
        assert!(s.is_parallel_safe());
    }

    #[test]
    fn read_and_write_tool_is_not_parallel_safe() {
        let s = spec("patch", vec![Capability::ReadFs, Capability::WriteFs]);
        assert!(!s.is_parallel_safe());
    }

    #[test]
    fn shell_tool_is_not_parallel_safe() {
        let s = spec("shell", vec![Capability::ExecShell]);
        assert!(!s.is_parallel_safe());
    }

    #[test]
    fn tool_with_no_read_capability_is_not_parallel_safe() {
        let s = spec("noop", vec![]);
        assert!(!s.is_parallel_safe());
    }

    #[test]
    fn unknown_tool_dispatch_errors() {
        let registry = ToolRegistry::new();
        assert!(!registry.contains("missing"));
    }
}
