//! Configuration types mirroring the runtime's namespaces.
//!
//! Every section implements `Default` and derives `Serialize`/
//! `Deserialize` with `#[serde(default)]` on every field, so a partial
//! TOML document — or one missing a section entirely — still produces a
//! complete, working `Settings` value.

use std::collections::HashMap;
use std::path::PathBuf;

use agentloom_policy::{ApprovalPolicy, SandboxPolicy};
use serde::{Deserialize, Serialize};

/// Model selection and the context window it implies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// The model identifier sent with every oracle request.
    pub name: String,
    /// The model's raw context window.
    pub context_tokens: u64,
    /// Tokens reserved as headroom below the raw context window.
    pub guardrail_tokens: u64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            name: "claude-sonnet-4-5".to_string(),
            context_tokens: 200_000,
            guardrail_tokens: 20_000,
        }
    }
}

impl ModelSettings {
    /// The effective window tokens the packed prompt must stay under.
    pub fn window_tokens(&self) -> u64 {
        self.context_tokens.saturating_sub(self.guardrail_tokens)
    }
}

/// Compaction thresholds and the pin rendering budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompactionSettings {
    /// Whether compaction runs automatically on every append.
    pub auto: bool,
    /// Number of most recent turns always kept uncompacted.
    pub keep_last_turns: u64,
    /// The compaction target, before the 95%-of-window cap.
    pub target_tokens: u64,
    /// Token budget for rendered pins.
    pub pin_budget_tokens: u64,
}

impl Default for CompactionSettings {
    fn default() -> Self {
        Self {
            auto: true,
            keep_last_turns: 4,
            target_tokens: 110_000,
            pin_budget_tokens: 2_048,
        }
    }
}

/// Caps applied to a single tool_result before it enters history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolLimitSettings {
    /// Maximum estimated tokens a tool_result may carry before truncation.
    pub max_tool_tokens: u64,
    /// Maximum raw byte size a tool_result may carry before truncation.
    pub max_stdout_bytes: usize,
    /// Maximum line count a tool_result may carry before truncation.
    pub max_lines: usize,
}

impl Default for ToolLimitSettings {
    fn default() -> Self {
        Self {
            max_tool_tokens: 4_000,
            max_stdout_bytes: 131_072,
            max_lines: 800,
        }
    }
}

/// One MCP server to launch and pool a client for.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct McpServerDefinition {
    /// The server's name, as referenced by `server/tool` call names.
    pub name: String,
    /// The command used to launch the server.
    pub command: String,
    /// Arguments passed to `command`.
    pub args: Vec<String>,
    /// Environment variables set for the launched process.
    pub env: HashMap<String, String>,
    /// The working directory the server is launched from.
    pub cwd: Option<PathBuf>,
    /// How long a pooled client may sit idle before eviction.
    pub ttl_seconds: Option<u64>,
}

/// MCP pooling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct McpSettings {
    /// Whether MCP tools are published at all.
    pub enable: bool,
    /// The servers to launch and pool clients for.
    pub servers: Vec<McpServerDefinition>,
}

impl Default for McpSettings {
    fn default() -> Self {
        Self {
            enable: true,
            servers: Vec::new(),
        }
    }
}

/// Privacy knobs that don't belong to any one component.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivacySettings {
    /// Whether outbound HTTP from tool handlers is forbidden outright.
    pub no_external_http: bool,
    /// Whether telemetry export redacts personally identifying text.
    pub redact_pii: bool,
}

/// The execution policy gate's configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionPolicySettings {
    /// The sandbox restriction level applied to shell commands.
    pub sandbox: SandboxPolicy,
    /// When approval is required before a tool call proceeds.
    pub approval: ApprovalPolicy,
    /// When non-empty, writes must land under one of these roots.
    pub allowed_paths: Vec<PathBuf>,
    /// Substrings that, if present anywhere in a command, deny it.
    pub blocked_commands: Vec<String>,
    /// The hard cap applied to a handler's own requested timeout.
    pub timeout_seconds: Option<u64>,
}

impl Default for ExecutionPolicySettings {
    fn default() -> Self {
        Self {
            sandbox: SandboxPolicy::Restricted,
            approval: ApprovalPolicy::OnRequest,
            allowed_paths: Vec::new(),
            blocked_commands: Vec::new(),
            timeout_seconds: None,
        }
    }
}

/// Telemetry export configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetrySettings {
    /// Whether the OTEL JSONL export runs at all.
    pub enable_export: bool,
    /// Where the export is written; `None` disables it regardless of
    /// `enable_export`.
    pub export_path: Option<PathBuf>,
    /// The service name attached to every exported resource.
    pub service_name: String,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            enable_export: false,
            export_path: None,
            service_name: "agentloom".to_string(),
        }
    }
}

/// Top-level runner behavior: the scheduler's own knobs plus audit
/// surfaces that don't belong to any single component.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerSettings {
    /// The iteration cap for one `run` call.
    pub max_turns: u64,
    /// Whether a recoverable tool error stops the run.
    pub exit_on_tool_error: bool,
    /// Whether tool dispatch is replaced by a synthetic skipped result.
    pub dry_run: bool,
    /// When non-empty, only these tool names are published to the oracle.
    pub allowed_tools: Vec<String>,
    /// Tool names withheld from the oracle regardless of registration.
    pub blocked_tools: Vec<String>,
    /// Where a per-run JSONL audit log is written, when set.
    pub audit_log: Option<PathBuf>,
    /// Where a per-run JSONL file-edit log is written, when set.
    pub changes_log: Option<PathBuf>,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            max_turns: 25,
            exit_on_tool_error: false,
            dry_run: false,
            allowed_tools: Vec::new(),
            blocked_tools: Vec::new(),
            audit_log: None,
            changes_log: None,
        }
    }
}

/// The complete configuration tree for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// `[model]`
    pub model: ModelSettings,
    /// `[compaction]`
    pub compaction: CompactionSettings,
    /// `[tools.limits]` (flattened under `[tools]` on this struct)
    pub tools: ToolLimitSettings,
    /// `[mcp]`
    pub mcp: McpSettings,
    /// `[privacy]`
    pub privacy: PrivacySettings,
    /// `[execution]`
    pub execution: ExecutionPolicySettings,
    /// `[telemetry]`
    pub telemetry: TelemetrySettings,
    /// `[runner]`
    pub runner: RunnerSettings,
}
