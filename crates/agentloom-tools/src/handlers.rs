//! Illustrative handler implementations (C15): an in-process function
//! dispatcher and a shell handler gated by the execution policy.
//!
//! These are reference implementations, not a complete tool library.
//! Concrete tools (grep, patch, web search) register a [`ToolFunction`]
//! with a [`FunctionHandler`] the same way these would.

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use agentloom_policy::{Approver, ExecutionContext};
use async_trait::async_trait;
use serde_json::Value;
use tokio::process::Command;

use crate::error::{ToolError, ToolErrorKind, ToolResult};
use crate::invocation::{ToolInvocation, ToolOutput};
use crate::payload::ToolPayload;
use crate::registry::ToolHandler;
use crate::truncate::truncate_output;

const DEFAULT_SHELL_TIMEOUT_SECS: u64 = 120;
const MAX_STDOUT_BYTES: usize = 131_072;
const MAX_LINES: usize = 800;

/// The protocol a concrete function tool implements. Argument
/// validation against the published schema happens before `call` via
/// [`validate_required`]; handlers still validate value shapes
/// themselves.
#[async_trait]
pub trait ToolFunction: Send + Sync {
    /// Execute with the call's parsed arguments.
    async fn call(&self, arguments: HashMap<String, Value>) -> ToolResult<ToolOutput>;
}

/// Dispatches `Function` payloads to a single wrapped [`ToolFunction`].
pub struct FunctionHandler {
    name: String,
    function: std::sync::Arc<dyn ToolFunction>,
}

impl FunctionHandler {
    /// Wrap `function`, registered under `name` for error messages.
    pub fn new(name: impl Into<String>, function: std::sync::Arc<dyn ToolFunction>) -> Self {
        Self {
            name: name.into(),
            function,
        }
    }
}

#[async_trait]
impl ToolHandler for FunctionHandler {
    async fn call(&self, invocation: ToolInvocation) -> ToolResult<ToolOutput> {
        let ToolPayload::Function { arguments } = invocation.payload else {
            return Err(ToolError::PayloadKindMismatch {
                name: self.name.clone(),
            });
        };
        self.function.call(arguments).await
    }
}

/// Require that every name in `required` is present in `arguments`.
pub fn validate_required(
    tool: &str,
    arguments: &HashMap<String, Value>,
    required: &[&str],
) -> ToolResult<()> {
    for name in required {
        if !arguments.contains_key(*name) {
            return Err(ToolError::InvalidArguments {
                tool: tool.to_string(),
                reason: format!("missing required argument '{name}'"),
            });
        }
    }
    Ok(())
}

/// Runs `UnifiedExec` payloads as a subprocess, gated by an
/// [`ExecutionContext`]: blocked-pattern and strict-mode checks happen
/// before the process ever spawns, the declared timeout is capped by
/// policy before use, and a configured approval policy is consulted
/// through an [`Approver`] before the command is allowed to run.
pub struct ShellHandler {
    context: ExecutionContext,
    approver: Arc<dyn Approver>,
}

impl ShellHandler {
    /// Build a handler that checks every command against `context`,
    /// soliciting `approver` whenever the policy requires it.
    pub fn new(context: ExecutionContext, approver: Arc<dyn Approver>) -> Self {
        Self { context, approver }
    }
}

#[async_trait]
impl ToolHandler for ShellHandler {
    async fn call(&self, invocation: ToolInvocation) -> ToolResult<ToolOutput> {
        let ToolPayload::UnifiedExec { command, arguments } = invocation.payload else {
            return Err(ToolError::PayloadKindMismatch {
                name: invocation.tool_name.clone(),
            });
        };

        if let Err(denial) = self.context.can_execute_command(&command) {
            return Ok(ToolOutput::failed(
                format!("command blocked: {denial}"),
                ToolErrorKind::PolicyDenied,
            ));
        }

        if self.context.requires_approval(&invocation.tool_name, true)
            && !self.approver.approve(&invocation.tool_name, true).await
        {
            return Ok(ToolOutput::failed(
                "command denied: approval required but not granted",
                ToolErrorKind::PolicyDenied,
            ));
        }

        let requested_timeout = arguments
            .first()
            .and_then(|s| s.parse::<u64>().ok());
        let timeout_secs = self
            .context
            .capped_timeout(requested_timeout)
            .unwrap_or(DEFAULT_SHELL_TIMEOUT_SECS);

        let cwd = self.context.cwd.clone();
        let spawn = Command::new("bash")
            .arg("-c")
            .arg(&command)
            .current_dir(&cwd)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output();

        match tokio::time::timeout(Duration::from_secs(timeout_secs), spawn).await {
            Ok(Ok(output)) => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                let stderr = String::from_utf8_lossy(&output.stderr);
                let mut text = stdout.into_owned();
                if !stderr.is_empty() {
                    if !text.is_empty() {
                        text.push('\n');
                    }
                    text.push_str("STDERR:\n");
                    text.push_str(&stderr);
                }
                let exit_code = output.status.code().unwrap_or(-1);
                if exit_code != 0 {
                    text.push_str(&format!("\n(exit code: {exit_code})"));
                }
                let (truncated_text, was_truncated) =
                    truncate_output(&text, MAX_STDOUT_BYTES, MAX_LINES);
                let mut out = if exit_code == 0 {
                    ToolOutput::ok(truncated_text)
                } else {
                    ToolOutput::failed(truncated_text, ToolErrorKind::Recoverable)
                };
                out.metadata.timed_out = Some(false);
                out.metadata.truncated = was_truncated;
                Ok(out)
            }
            Ok(Err(io_err)) => Ok(ToolOutput::failed(
                format!("failed to spawn shell: {io_err}"),
                ToolErrorKind::Recoverable,
            )),
            Err(_elapsed) => {
                let mut out = ToolOutput::failed(
                    format!("command timed out after {timeout_secs}s"),
                    ToolErrorKind::Recoverable,
                );
                out.metadata.timed_out = Some(true);
                Ok(out)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn context() -> ExecutionContext {
        ExecutionContext {
            cwd: PathBuf::from("."),
            sandbox: agentloom_policy::SandboxPolicy::None,
            approval: agentloom_policy::ApprovalPolicy::Never,
            allowed_paths: vec![],
            blocked_commands: vec!["rm -rf".to_string()],
            timeout_seconds: None,
        }
    }

    #[tokio::test]
    async fn blocked_command_denied_without_spawning() {
        let handler = ShellHandler::new(context(), Arc::new(agentloom_policy::AlwaysAllow));
        let tracker = std::sync::Arc::new(tokio::sync::Mutex::new(
            agentloom_diff::TurnDiffTracker::new(1),
        ));
        let invocation = ToolInvocation {
            turn_id: 1,
            call_id: "call_1".into(),
            tool_name: "run_terminal_cmd".into(),
            payload: ToolPayload::UnifiedExec {
                command: "rm -rf /".into(),
                arguments: vec![],
            },
            tracker,
            cwd: PathBuf::from("."),
        };
        let output = handler.call(invocation).await.unwrap();
        assert!(!output.success);
        assert_eq!(output.metadata.error_type, Some(ToolErrorKind::PolicyDenied));
        assert!(output.content.contains("blocked"));
    }

    #[tokio::test]
    async fn successful_command_runs() {
        let handler = ShellHandler::new(context(), Arc::new(agentloom_policy::AlwaysAllow));
        let tracker = std::sync::Arc::new(tokio::sync::Mutex::new(
            agentloom_diff::TurnDiffTracker::new(1),
        ));
        let invocation = ToolInvocation {
            turn_id: 1,
            call_id: "call_1".into(),
            tool_name: "run_terminal_cmd".into(),
            payload: ToolPayload::UnifiedExec {
                command: "echo hello".into(),
                arguments: vec![],
            },
            tracker,
            cwd: PathBuf::from("."),
        };
        let output = handler.call(invocation).await.unwrap();
        assert!(output.success);
        assert!(output.content.contains("hello"));
    }

    fn invocation_for(command: &str) -> ToolInvocation {
        ToolInvocation {
            turn_id: 1,
            call_id: "call_1".into(),
            tool_name: "run_terminal_cmd".into(),
            payload: ToolPayload::UnifiedExec {
                command: command.to_string(),
                arguments: vec![],
            },
            tracker: std::sync::Arc::new(tokio::sync::Mutex::new(
                agentloom_diff::TurnDiffTracker::new(1),
            )),
            cwd: PathBuf::from("."),
        }
    }

    #[tokio::test]
    async fn always_policy_denies_without_an_approving_approver() {
        let mut ctx = context();
        ctx.approval = agentloom_policy::ApprovalPolicy::Always;
        let handler = ShellHandler::new(ctx, Arc::new(agentloom_policy::AlwaysDeny));
        let output = handler.call(invocation_for("echo hello")).await.unwrap();
        assert!(!output.success);
        assert_eq!(output.metadata.error_type, Some(ToolErrorKind::PolicyDenied));
    }

    #[tokio::test]
    async fn always_policy_runs_once_approved() {
        let mut ctx = context();
        ctx.approval = agentloom_policy::ApprovalPolicy::Always;
        let handler = ShellHandler::new(ctx, Arc::new(agentloom_policy::AlwaysAllow));
        let output = handler.call(invocation_for("echo hello")).await.unwrap();
        assert!(output.success);
    }

    #[tokio::test]
    async fn never_policy_skips_the_approver_entirely() {
        let handler = ShellHandler::new(context(), Arc::new(agentloom_policy::AlwaysDeny));
        let output = handler.call(invocation_for("echo hello")).await.unwrap();
        assert!(output.success);
    }
}
