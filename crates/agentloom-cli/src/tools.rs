//! Builds the illustrative tool registry the headless runner ships with:
//! a read-only `read_file` function plus the shell handler gated by the
//! execution policy. Concrete tools beyond this small set (patch
//! applier, grep, web search) are out of scope; this mirrors the shape
//! a real tool library would register through.

use std::collections::HashMap;
use std::sync::Arc;

use agentloom_policy::{Approver, ExecutionContext};
use agentloom_tools::{
    truncate_output, Capability, ConfiguredToolSpec, FunctionHandler, ShellHandler, ToolFunction,
    ToolKind, ToolOutput, ToolRegistry, ToolResult, ToolSpec,
};
use async_trait::async_trait;
use serde_json::Value;

const READ_FILE_MAX_BYTES: usize = 131_072;
const READ_FILE_MAX_LINES: usize = 800;

/// Reads a file's contents relative to the process's working directory.
struct ReadFileFunction;

#[async_trait]
impl ToolFunction for ReadFileFunction {
    async fn call(&self, arguments: HashMap<String, Value>) -> ToolResult<ToolOutput> {
        let path = match arguments.get("path").and_then(Value::as_str) {
            Some(path) => path,
            None => {
                return Ok(ToolOutput::failed(
                    "missing required argument 'path'",
                    agentloom_tools::ToolErrorKind::Validation,
                ))
            }
        };

        match std::fs::read_to_string(path) {
            Ok(text) => {
                let (text, truncated) =
                    truncate_output(&text, READ_FILE_MAX_BYTES, READ_FILE_MAX_LINES);
                let mut out = ToolOutput::ok(text);
                out.metadata.truncated = truncated;
                out.metadata.paths = vec![path.to_string()];
                Ok(out)
            }
            Err(err) => Ok(ToolOutput::failed(
                format!("failed to read '{path}': {err}"),
                agentloom_tools::ToolErrorKind::Recoverable,
            )),
        }
    }
}

fn read_file_spec() -> ConfiguredToolSpec {
    ConfiguredToolSpec {
        spec: ToolSpec::new(
            "read_file",
            "Read a UTF-8 text file from the local filesystem.",
            serde_json::json!({
                "path": {"type": "string", "description": "Path to read."},
            }),
            vec!["path"],
        ),
        kind: ToolKind::Function,
        capabilities: vec![Capability::ReadFs],
    }
}

fn run_terminal_cmd_spec() -> ConfiguredToolSpec {
    ConfiguredToolSpec {
        spec: ToolSpec::new(
            "run_terminal_cmd",
            "Run a shell command, subject to the execution policy.",
            serde_json::json!({
                "command": {"type": "string", "description": "The command to run."},
            }),
            vec!["command"],
        ),
        kind: ToolKind::UnifiedExec,
        capabilities: vec![Capability::ExecShell],
    }
}

/// Pre-populate a registry with the illustrative `read_file` and
/// `run_terminal_cmd` tools, the latter gated by `policy` and, whenever
/// the policy requires it, by `approver`. When `allowed` is non-empty
/// only those names are registered; any name in `blocked` is withheld
/// regardless.
pub fn build_registry(
    policy: ExecutionContext,
    approver: Arc<dyn Approver>,
    allowed: &[String],
    blocked: &[String],
) -> ToolRegistry {
    let published = |name: &str| {
        let allowed_ok = allowed.is_empty() || allowed.iter().any(|a| a == name);
        let blocked_out = blocked.iter().any(|b| b == name);
        allowed_ok && !blocked_out
    };

    let mut registry = ToolRegistry::new();
    if published("read_file") {
        registry.register(
            read_file_spec(),
            Arc::new(FunctionHandler::new("read_file", Arc::new(ReadFileFunction))),
        );
    }
    if published("run_terminal_cmd") {
        registry.register(
            run_terminal_cmd_spec(),
            Arc::new(ShellHandler::new(policy, approver)),
        );
    }
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> ExecutionContext {
        ExecutionContext {
            cwd: std::env::temp_dir(),
            sandbox: agentloom_policy::SandboxPolicy::None,
            approval: agentloom_policy::ApprovalPolicy::Never,
            allowed_paths: vec![],
            blocked_commands: vec![],
            timeout_seconds: None,
        }
    }

    fn approver() -> Arc<dyn Approver> {
        Arc::new(agentloom_policy::AlwaysDeny)
    }

    #[test]
    fn no_filters_registers_both_illustrative_tools() {
        let registry = build_registry(policy(), approver(), &[], &[]);
        assert!(registry.contains("read_file"));
        assert!(registry.contains("run_terminal_cmd"));
    }

    #[test]
    fn allowed_tools_narrows_the_registry() {
        let registry = build_registry(policy(), approver(), &["read_file".to_string()], &[]);
        assert!(registry.contains("read_file"));
        assert!(!registry.contains("run_terminal_cmd"));
    }

    #[test]
    fn blocked_tools_wins_even_when_also_allowed() {
        let registry = build_registry(
            policy(),
            approver(),
            &["read_file".to_string(), "run_terminal_cmd".to_string()],
            &["run_terminal_cmd".to_string()],
        );
        assert!(registry.contains("read_file"));
        assert!(!registry.contains("run_terminal_cmd"));
    }

    #[tokio::test]
    async fn read_file_function_reads_an_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.txt");
        std::fs::write(&path, "hello").unwrap();
        let mut args = HashMap::new();
        args.insert("path".to_string(), Value::String(path.to_string_lossy().to_string()));
        let output = ReadFileFunction.call(args).await.unwrap();
        assert!(output.success);
        assert_eq!(output.content, "hello");
    }

    #[tokio::test]
    async fn read_file_function_reports_missing_path_argument() {
        let output = ReadFileFunction.call(HashMap::new()).await.unwrap();
        assert!(!output.success);
    }
}
