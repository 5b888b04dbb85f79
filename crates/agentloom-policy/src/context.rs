//! The execution policy gate (C10).

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::approval::ApprovalPolicy;
use crate::error::{PolicyError, PolicyResult};

/// Sandbox restriction level applied to shell commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SandboxPolicy {
    /// No restriction beyond the blocked-command list.
    None,
    /// Blocked-command list plus write-path confinement.
    Restricted,
    /// Only a small set of read-only first tokens are allowed.
    Strict,
}

const STRICT_SAFE_COMMANDS: &[&str] = &["ls", "cat", "echo", "pwd", "grep"];
const SYSTEM_PATHS: &[&str] = &["/etc", "/sys", "/proc", "/dev"];

/// The context a shell or write-capable handler checks itself against
/// before acting. Handlers never read ambient process state (cwd, env)
/// directly; this struct is threaded to them explicitly.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// The working directory tool execution is rooted at.
    pub cwd: PathBuf,
    /// The sandbox restriction level.
    pub sandbox: SandboxPolicy,
    /// When approval is required before proceeding.
    pub approval: ApprovalPolicy,
    /// When non-empty, writes must land under one of these roots.
    pub allowed_paths: Vec<PathBuf>,
    /// Substrings that, if present anywhere in a command, deny it.
    pub blocked_commands: Vec<String>,
    /// The hard cap applied to a handler's own requested timeout.
    pub timeout_seconds: Option<u64>,
}

impl ExecutionContext {
    /// Checked in order: empty command, blocked substring, strict-mode
    /// first-token allowlist.
    pub fn can_execute_command(&self, command: &str) -> PolicyResult<()> {
        let text = command.trim();
        if text.is_empty() {
            return Err(PolicyError::denied("command must not be empty"));
        }

        for blocked in &self.blocked_commands {
            if !blocked.is_empty() && text.contains(blocked.as_str()) {
                return Err(PolicyError::denied(format!(
                    "command contains blocked pattern: {blocked}"
                )));
            }
        }

        if self.sandbox == SandboxPolicy::Strict {
            let first_token = text.split_whitespace().next().unwrap_or("");
            if !STRICT_SAFE_COMMANDS.contains(&first_token) {
                return Err(PolicyError::denied(format!(
                    "command '{first_token}' not allowed in strict mode"
                )));
            }
        }

        Ok(())
    }

    /// Checked in order: must be under an allowed-paths entry (when
    /// set), must not be under a system path.
    pub fn can_write_path(&self, path: &Path) -> PolicyResult<()> {
        let target = lexically_normalize(path);

        if !self.allowed_paths.is_empty() {
            let allowed = self
                .allowed_paths
                .iter()
                .any(|root| target.starts_with(lexically_normalize(root)));
            if !allowed {
                return Err(PolicyError::denied(format!(
                    "path {} not under allowed paths",
                    target.display()
                )));
            }
        }

        for system_path in SYSTEM_PATHS {
            if target.starts_with(system_path) {
                return Err(PolicyError::denied(format!(
                    "cannot write to system path {system_path}"
                )));
            }
        }

        Ok(())
    }

    /// Whether `tool_name` requires an approval round-trip before it
    /// may run. `Always` triggers for every call; `OnWrite` only for
    /// write-capable ones; `OnRequest`/`Never` never trigger here (a
    /// front-end may still solicit approval on its own for `OnRequest`).
    pub fn requires_approval(&self, _tool_name: &str, is_write: bool) -> bool {
        match self.approval {
            ApprovalPolicy::Always => true,
            ApprovalPolicy::OnWrite => is_write,
            ApprovalPolicy::OnRequest | ApprovalPolicy::Never => false,
        }
    }

    /// When a cap is configured and `requested` exceeds it, silently
    /// substitute the cap; otherwise pass `requested` through unchanged.
    pub fn capped_timeout(&self, requested: Option<u64>) -> Option<u64> {
        match (self.timeout_seconds, requested) {
            (Some(cap), Some(req)) if req > cap => Some(cap),
            (Some(cap), None) => Some(cap),
            (_, req) => req,
        }
    }
}

/// Normalize `.`/`..` components lexically, without touching the
/// filesystem (so non-existent targets can still be checked).
fn lexically_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ExecutionContext {
        ExecutionContext {
            cwd: PathBuf::from("/work"),
            sandbox: SandboxPolicy::Restricted,
            approval: ApprovalPolicy::OnWrite,
            allowed_paths: Vec::new(),
            blocked_commands: Vec::new(),
            timeout_seconds: None,
        }
    }

    #[test]
    fn empty_command_denied() {
        assert!(ctx().can_execute_command("   ").is_err());
    }

    #[test]
    fn blocked_substring_denied() {
        let mut c = ctx();
        c.blocked_commands = vec!["echo".to_string()];
        assert!(c.can_execute_command("echo hi").is_err());
    }

    #[test]
    fn strict_mode_rejects_unsafe_first_token() {
        let mut c = ctx();
        c.sandbox = SandboxPolicy::Strict;
        assert!(c.can_execute_command("rm -rf /").is_err());
        assert!(c.can_execute_command("cat file.txt").is_ok());
    }

    #[test]
    fn write_outside_allowed_paths_denied() {
        let mut c = ctx();
        c.allowed_paths = vec![PathBuf::from("/work")];
        assert!(c.can_write_path(Path::new("/work/a.txt")).is_ok());
        assert!(c.can_write_path(Path::new("/tmp/a.txt")).is_err());
    }

    #[test]
    fn write_to_system_path_denied_even_when_allowed() {
        let mut c = ctx();
        c.allowed_paths = vec![PathBuf::from("/etc")];
        assert!(c.can_write_path(Path::new("/etc/passwd")).is_err());
    }

    #[test]
    fn requires_approval_modes() {
        let mut c = ctx();
        c.approval = ApprovalPolicy::Always;
        assert!(c.requires_approval("shell", false));

        c.approval = ApprovalPolicy::OnWrite;
        assert!(c.requires_approval("shell", true));
        assert!(!c.requires_approval("shell", false));

        c.approval = ApprovalPolicy::Never;
        assert!(!c.requires_approval("shell", true));
    }

    #[test]
    fn timeout_cap_substitutes_silently() {
        let mut c = ctx();
        c.timeout_seconds = Some(30);
        assert_eq!(c.capped_timeout(Some(60)), Some(30));
        assert_eq!(c.capped_timeout(Some(10)), Some(10));
        assert_eq!(c.capped_timeout(None), Some(30));
    }
}
