//! Agentloom CLI - the headless runner (C18): a thin binary wiring
//! Settings (C17), the Context Session (C6), the tool registry and
//! runtime (C8/C9/C15), and the Turn Scheduler (C14) together behind
//! the command-line surface.
//!
//! `--prompt-file`/stdin are the only supported "history-file input"
//! surfaces; richer transcript replay and an interactive front-end are
//! out of scope here.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod audit;
mod oracle;
mod output;
mod tools;

use std::io::Read as _;
use std::path::PathBuf;
use std::sync::Arc;

use agentloom_config::Settings;
use agentloom_context::{ContextSession, ContextSettings};
use agentloom_policy::{AlwaysDeny, ExecutionContext};
use agentloom_runtime::{Oracle, SchedulerConfig, TurnScheduler};
use agentloom_telemetry::{LogConfig, Telemetry};
use agentloom_tools::{ToolCallRuntime, ToolRouter};
use anyhow::{bail, Context, Result};
use clap::Parser;

use crate::oracle::{OracleEnv, UnwiredOracle};

/// Run one prompt to completion against the Agentloom agent runtime.
#[derive(Debug, Parser)]
#[command(name = "agentloom", author, version, about, long_about = None)]
struct Cli {
    /// The user prompt, given inline.
    #[arg(long)]
    prompt: Option<String>,
    /// The user prompt, read from a file.
    #[arg(long)]
    prompt_file: Option<PathBuf>,
    /// A TOML settings file; defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override `[runner] max_turns`.
    #[arg(long)]
    max_turns: Option<u64>,
    /// Stop the run on the first recoverable tool failure.
    #[arg(long)]
    exit_on_tool_error: bool,
    /// Keep running through recoverable tool failures.
    #[arg(long, conflicts_with = "exit_on_tool_error")]
    no_exit_on_tool_error: bool,
    /// Skip tool dispatch, recording a synthetic failing result instead.
    #[arg(long)]
    dry_run: bool,
    /// Run tools for real (the default, unless set by `[runner] dry_run`).
    #[arg(long, conflicts_with = "dry_run")]
    no_dry_run: bool,
    /// Restrict which tools are published to the oracle.
    #[arg(long, value_delimiter = ',')]
    allowed_tools: Vec<String>,
    /// Withhold these tool names from the oracle.
    #[arg(long, value_delimiter = ',')]
    blocked_tools: Vec<String>,
    /// Where to write the per-call JSONL audit log.
    #[arg(long)]
    audit_log: Option<PathBuf>,
    /// Where to write the per-turn JSONL changes log.
    #[arg(long)]
    changes_log: Option<PathBuf>,
    /// Print the OTEL-shaped JSON document instead of a table.
    #[arg(long)]
    json: bool,
    /// Emit debug-level logs.
    #[arg(long)]
    verbose: bool,
}

fn apply_cli_overrides(settings: &mut Settings, cli: &Cli) {
    if let Some(max_turns) = cli.max_turns {
        settings.runner.max_turns = max_turns;
    }
    if cli.exit_on_tool_error {
        settings.runner.exit_on_tool_error = true;
    } else if cli.no_exit_on_tool_error {
        settings.runner.exit_on_tool_error = false;
    }
    if cli.dry_run {
        settings.runner.dry_run = true;
    } else if cli.no_dry_run {
        settings.runner.dry_run = false;
    }
    if !cli.allowed_tools.is_empty() {
        settings.runner.allowed_tools = cli.allowed_tools.clone();
    }
    if !cli.blocked_tools.is_empty() {
        settings.runner.blocked_tools = cli.blocked_tools.clone();
    }
    if let Some(path) = &cli.audit_log {
        settings.runner.audit_log = Some(path.clone());
    }
    if let Some(path) = &cli.changes_log {
        settings.runner.changes_log = Some(path.clone());
    }
}

fn read_prompt(cli: &Cli) -> Result<String> {
    if cli.prompt.is_some() && cli.prompt_file.is_some() {
        bail!("--prompt and --prompt-file are mutually exclusive");
    }
    if let Some(prompt) = &cli.prompt {
        return Ok(prompt.clone());
    }
    if let Some(path) = &cli.prompt_file {
        return std::fs::read_to_string(path)
            .with_context(|| format!("reading prompt file {}", path.display()));
    }
    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .context("reading prompt from stdin")?;
    Ok(buffer)
}

fn context_settings(settings: &Settings) -> ContextSettings {
    ContextSettings {
        context_tokens: settings.model.context_tokens,
        guardrail_tokens: settings.model.guardrail_tokens,
        auto_compact: settings.compaction.auto,
        keep_last_turns: settings.compaction.keep_last_turns,
        target_tokens: settings.compaction.target_tokens,
        pin_budget_tokens: settings.compaction.pin_budget_tokens,
        max_tool_tokens: settings.tools.max_tool_tokens,
        max_stdout_bytes: settings.tools.max_stdout_bytes,
        max_lines: settings.tools.max_lines,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    let _ = agentloom_telemetry::setup_logging(&LogConfig::new(level));

    let mut settings = Settings::load(cli.config.as_deref())
        .with_context(|| "loading settings".to_string())?;
    apply_cli_overrides(&mut settings, &cli);

    let prompt = read_prompt(&cli)?;

    let oracle_env = match OracleEnv::from_env() {
        Ok(env) => env,
        Err(err) => {
            eprintln!("configuration error: {err}");
            std::process::exit(2);
        }
    };

    if settings.mcp.enable && !settings.mcp.servers.is_empty() {
        tracing::warn!(
            servers = settings.mcp.servers.len(),
            "mcp servers configured but this binary wires no MCP transport; skipping"
        );
    }

    let cwd = std::env::current_dir().context("reading current directory")?;
    let policy = ExecutionContext {
        cwd: cwd.clone(),
        sandbox: settings.execution.sandbox,
        approval: settings.execution.approval,
        allowed_paths: settings.execution.allowed_paths.clone(),
        blocked_commands: settings.execution.blocked_commands.clone(),
        timeout_seconds: settings.execution.timeout_seconds,
    };

    // This binary has no interactive front-end to ask, so any call the
    // policy flags as requiring approval is denied rather than silently
    // let through; only `ApprovalPolicy::Never`/`OnRequest` (the
    // default) leave shell dispatch ungated.
    let approver: Arc<dyn agentloom_policy::Approver> = Arc::new(AlwaysDeny);
    let registry = Arc::new(tools::build_registry(
        policy,
        approver,
        &settings.runner.allowed_tools,
        &settings.runner.blocked_tools,
    ));
    let router = Arc::new(ToolRouter::new(registry.clone(), cwd));
    let tool_runtime = Arc::new(ToolCallRuntime::new(router, registry.clone()));
    let telemetry = Arc::new(Telemetry::new());

    let scheduler_config = SchedulerConfig {
        model: oracle_env.model.clone().unwrap_or_else(|| settings.model.name.clone()),
        max_tokens: oracle_env.max_tokens.unwrap_or(8_192),
        system_prompt: None,
        max_turns: settings.runner.max_turns,
        exit_on_tool_error: settings.runner.exit_on_tool_error,
        dry_run: settings.runner.dry_run,
    };
    let oracle: Arc<dyn Oracle> = Arc::new(UnwiredOracle::new(oracle_env));
    let scheduler = TurnScheduler::new(scheduler_config, oracle, registry.clone(), tool_runtime, telemetry.clone());

    let mut session = ContextSession::new(context_settings(&settings));

    let outcome = match scheduler.run(&mut session, prompt).await {
        Ok(outcome) => outcome,
        Err(err) => {
            eprintln!("run failed: {err}");
            std::process::exit(1);
        }
    };

    if let Some(path) = &settings.runner.audit_log {
        let records = audit::build_audit_records(&mut session, &telemetry);
        audit::write_jsonl(path, &records)
            .with_context(|| format!("writing audit log to {}", path.display()))?;
    }
    if let Some(path) = &settings.runner.changes_log {
        let records = audit::build_audit_records(&mut session, &telemetry);
        let changes = audit::build_change_records(&records, registry.as_ref());
        audit::write_jsonl(path, &changes)
            .with_context(|| format!("writing changes log to {}", path.display()))?;
    }

    if cli.json {
        output::print_json(&outcome, &telemetry);
    } else {
        output::print_table(&outcome, &telemetry);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli_with(prompt: Option<&str>) -> Cli {
        Cli {
            prompt: prompt.map(str::to_string),
            prompt_file: None,
            config: None,
            max_turns: None,
            exit_on_tool_error: false,
            no_exit_on_tool_error: false,
            dry_run: false,
            no_dry_run: false,
            allowed_tools: vec![],
            blocked_tools: vec![],
            audit_log: None,
            changes_log: None,
            json: false,
            verbose: false,
        }
    }

    #[test]
    fn prompt_and_prompt_file_together_is_rejected() {
        let mut cli = cli_with(Some("hi"));
        cli.prompt_file = Some(PathBuf::from("x.txt"));
        let err = read_prompt(&cli).unwrap_err();
        assert!(err.to_string().contains("mutually exclusive"));
    }

    #[test]
    fn inline_prompt_is_used_verbatim() {
        let cli = cli_with(Some("do the thing"));
        assert_eq!(read_prompt(&cli).unwrap(), "do the thing");
    }

    #[test]
    fn max_turns_override_replaces_the_default() {
        let mut settings = Settings::default();
        let mut cli = cli_with(None);
        cli.max_turns = Some(7);
        apply_cli_overrides(&mut settings, &cli);
        assert_eq!(settings.runner.max_turns, 7);
    }

    #[test]
    fn no_exit_on_tool_error_overrides_a_configured_true() {
        let mut settings = Settings::default();
        settings.runner.exit_on_tool_error = true;
        let mut cli = cli_with(None);
        cli.no_exit_on_tool_error = true;
        apply_cli_overrides(&mut settings, &cli);
        assert!(!settings.runner.exit_on_tool_error);
    }

    #[test]
    fn allowed_tools_flag_replaces_the_configured_list() {
        let mut settings = Settings::default();
        let mut cli = cli_with(None);
        cli.allowed_tools = vec!["read_file".to_string()];
        apply_cli_overrides(&mut settings, &cli);
        assert_eq!(settings.runner.allowed_tools, vec!["read_file".to_string()]);
    }
}
