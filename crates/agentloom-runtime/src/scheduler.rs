//! Turn Scheduler (C14): the prompt -> LLM -> tool calls -> results loop.
//!
//! One [`TurnScheduler::run`] call drives a single user turn to
//! completion (which may itself span several LLM round-trips, each one
//! an "iteration" against `max_turns`).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use agentloom_context::{ContextSession, PromptPacker};
use agentloom_core::ContentBlock;
use agentloom_diff::TurnDiffTracker;
use agentloom_telemetry::{Telemetry, ToolExecutionEvent};
use agentloom_tools::{
    DispatchedCall, ToolCall, ToolCallRuntime, ToolErrorKind, ToolPayload, ToolRegistry,
};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::warn;

use crate::error::{OracleError, RuntimeError, RuntimeResult};
use crate::oracle::{Oracle, OracleRequest};

const RETRY_INITIAL_DELAY: Duration = Duration::from_secs(2);
const RETRY_MAX_DELAY: Duration = Duration::from_secs(60);
const RETRY_MAX_ATTEMPTS: u32 = 5;

/// What the scheduler needs beyond the session, registry and oracle
/// themselves.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// The model identifier sent with every request.
    pub model: String,
    /// The maximum tokens the oracle may generate per response.
    pub max_tokens: u32,
    /// An optional system prompt, sent alongside the packed messages.
    pub system_prompt: Option<String>,
    /// The iteration cap for one `run` call. `0` returns immediately.
    pub max_turns: u64,
    /// Whether a `Recoverable` or `Validation` tool error stops the run.
    pub exit_on_tool_error: bool,
    /// When set, tool dispatch is replaced by a synthetic failing result.
    pub dry_run: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-5".to_string(),
            max_tokens: 8_192,
            system_prompt: None,
            max_turns: 25,
            exit_on_tool_error: false,
            dry_run: false,
        }
    }
}

/// Why a `run` call stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The assistant produced a turn with no tool calls.
    Completed,
    /// The iteration cap was reached before the assistant stopped
    /// requesting tools.
    MaxTurns,
    /// A tool failed and `exit_on_tool_error` is set.
    ToolError,
    /// A handler raised a fatal error; always stops the run.
    FatalToolError,
}

/// The result of one `run` call.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Why the run stopped.
    pub stop_reason: StopReason,
    /// The number of LLM round-trips the run actually used.
    pub turns_used: u64,
}

/// Drives the Ready -> Packing -> Calling LLM -> Applying assistant ->
/// Dispatching tool calls -> Appending tool_results loop for one session.
pub struct TurnScheduler {
    config: SchedulerConfig,
    oracle: Arc<dyn Oracle>,
    registry: Arc<ToolRegistry>,
    tool_runtime: Arc<ToolCallRuntime>,
    telemetry: Arc<Telemetry>,
}

impl TurnScheduler {
    /// Build a scheduler over the given oracle, tool registry/runtime and
    /// telemetry sink.
    pub fn new(
        config: SchedulerConfig,
        oracle: Arc<dyn Oracle>,
        registry: Arc<ToolRegistry>,
        tool_runtime: Arc<ToolCallRuntime>,
        telemetry: Arc<Telemetry>,
    ) -> Self {
        Self {
            config,
            oracle,
            registry,
            tool_runtime,
            telemetry,
        }
    }

    /// Run one user turn to completion against `session`.
    pub async fn run(
        &self,
        session: &mut ContextSession,
        prompt: impl Into<String>,
    ) -> RuntimeResult<RunOutcome> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(RuntimeError::EmptyPrompt);
        }

        if self.config.max_turns == 0 {
            return Ok(RunOutcome {
                stop_reason: StopReason::Completed,
                turns_used: 0,
            });
        }

        session.add_user_message(prompt);

        let mut turns_used = 0u64;
        loop {
            turns_used += 1;

            let packed = PromptPacker::new(session).pack();
            let mut tools: Vec<_> = self.registry.specs().map(|c| c.spec.clone()).collect();
            tools.sort_by(|a, b| a.name.cmp(&b.name));

            let request = OracleRequest {
                model: self.config.model.clone(),
                max_tokens: self.config.max_tokens,
                messages: packed.messages,
                system: self.config.system_prompt.clone(),
                tools,
            };

            let response = match self.call_with_retry(request).await {
                Ok(response) => response,
                Err(err) => {
                    session.rollback_last_turn();
                    return Err(err.into());
                }
            };

            session.add_assistant_message(response.content.clone());
            let turn_id = session.status().turn;

            let calls: Vec<ToolCall> = response
                .content
                .iter()
                .filter_map(ToolCall::from_block)
                .collect();

            if calls.is_empty() {
                return Ok(RunOutcome {
                    stop_reason: StopReason::Completed,
                    turns_used,
                });
            }

            let input_sizes: HashMap<String, usize> = calls
                .iter()
                .map(|call| (call.call_id.clone(), payload_input_size(&call.payload)))
                .collect();

            let dispatched = if self.config.dry_run {
                calls.into_iter().map(dry_run_result).collect()
            } else {
                let tracker = Arc::new(Mutex::new(TurnDiffTracker::new(turn_id)));
                self.tool_runtime
                    .dispatch_turn(turn_id, calls, tracker)
                    .await
            };

            let mut fatal = false;
            let mut any_error = false;
            let mut blocks = Vec::with_capacity(dispatched.len());
            for call in &dispatched {
                any_error |= !call.success;
                fatal |= matches!(call.metadata.error_type, Some(ToolErrorKind::Fatal));
                self.telemetry
                    .record_tool_event(tool_event(turn_id, call, &input_sizes));
            }
            for call in dispatched {
                blocks.push(call.block);
            }
            session.add_tool_results(blocks);

            if fatal {
                return Ok(RunOutcome {
                    stop_reason: StopReason::FatalToolError,
                    turns_used,
                });
            }
            if any_error && self.config.exit_on_tool_error {
                return Ok(RunOutcome {
                    stop_reason: StopReason::ToolError,
                    turns_used,
                });
            }

            if turns_used >= self.config.max_turns {
                return Ok(RunOutcome {
                    stop_reason: StopReason::MaxTurns,
                    turns_used,
                });
            }
        }
    }

    async fn call_with_retry(
        &self,
        request: OracleRequest,
    ) -> Result<crate::oracle::OracleResponse, OracleError> {
        let mut delay = RETRY_INITIAL_DELAY;
        let mut attempt = 0u32;
        loop {
            match self.oracle.complete(request.clone()).await {
                Ok(response) => return Ok(response),
                Err(OracleError::RateLimited) if attempt < RETRY_MAX_ATTEMPTS => {
                    attempt += 1;
                    warn!(attempt, delay_secs = delay.as_secs(), "oracle rate limited, retrying");
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(RETRY_MAX_DELAY);
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Approximate serialized size of a call's input, for telemetry.
fn payload_input_size(payload: &ToolPayload) -> usize {
    match payload {
        ToolPayload::Function { arguments } => serde_json::to_string(arguments).unwrap_or_default().len(),
        ToolPayload::Mcp { arguments, .. } => serde_json::to_string(arguments).unwrap_or_default().len(),
        ToolPayload::UnifiedExec { command, arguments } => command.len() + arguments.iter().map(String::len).sum::<usize>(),
        ToolPayload::Custom { payload, .. } => serde_json::to_string(payload).unwrap_or_default().len(),
    }
}

/// Best-effort extraction of argument values that look like filesystem
/// paths, for dry-run auditing.
fn attempted_paths(payload: &ToolPayload) -> Vec<String> {
    fn scan(arguments: &HashMap<String, Value>) -> Vec<String> {
        arguments
            .iter()
            .filter(|(key, _)| {
                let key = key.to_lowercase();
                key.contains("path") || key.contains("file")
            })
            .filter_map(|(_, value)| value.as_str().map(str::to_string))
            .collect()
    }

    match payload {
        ToolPayload::Function { arguments } | ToolPayload::Mcp { arguments, .. } => scan(arguments),
        ToolPayload::Custom { payload, .. } => payload
            .as_object()
            .map(|object| scan(&object.iter().map(|(k, v)| (k.clone(), v.clone())).collect()))
            .unwrap_or_default(),
        ToolPayload::UnifiedExec { .. } => Vec::new(),
    }
}

fn dry_run_result(call: ToolCall) -> DispatchedCall {
    let paths = attempted_paths(&call.payload);
    DispatchedCall {
        block: ContentBlock::ToolResult {
            tool_use_id: call.call_id,
            content: "dry-run: execution skipped".to_string(),
            is_error: true,
        },
        tool_name: call.tool_name,
        duration: Duration::ZERO,
        success: false,
        metadata: agentloom_tools::ToolOutputMetadata {
            error_type: None,
            timed_out: None,
            truncated: false,
            paths,
        },
    }
}

fn tool_event(
    turn_id: u64,
    call: &DispatchedCall,
    input_sizes: &HashMap<String, usize>,
) -> ToolExecutionEvent {
    let (call_id, output_size) = match &call.block {
        ContentBlock::ToolResult { tool_use_id, content, .. } => (tool_use_id.clone(), content.len()),
        _ => (String::new(), 0),
    };
    let error = call.metadata.error_type.and_then(|kind| {
        serde_json::to_value(kind)
            .ok()
            .and_then(|value| value.as_str().map(str::to_string))
    });

    ToolExecutionEvent {
        turn: turn_id,
        tool_name: call.tool_name.clone(),
        call_id: call_id.clone(),
        duration: call.duration,
        success: call.success,
        input_size: input_sizes.get(&call_id).copied().unwrap_or(0),
        output_size,
        error,
        truncated: call.metadata.truncated,
        paths: call.metadata.paths.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Arc;

    use agentloom_context::ContextSettings;
    use agentloom_tools::{
        Capability, ConfiguredToolSpec, FunctionHandler, ToolFunction, ToolKind, ToolOutput,
        ToolRegistry, ToolRouter, ToolSpec,
    };
    use async_trait::async_trait;

    use crate::oracle::{OracleResponse, StopReason as OracleStop, Usage};

    struct FakeOracle {
        responses: tokio::sync::Mutex<Vec<OracleResponse>>,
    }

    impl FakeOracle {
        fn scripted(responses: Vec<OracleResponse>) -> Self {
            Self {
                responses: tokio::sync::Mutex::new(responses.into_iter().rev().collect()),
            }
        }
    }

    #[async_trait]
    impl Oracle for FakeOracle {
        async fn complete(&self, _request: OracleRequest) -> Result<OracleResponse, OracleError> {
            self.responses
                .lock()
                .await
                .pop()
                .ok_or_else(|| OracleError::Other("fake oracle exhausted".to_string()))
        }
    }

    fn text_response(text: &str) -> OracleResponse {
        OracleResponse {
            content: vec![ContentBlock::Text { text: text.to_string() }],
            stop_reason: OracleStop::EndTurn,
            usage: Some(Usage { input_tokens: 10, output_tokens: 5 }),
        }
    }

    fn tool_use_response(id: &str, name: &str) -> OracleResponse {
        OracleResponse {
            content: vec![ContentBlock::ToolUse {
                id: id.to_string(),
                name: name.to_string(),
                input: serde_json::json!({}),
            }],
            stop_reason: OracleStop::ToolUse,
            usage: None,
        }
    }

    struct EchoFunction;

    #[async_trait]
    impl ToolFunction for EchoFunction {
        async fn call(&self, _arguments: HashMap<String, Value>) -> agentloom_tools::ToolResult<ToolOutput> {
            Ok(ToolOutput::ok("echo-ok"))
        }
    }

    struct FatalFunction;

    #[async_trait]
    impl ToolFunction for FatalFunction {
        async fn call(&self, _arguments: HashMap<String, Value>) -> agentloom_tools::ToolResult<ToolOutput> {
            Ok(ToolOutput::failed("unrecoverable", agentloom_tools::ToolErrorKind::Fatal))
        }
    }

    fn scheduler_with(
        oracle: FakeOracle,
        registry: ToolRegistry,
        config: SchedulerConfig,
    ) -> TurnScheduler {
        let registry = Arc::new(registry);
        let router = Arc::new(ToolRouter::new(Arc::clone(&registry), PathBuf::from(".")));
        let tool_runtime = Arc::new(ToolCallRuntime::new(router, Arc::clone(&registry)));
        TurnScheduler::new(
            config,
            Arc::new(oracle),
            registry,
            tool_runtime,
            Arc::new(Telemetry::new()),
        )
    }

    fn echo_registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(
            ConfiguredToolSpec {
                spec: ToolSpec::new("echo", "echoes back", serde_json::json!({}), vec![]),
                kind: ToolKind::Function,
                capabilities: vec![Capability::ReadFs],
            },
            Arc::new(FunctionHandler::new("echo", Arc::new(EchoFunction))),
        );
        registry
    }

    #[tokio::test]
    async fn zero_max_turns_returns_immediately_without_calling_oracle() {
        let oracle = FakeOracle::scripted(vec![]);
        let scheduler = scheduler_with(
            oracle,
            ToolRegistry::new(),
            SchedulerConfig { max_turns: 0, ..Default::default() },
        );
        let mut session = ContextSession::new(ContextSettings::default());
        let outcome = scheduler.run(&mut session, "hello").await.unwrap();
        assert_eq!(outcome.stop_reason, StopReason::Completed);
        assert_eq!(outcome.turns_used, 0);
    }

    #[tokio::test]
    async fn empty_prompt_is_rejected() {
        let oracle = FakeOracle::scripted(vec![]);
        let scheduler = scheduler_with(oracle, ToolRegistry::new(), SchedulerConfig::default());
        let mut session = ContextSession::new(ContextSettings::default());
        let err = scheduler.run(&mut session, "   ").await.unwrap_err();
        assert!(matches!(err, RuntimeError::EmptyPrompt));
    }

    #[tokio::test]
    async fn text_only_response_completes_in_one_turn() {
        let oracle = FakeOracle::scripted(vec![text_response("done")]);
        let scheduler = scheduler_with(oracle, ToolRegistry::new(), SchedulerConfig::default());
        let mut session = ContextSession::new(ContextSettings::default());
        let outcome = scheduler.run(&mut session, "hello").await.unwrap();
        assert_eq!(outcome.stop_reason, StopReason::Completed);
        assert_eq!(outcome.turns_used, 1);
    }

    #[tokio::test]
    async fn tool_call_then_end_turn_uses_two_iterations() {
        let oracle = FakeOracle::scripted(vec![
            tool_use_response("call_1", "echo"),
            text_response("done"),
        ]);
        let telemetry_probe = Telemetry::new();
        let registry = Arc::new(echo_registry());
        let router = Arc::new(ToolRouter::new(Arc::clone(&registry), PathBuf::from(".")));
        let tool_runtime = Arc::new(ToolCallRuntime::new(router, Arc::clone(&registry)));
        let scheduler = TurnScheduler::new(
            SchedulerConfig::default(),
            Arc::new(oracle),
            registry,
            tool_runtime,
            Arc::new(telemetry_probe),
        );
        let mut session = ContextSession::new(ContextSettings::default());
        let outcome = scheduler.run(&mut session, "hello").await.unwrap();
        assert_eq!(outcome.stop_reason, StopReason::Completed);
        assert_eq!(outcome.turns_used, 2);
    }

    #[tokio::test]
    async fn dry_run_skips_dispatch_and_records_failure() {
        let oracle = FakeOracle::scripted(vec![
            tool_use_response("call_1", "echo"),
            text_response("done"),
        ]);
        let scheduler = scheduler_with(
            oracle,
            echo_registry(),
            SchedulerConfig { dry_run: true, exit_on_tool_error: false, ..Default::default() },
        );
        let mut session = ContextSession::new(ContextSettings::default());
        let outcome = scheduler.run(&mut session, "hello").await.unwrap();
        assert_eq!(outcome.stop_reason, StopReason::Completed);
        assert_eq!(outcome.turns_used, 2);
    }

    #[tokio::test]
    async fn recoverable_tool_error_stops_when_exit_on_tool_error_set() {
        let oracle = FakeOracle::scripted(vec![tool_use_response("call_1", "missing_tool")]);
        let scheduler = scheduler_with(
            oracle,
            ToolRegistry::new(),
            SchedulerConfig { exit_on_tool_error: true, ..Default::default() },
        );
        let mut session = ContextSession::new(ContextSettings::default());
        let outcome = scheduler.run(&mut session, "hello").await.unwrap();
        assert_eq!(outcome.stop_reason, StopReason::ToolError);
        assert_eq!(outcome.turns_used, 1);
    }

    #[tokio::test]
    async fn max_turns_reached_still_dispatches_and_answers_the_pending_tool_use() {
        let oracle = FakeOracle::scripted(vec![tool_use_response("call_1", "echo")]);
        let scheduler = scheduler_with(
            oracle,
            echo_registry(),
            SchedulerConfig { max_turns: 1, ..Default::default() },
        );
        let mut session = ContextSession::new(ContextSettings::default());
        let outcome = scheduler.run(&mut session, "hello").await.unwrap();
        assert_eq!(outcome.stop_reason, StopReason::MaxTurns);
        assert_eq!(outcome.turns_used, 1);

        let answered = session.build_messages().into_iter().any(|(_, blocks)| {
            blocks.iter().any(|b| {
                matches!(
                    b,
                    ContentBlock::ToolResult { tool_use_id, .. } if tool_use_id == "call_1"
                )
            })
        });
        assert!(answered, "the tool_use from the last iteration must still get a tool_result");
    }

    #[tokio::test]
    async fn fatal_tool_error_stops_even_when_exit_on_tool_error_is_unset() {
        let oracle = FakeOracle::scripted(vec![tool_use_response("call_1", "blow_up")]);
        let mut registry = ToolRegistry::new();
        registry.register(
            ConfiguredToolSpec {
                spec: ToolSpec::new("blow_up", "always fails fatally", serde_json::json!({}), vec![]),
                kind: ToolKind::Function,
                capabilities: vec![Capability::ReadFs],
            },
            Arc::new(FunctionHandler::new("blow_up", Arc::new(FatalFunction))),
        );
        let scheduler = scheduler_with(
            oracle,
            registry,
            SchedulerConfig { exit_on_tool_error: false, ..Default::default() },
        );
        let mut session = ContextSession::new(ContextSettings::default());
        let outcome = scheduler.run(&mut session, "hello").await.unwrap();
        assert_eq!(outcome.stop_reason, StopReason::FatalToolError);
        assert_eq!(outcome.turns_used, 1);
    }

    #[tokio::test]
    async fn oracle_failure_rolls_back_the_turn() {
        let oracle = FakeOracle::scripted(vec![]);
        let scheduler = scheduler_with(oracle, ToolRegistry::new(), SchedulerConfig::default());
        let mut session = ContextSession::new(ContextSettings::default());
        let before = session.status().turn;
        let err = scheduler.run(&mut session, "hello").await.unwrap_err();
        assert!(matches!(err, RuntimeError::Oracle(OracleError::Other(_))));
        assert_eq!(session.status().turn, before);
    }
}
