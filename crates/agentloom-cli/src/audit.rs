//! Builds the audit and changes JSONL logs from a finished run: the
//! audit log replays the full tool_use/tool_result pairing out of the
//! session transcript, the changes log derives per-turn mutation
//! summaries from recorded telemetry.

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use agentloom_context::ContextSession;
use agentloom_core::{ContentBlock, Role};
use agentloom_telemetry::Telemetry;
use agentloom_tools::{Capability, ToolRegistry};
use serde::Serialize;

/// One record per dispatched tool call.
#[derive(Debug, Serialize)]
pub struct AuditRecord {
    turn: u64,
    tool: String,
    input: serde_json::Value,
    result: String,
    is_error: bool,
    skipped: bool,
    paths: Vec<String>,
}

/// One changes-log record: either a single successful mutation, or a
/// per-turn rollup.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ChangeRecord {
    /// One successful write-capable call.
    Mutation {
        /// The turn the mutation happened in.
        turn: u64,
        /// The tool that performed it.
        tool: String,
        /// The path it touched.
        path: String,
    },
    /// A per-turn rollup of every path touched.
    TurnSummary {
        /// The turn this summarizes.
        turn: u64,
        /// A short human-readable description.
        summary: String,
        /// Every path any call in this turn touched.
        paths: Vec<String>,
    },
}

/// Walk `session`'s transcript pairing every `tool_use` with its
/// `tool_result`, enriching with the paths telemetry recorded for the
/// same call id.
pub fn build_audit_records(session: &mut ContextSession, telemetry: &Telemetry) -> Vec<AuditRecord> {
    let paths_by_call: HashMap<String, Vec<String>> = telemetry
        .events()
        .into_iter()
        .map(|event| (event.call_id, event.paths))
        .collect();

    let mut pending: HashMap<String, (u64, String, serde_json::Value)> = HashMap::new();
    let mut turn = 0u64;
    let mut records = Vec::new();

    for (role, blocks) in session.build_messages() {
        if role == Role::Assistant {
            turn += 1;
        }
        for block in blocks {
            match block {
                ContentBlock::ToolUse { id, name, input } => {
                    pending.insert(id, (turn, name, input));
                }
                ContentBlock::ToolResult {
                    tool_use_id,
                    content,
                    is_error,
                } => {
                    if let Some((turn, tool, input)) = pending.remove(&tool_use_id) {
                        let skipped = content.starts_with("dry-run:");
                        let paths = paths_by_call.get(&tool_use_id).cloned().unwrap_or_default();
                        records.push(AuditRecord {
                            turn,
                            tool,
                            input,
                            result: content,
                            is_error,
                            skipped,
                            paths,
                        });
                    }
                }
                _ => {}
            }
        }
    }

    records
}

/// Derive changes-log entries from the audit records: one mutation
/// entry per successful call on a write-capable tool, plus one summary
/// record per turn that had any dispatched calls.
pub fn build_change_records(records: &[AuditRecord], registry: &ToolRegistry) -> Vec<ChangeRecord> {
    let mut by_turn: HashMap<u64, Vec<&AuditRecord>> = HashMap::new();
    for record in records {
        by_turn.entry(record.turn).or_default().push(record);
    }

    let mut changes = Vec::new();
    let mut turns: Vec<u64> = by_turn.keys().copied().collect();
    turns.sort_unstable();

    for turn in turns {
        let calls = &by_turn[&turn];
        let mut turn_paths = Vec::new();
        for record in calls {
            for path in &record.paths {
                if !turn_paths.contains(path) {
                    turn_paths.push(path.clone());
                }
            }
            let is_write_capable = registry
                .spec(&record.tool)
                .map(|spec| spec.capabilities.contains(&Capability::WriteFs))
                .unwrap_or(false);
            if is_write_capable && !record.is_error {
                for path in &record.paths {
                    changes.push(ChangeRecord::Mutation {
                        turn,
                        tool: record.tool.clone(),
                        path: path.clone(),
                    });
                }
            }
        }
        changes.push(ChangeRecord::TurnSummary {
            turn,
            summary: format!("{} tool call(s), {} path(s) touched", calls.len(), turn_paths.len()),
            paths: turn_paths,
        });
    }

    changes
}

/// Write one JSON object per line to `path`, creating or truncating it.
pub fn write_jsonl<T: Serialize>(path: &Path, records: &[T]) -> std::io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    for record in records {
        let line = serde_json::to_string(record).unwrap_or_default();
        writeln!(file, "{line}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentloom_context::ContextSettings;
    use agentloom_core::ToolExecutionEvent;
    use agentloom_tools::{Capability, ConfiguredToolSpec, ToolKind, ToolSpec};
    use std::time::Duration;

    fn event(call_id: &str, tool_name: &str, paths: Vec<String>) -> ToolExecutionEvent {
        ToolExecutionEvent {
            turn: 1,
            tool_name: tool_name.to_string(),
            call_id: call_id.to_string(),
            duration: Duration::from_millis(5),
            success: true,
            input_size: 0,
            output_size: 0,
            error: None,
            truncated: false,
            paths,
        }
    }

    #[test]
    fn pairs_tool_use_with_its_result_and_enriches_paths() {
        let mut session = ContextSession::new(ContextSettings::default());
        session.add_user_message("write a file");
        session.add_assistant_message(vec![ContentBlock::ToolUse {
            id: "call_1".to_string(),
            name: "write_file".to_string(),
            input: serde_json::json!({"path": "out.txt"}),
        }]);
        session.add_tool_results(vec![ContentBlock::ToolResult {
            tool_use_id: "call_1".to_string(),
            content: "wrote 3 bytes".to_string(),
            is_error: false,
        }]);

        let telemetry = Telemetry::new();
        telemetry.record_tool_event(event("call_1", "write_file", vec!["out.txt".to_string()]));

        let records = build_audit_records(&mut session, &telemetry);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].tool, "write_file");
        assert_eq!(records[0].result, "wrote 3 bytes");
        assert!(!records[0].is_error);
        assert_eq!(records[0].paths, vec!["out.txt".to_string()]);
    }

    #[test]
    fn unanswered_tool_use_produces_no_record() {
        let mut session = ContextSession::new(ContextSettings::default());
        session.add_user_message("hi");
        session.add_assistant_message(vec![ContentBlock::ToolUse {
            id: "call_1".to_string(),
            name: "read_file".to_string(),
            input: serde_json::json!({}),
        }]);
        let telemetry = Telemetry::new();
        let records = build_audit_records(&mut session, &telemetry);
        assert!(records.is_empty());
    }

    fn registry_with_write_tool() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(
            ConfiguredToolSpec {
                spec: ToolSpec::new("write_file", "writes", serde_json::json!({}), vec![]),
                kind: ToolKind::Function,
                capabilities: vec![Capability::WriteFs],
            },
            std::sync::Arc::new(NoopHandler),
        );
        registry
    }

    struct NoopHandler;

    #[async_trait::async_trait]
    impl agentloom_tools::ToolHandler for NoopHandler {
        async fn call(
            &self,
            _invocation: agentloom_tools::ToolInvocation,
        ) -> agentloom_tools::ToolResult<agentloom_tools::ToolOutput> {
            Ok(agentloom_tools::ToolOutput::ok(""))
        }
    }

    #[test]
    fn successful_write_capable_call_produces_a_mutation_record() {
        let records = vec![AuditRecord {
            turn: 1,
            tool: "write_file".to_string(),
            input: serde_json::json!({}),
            result: "ok".to_string(),
            is_error: false,
            skipped: false,
            paths: vec!["out.txt".to_string()],
        }];
        let registry = registry_with_write_tool();
        let changes = build_change_records(&records, &registry);
        let mutations: Vec<_> = changes
            .iter()
            .filter(|c| matches!(c, ChangeRecord::Mutation { .. }))
            .collect();
        assert_eq!(mutations.len(), 1);
        let summaries: Vec<_> = changes
            .iter()
            .filter(|c| matches!(c, ChangeRecord::TurnSummary { .. }))
            .collect();
        assert_eq!(summaries.len(), 1);
    }

    #[test]
    fn failed_write_capable_call_produces_no_mutation_record() {
        let records = vec![AuditRecord {
            turn: 1,
            tool: "write_file".to_string(),
            input: serde_json::json!({}),
            result: "denied".to_string(),
            is_error: true,
            skipped: false,
            paths: vec!["out.txt".to_string()],
        }];
        let registry = registry_with_write_tool();
        let changes = build_change_records(&records, &registry);
        assert!(!changes.iter().any(|c| matches!(c, ChangeRecord::Mutation { .. })));
    }

    #[test]
    fn read_only_tool_never_produces_a_mutation_record() {
        let records = vec![AuditRecord {
            turn: 1,
            tool: "read_file".to_string(),
            input: serde_json::json!({}),
            result: "contents".to_string(),
            is_error: false,
            skipped: false,
            paths: vec!["in.txt".to_string()],
        }];
        let registry = ToolRegistry::new();
        let changes = build_change_records(&records, &registry);
        assert!(!changes.iter().any(|c| matches!(c, ChangeRecord::Mutation { .. })));
    }
}
