//! Renders a finished run as either a tools-executed table or the
//! OTEL-shaped JSON document telemetry already knows how to produce.

use agentloom_runtime::{RunOutcome, StopReason};
use agentloom_telemetry::Telemetry;

/// Print the OTEL-shaped JSON document to stdout.
pub fn print_json(outcome: &RunOutcome, telemetry: &Telemetry) {
    let mut doc = telemetry.export_otel();
    if let Some(object) = doc.as_object_mut() {
        object.insert(
            "stopped_reason".to_string(),
            serde_json::Value::String(stop_reason_label(outcome.stop_reason).to_string()),
        );
        object.insert(
            "turns_used".to_string(),
            serde_json::Value::from(outcome.turns_used),
        );
    }
    println!("{}", serde_json::to_string_pretty(&doc).unwrap_or_default());
}

/// Print a plain tools-executed table plus the stop reason.
pub fn print_table(outcome: &RunOutcome, telemetry: &Telemetry) {
    println!(
        "stopped_reason={} turns_used={}",
        stop_reason_label(outcome.stop_reason),
        outcome.turns_used
    );
    let events = telemetry.events();
    if events.is_empty() {
        println!("(no tool calls)");
        return;
    }
    println!("{:<5} {:<24} {:<8} {:>10} {:<10}", "turn", "tool", "ok", "duration_ms", "error");
    for event in events {
        println!(
            "{:<5} {:<24} {:<8} {:>10} {:<10}",
            event.turn,
            event.tool_name,
            event.success,
            event.duration.as_millis(),
            event.error.unwrap_or_default(),
        );
    }
}

fn stop_reason_label(reason: StopReason) -> &'static str {
    match reason {
        StopReason::Completed => "completed",
        StopReason::MaxTurns => "max_turns",
        StopReason::ToolError => "tool_error",
        StopReason::FatalToolError => "fatal_tool_error",
    }
}
