//! OTEL JSONL export: one `{resource, event}` object per line.

use std::io::Write;

use agentloom_core::ToolExecutionEvent;
use chrono::Utc;
use serde::Serialize;

use crate::error::TelemetryResult;

/// The resource attributes attached to every exported event.
#[derive(Debug, Clone, Serialize)]
pub struct OtelResource {
    #[serde(rename = "service.name")]
    service_name: String,
}

impl OtelResource {
    /// Identify events as coming from `service_name`.
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }
}

/// One exported tool-call event.
#[derive(Debug, Clone, Serialize)]
pub struct OtelEvent {
    name: &'static str,
    timestamp: String,
    attributes: OtelAttributes,
}

#[derive(Debug, Clone, Serialize)]
struct OtelAttributes {
    #[serde(rename = "tool.name")]
    tool_name: String,
    #[serde(rename = "tool.success")]
    tool_success: bool,
    #[serde(rename = "tool.duration_ms")]
    tool_duration_ms: u128,
    #[serde(rename = "tool.error_type", skip_serializing_if = "Option::is_none")]
    tool_error_type: Option<String>,
    #[serde(rename = "tool.message", skip_serializing_if = "Option::is_none")]
    tool_message: Option<String>,
}

impl OtelEvent {
    /// Build an OTEL event from a recorded tool call.
    pub fn from_tool_event(event: &ToolExecutionEvent) -> Self {
        Self {
            name: "tool.call",
            timestamp: Utc::now().to_rfc3339(),
            attributes: OtelAttributes {
                tool_name: event.tool_name.clone(),
                tool_success: event.success,
                tool_duration_ms: event.duration.as_millis(),
                tool_error_type: event.error.clone(),
                tool_message: if event.success {
                    None
                } else {
                    Some(format!("tool '{}' failed", event.tool_name))
                },
            },
        }
    }
}

#[derive(Serialize)]
struct OtelLine<'a> {
    resource: &'a OtelResource,
    event: &'a OtelEvent,
}

/// Writes OTEL JSONL lines to an underlying writer.
pub struct OtelSink<W: Write> {
    resource: OtelResource,
    writer: W,
}

impl<W: Write> OtelSink<W> {
    /// Build a sink tagging every line with `resource`.
    pub fn new(resource: OtelResource, writer: W) -> Self {
        Self { resource, writer }
    }

    /// Append one line per event in `events`, in order.
    pub fn flush_to_otel(&mut self, events: &[ToolExecutionEvent]) -> TelemetryResult<()> {
        for event in events {
            let otel_event = OtelEvent::from_tool_event(event);
            let line = OtelLine {
                resource: &self.resource,
                event: &otel_event,
            };
            let json = serde_json::to_string(&line)
                .map_err(|e| crate::error::TelemetryError::ConfigError(e.to_string()))?;
            writeln!(self.writer, "{json}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn event(success: bool) -> ToolExecutionEvent {
        ToolExecutionEvent {
            turn: 1,
            tool_name: "run_terminal_cmd".into(),
            call_id: "call_1".into(),
            duration: Duration::from_millis(250),
            success,
            input_size: 5,
            output_size: 5,
            error: if success { None } else { Some("policy_denied".into()) },
            truncated: false,
            paths: vec![],
        }
    }

    #[test]
    fn flush_writes_one_line_per_event() {
        let mut buffer = Vec::new();
        let mut sink = OtelSink::new(OtelResource::new("agentloom"), &mut buffer);
        sink.flush_to_otel(&[event(true), event(false)]).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("\"tool.success\":false"));
        assert!(text.contains("\"service.name\":\"agentloom\""));
    }
}
