//! Builders for the content blocks and oracle responses tests script
//! against most often.

use agentloom_core::ContentBlock;
use agentloom_runtime::{OracleResponse, OracleStopReason, Usage};

/// A plain text block.
#[must_use]
pub fn text_block(text: impl Into<String>) -> ContentBlock {
    ContentBlock::Text { text: text.into() }
}

/// A `tool_use` block requesting `name` with no arguments.
#[must_use]
pub fn tool_use_block(id: impl Into<String>, name: impl Into<String>) -> ContentBlock {
    tool_use_block_with(id, name, serde_json::json!({}))
}

/// A `tool_use` block requesting `name` with the given `input`.
#[must_use]
pub fn tool_use_block_with(
    id: impl Into<String>,
    name: impl Into<String>,
    input: serde_json::Value,
) -> ContentBlock {
    ContentBlock::ToolUse {
        id: id.into(),
        name: name.into(),
        input,
    }
}

/// A `tool_result` block answering `tool_use_id`.
#[must_use]
pub fn tool_result_block(
    tool_use_id: impl Into<String>,
    content: impl Into<String>,
    is_error: bool,
) -> ContentBlock {
    ContentBlock::ToolResult {
        tool_use_id: tool_use_id.into(),
        content: content.into(),
        is_error,
    }
}

/// An oracle response ending the turn with plain text, no tool calls.
#[must_use]
pub fn end_turn_response(text: impl Into<String>) -> OracleResponse {
    OracleResponse {
        content: vec![text_block(text)],
        stop_reason: OracleStopReason::EndTurn,
        usage: Some(Usage { input_tokens: 100, output_tokens: 20 }),
    }
}

/// An oracle response requesting a single tool call.
#[must_use]
pub fn tool_call_response(id: impl Into<String>, name: impl Into<String>) -> OracleResponse {
    OracleResponse {
        content: vec![tool_use_block(id, name)],
        stop_reason: OracleStopReason::ToolUse,
        usage: Some(Usage { input_tokens: 100, output_tokens: 20 }),
    }
}
