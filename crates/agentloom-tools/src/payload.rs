//! Tool payloads (C8) and the parsed call shape (C9).

use std::collections::HashMap;

use agentloom_core::ContentBlock;
use serde_json::Value;

/// A tagged variant describing how a tool call should be dispatched.
#[derive(Debug, Clone)]
pub enum ToolPayload {
    /// An in-process function tool.
    Function {
        /// The call's arguments.
        arguments: HashMap<String, Value>,
    },
    /// A remote MCP tool call.
    Mcp {
        /// The MCP server name.
        server: String,
        /// The tool name on that server.
        tool: String,
        /// The call's arguments.
        arguments: HashMap<String, Value>,
    },
    /// A unified shell execution request.
    UnifiedExec {
        /// The shell command to run.
        command: String,
        /// Additional positional arguments.
        arguments: Vec<String>,
    },
    /// An opaque, handler-defined payload.
    Custom {
        /// The custom tool name.
        name: String,
        /// The raw payload.
        payload: Value,
    },
}

/// A tool call parsed out of an assistant `tool_use` block.
#[derive(Debug, Clone)]
pub struct ToolCall {
    /// The tool's registered name (or `server/tool` for MCP calls).
    pub tool_name: String,
    /// The oracle-assigned call id, echoed back in the tool_result.
    pub call_id: String,
    /// The parsed payload.
    pub payload: ToolPayload,
}

impl ToolCall {
    /// Parse an assistant `tool_use` block into a `ToolCall`. Returns
    /// `None` for any other block kind.
    ///
    /// If `tool_name` contains `/`, the payload is MCP (`server/tool`
    /// split); otherwise it is `Function`.
    pub fn from_block(block: &ContentBlock) -> Option<Self> {
        let ContentBlock::ToolUse { id, name, input } = block else {
            return None;
        };

        let arguments = input
            .as_object()
            .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();

        let payload = if let Some((server, tool)) = name.split_once('/') {
            ToolPayload::Mcp {
                server: server.to_string(),
                tool: tool.to_string(),
                arguments,
            }
        } else {
            ToolPayload::Function { arguments }
        };

        Some(Self {
            tool_name: name.clone(),
            call_id: id.clone(),
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slash_in_name_becomes_mcp_payload() {
        let block = ContentBlock::ToolUse {
            id: "call_1".into(),
            name: "filesystem/read_file".into(),
            input: serde_json::json!({"path": "/tmp/x"}),
        };
        let call = ToolCall::from_block(&block).unwrap();
        assert!(matches!(call.payload, ToolPayload::Mcp { ref server, ref tool, .. }
            if server == "filesystem" && tool == "read_file"));
    }

    #[test]
    fn plain_name_becomes_function_payload() {
        let block = ContentBlock::ToolUse {
            id: "call_1".into(),
            name: "read_file".into(),
            input: serde_json::json!({"path": "/tmp/x"}),
        };
        let call = ToolCall::from_block(&block).unwrap();
        assert!(matches!(call.payload, ToolPayload::Function { .. }));
    }

    #[test]
    fn non_tool_use_block_returns_none() {
        let block = ContentBlock::Text { text: "hi".into() };
        assert!(ToolCall::from_block(&block).is_none());
    }
}
