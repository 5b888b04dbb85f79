//! The Oracle seam (C16): the scheduler depends only on this trait,
//! never on a concrete LLM client.

use agentloom_core::{ContentBlock, Role};
use agentloom_tools::ToolSpec;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::OracleError;

/// One request to the oracle, mirroring the external wire shape
/// exactly: `{model, max_tokens, messages, system?, tools}`.
#[derive(Debug, Clone, Serialize)]
pub struct OracleRequest {
    /// The model identifier.
    pub model: String,
    /// The maximum tokens the oracle may generate.
    pub max_tokens: u32,
    /// The wire-ready message list.
    pub messages: Vec<(Role, Vec<ContentBlock>)>,
    /// An optional system prompt, when not already folded into history.
    pub system: Option<String>,
    /// The tools published to the model this turn.
    pub tools: Vec<ToolSpec>,
}

/// Token accounting the oracle reports back, when available.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Usage {
    /// Tokens consumed by the input.
    pub input_tokens: u64,
    /// Tokens generated in the response.
    pub output_tokens: u64,
}

/// Why the oracle stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The turn is complete; no further tool calls were requested.
    EndTurn,
    /// The oracle emitted one or more `tool_use` blocks.
    ToolUse,
    /// Generation stopped at `max_tokens`.
    MaxTokens,
}

/// One response from the oracle, mirroring `{content, stop_reason,
/// usage?}`.
#[derive(Debug, Clone)]
pub struct OracleResponse {
    /// The assistant's content blocks, preserved exactly for history.
    pub content: Vec<ContentBlock>,
    /// Why generation stopped.
    pub stop_reason: StopReason,
    /// Token usage, when the oracle reports it.
    pub usage: Option<Usage>,
}

/// The seam every LLM backend implements. The scheduler consults this
/// once per iteration and never depends on a concrete client.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Complete one request.
    async fn complete(&self, request: OracleRequest) -> Result<OracleResponse, OracleError>;
}
