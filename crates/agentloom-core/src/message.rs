//! The message record: the atomic unit stored by the history store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// The role a message record was authored under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions, always ordered first.
    System,
    /// A message from the human operator.
    User,
    /// A message produced by the LLM.
    Assistant,
}

/// The record kind, distinct from `Role` because a tool result is carried in
/// a user-role record but needs its own ordering/priority treatment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    /// System instructions.
    System,
    /// A user message.
    User,
    /// An assistant message.
    Assistant,
    /// A tool result observation, carried as a user-role record.
    ToolResult,
    /// The single, movable compaction summary record.
    Summary,
}

impl Kind {
    /// Eviction priority: lower is more protected. System/user are `0`;
    /// assistant/tool_result/summary are `1`.
    pub fn priority(self) -> u8 {
        match self {
            Kind::System | Kind::User => 0,
            Kind::Assistant | Kind::ToolResult | Kind::Summary => 1,
        }
    }
}

/// One block of message content.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Plain text.
    Text {
        /// The text content.
        text: String,
    },
    /// A tool invocation emitted by the assistant.
    ToolUse {
        /// The oracle-assigned call id.
        id: String,
        /// The tool name (may be `server/tool` for MCP calls).
        name: String,
        /// The tool's input arguments.
        input: serde_json::Value,
    },
    /// A tool result, answering a prior `ToolUse` block.
    ToolResult {
        /// The `id` of the `ToolUse` block this answers.
        tool_use_id: String,
        /// The rendered result content.
        content: String,
        /// Whether the tool call failed.
        is_error: bool,
    },
}

impl ContentBlock {
    /// The text fragment this block contributes to free-text scanning
    /// (summarization, dedup hashing). Non-text blocks render their
    /// canonical string form.
    pub fn text_fragment(&self) -> String {
        match self {
            ContentBlock::Text { text } => text.clone(),
            ContentBlock::ToolUse { name, input, .. } => format!("{name}({input})"),
            ContentBlock::ToolResult { content, .. } => content.clone(),
        }
    }
}

/// Metadata carried alongside a record for dedup and auditing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordMetadata {
    /// SHA-256 hex digest of the canonical tool payload, when applicable.
    pub tool_hash: Option<String>,
    /// Creation timestamp.
    pub timestamp: DateTime<Utc>,
}

impl RecordMetadata {
    fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            tool_hash: None,
            timestamp,
        }
    }
}

/// The atomic unit stored by the history store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    /// The authoring role.
    pub role: Role,
    /// The record kind.
    pub kind: Kind,
    /// The original content blocks, as received.
    pub content: Vec<ContentBlock>,
    /// An alternate, compacted content overlay installed by the compaction
    /// engine when the original content exceeds a tool-output cap.
    pub compacted_content: Option<Vec<ContentBlock>>,
    /// The turn this record belongs to; `0` for system records.
    pub turn_id: u64,
    /// Eviction priority, mirrors `kind.priority()` at creation time.
    pub priority: u8,
    /// Token count of the *original* content, estimated once at creation.
    pub token_count: u64,
    /// Token count of `compacted_content`, when present.
    pub compacted_token_count: Option<u64>,
    /// Dedup/audit metadata.
    pub metadata: RecordMetadata,
}

impl MessageRecord {
    /// Construct a new record. `token_count` must already be estimated by
    /// the token meter; this constructor performs no estimation itself.
    pub fn new(
        role: Role,
        kind: Kind,
        content: Vec<ContentBlock>,
        turn_id: u64,
        token_count: u64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            role,
            kind,
            content,
            compacted_content: None,
            turn_id,
            priority: kind.priority(),
            token_count,
            compacted_token_count: None,
            metadata: RecordMetadata::new(timestamp),
        }
    }

    /// The content actually sent to the LLM: the compacted overlay when
    /// present, otherwise the original content.
    pub fn effective_content(&self) -> &[ContentBlock] {
        self.compacted_content
            .as_deref()
            .unwrap_or(self.content.as_slice())
    }

    /// The token count actually charged against the window: the compacted
    /// overlay's count when present, otherwise the original count.
    pub fn effective_tokens(&self) -> u64 {
        self.compacted_token_count.unwrap_or(self.token_count)
    }

    /// Install a compacted overlay, replacing the effective content/tokens
    /// without discarding the original.
    pub fn set_compacted(&mut self, content: Vec<ContentBlock>, tokens: u64) {
        self.compacted_content = Some(content);
        self.compacted_token_count = Some(tokens);
    }

    /// Remove any compacted overlay, restoring the original content as
    /// effective.
    pub fn clear_compacted(&mut self) {
        self.compacted_content = None;
        self.compacted_token_count = None;
    }

    /// Non-empty text fragments across this record's effective content, used
    /// by the summarizer and tool-output cap enforcement.
    pub fn text_fragments(&self) -> Vec<String> {
        self.effective_content()
            .iter()
            .map(|b| b.text_fragment())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Canonicalize this record's tool-result content to UTF-8 bytes and
    /// hash with SHA-256, returning the hex digest. Only meaningful for
    /// `Kind::ToolResult` records; other kinds hash their joined text
    /// fragments the same way for uniformity.
    pub fn content_hash(&self) -> String {
        let canonical = self.text_fragments().join("\n");
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Record a freshly computed content hash into this record's metadata.
    pub fn set_content_hash(&mut self) {
        self.metadata.tool_hash = Some(self.content_hash());
    }
}
