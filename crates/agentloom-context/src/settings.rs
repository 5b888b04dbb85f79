//! Runtime-facing settings consumed by the context session.
//!
//! This is the in-memory shape the session actually operates on; it is
//! produced by loading an `agentloom-config` `Settings` document (or by a
//! test harness building one directly).

use agentloom_history::CompactionLimits;

/// The subset of configuration the context session needs at runtime.
#[derive(Debug, Clone, Copy)]
pub struct ContextSettings {
    /// The model's raw context window.
    pub context_tokens: u64,
    /// Tokens reserved as headroom below the raw context window.
    pub guardrail_tokens: u64,
    /// Whether compaction runs automatically on every append.
    pub auto_compact: bool,
    /// Number of most recent turns always kept uncompacted.
    pub keep_last_turns: u64,
    /// The compaction target, before the 95%-of-window cap.
    pub target_tokens: u64,
    /// Token budget for rendered pins.
    pub pin_budget_tokens: u64,
    /// Maximum estimated tokens a tool_result may carry before truncation.
    pub max_tool_tokens: u64,
    /// Maximum raw byte size a tool_result may carry before truncation.
    pub max_stdout_bytes: usize,
    /// Maximum line count a tool_result may carry before truncation.
    pub max_lines: usize,
}

impl Default for ContextSettings {
    fn default() -> Self {
        Self {
            context_tokens: 200_000,
            guardrail_tokens: 20_000,
            auto_compact: true,
            keep_last_turns: 4,
            target_tokens: 110_000,
            pin_budget_tokens: 2_048,
            max_tool_tokens: 4_000,
            max_stdout_bytes: 131_072,
            max_lines: 800,
        }
    }
}

impl ContextSettings {
    /// The effective window tokens the packed prompt must stay under.
    pub fn window_tokens(&self) -> u64 {
        self.context_tokens.saturating_sub(self.guardrail_tokens)
    }

    pub(crate) fn compaction_limits(&self) -> CompactionLimits {
        CompactionLimits {
            max_tool_tokens: self.max_tool_tokens,
            max_stdout_bytes: self.max_stdout_bytes,
            max_lines: self.max_lines,
            window_tokens: self.window_tokens(),
            target_tokens: self.target_tokens,
            keep_last_turns: self.keep_last_turns,
        }
    }
}
