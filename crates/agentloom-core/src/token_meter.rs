//! Token estimation with a deterministic fallback encoder.

use crate::message::{ContentBlock, Role};

/// A single labeled estimation, kept for debugging prompt-size regressions.
#[derive(Debug, Clone)]
pub struct TokenMeasurement {
    /// The caller-supplied label.
    pub label: String,
    /// The estimated token count.
    pub tokens: u64,
}

/// A message to be estimated: a role plus its content blocks. Decoupled from
/// `MessageRecord` so the meter can also estimate not-yet-stored content.
#[derive(Debug, Clone)]
pub struct MeterMessage {
    /// The message role.
    pub role: Role,
    /// The message's effective content blocks.
    pub content: Vec<ContentBlock>,
}

/// Estimates token consumption for text and wire-shaped messages.
///
/// No bundled BPE tables ship with this crate; every estimate uses the
/// `ceil(bytes / fallback_chars_per_token)` heuristic, the same fallback the
/// original implementation takes when its optional tokenizer dependency is
/// unavailable. This keeps the estimator deterministic and free of I/O.
pub struct TokenMeter {
    fallback_ratio: usize,
    measurements: Vec<TokenMeasurement>,
}

impl Default for TokenMeter {
    fn default() -> Self {
        Self::new(4)
    }
}

impl TokenMeter {
    /// Construct a meter with the given fallback chars-per-token ratio
    /// (clamped to at least 1).
    pub fn new(fallback_chars_per_token: usize) -> Self {
        Self {
            fallback_ratio: fallback_chars_per_token.max(1),
            measurements: Vec::new(),
        }
    }

    /// Estimate the token cost of a bare string.
    pub fn estimate_text(&mut self, text: &str) -> u64 {
        self.encode_length(text)
    }

    /// Estimate the token cost of a bare string, recording a labeled
    /// measurement.
    pub fn estimate_text_labeled(&mut self, text: &str, label: impl Into<String>) -> u64 {
        let tokens = self.encode_length(text);
        self.measurements.push(TokenMeasurement {
            label: label.into(),
            tokens,
        });
        tokens
    }

    /// Estimate the token cost of a sequence of wire-shaped messages.
    pub fn estimate_messages(&mut self, messages: &[MeterMessage]) -> u64 {
        messages.iter().map(|m| self.estimate_message(m)).sum()
    }

    /// Estimate the token cost of a sequence of messages, recording a
    /// labeled measurement.
    pub fn estimate_messages_labeled(
        &mut self,
        messages: &[MeterMessage],
        label: impl Into<String>,
    ) -> u64 {
        let total = self.estimate_messages(messages);
        self.measurements.push(TokenMeasurement {
            label: label.into(),
            tokens: total,
        });
        total
    }

    /// The measurements recorded so far, in order.
    pub fn measurements(&self) -> &[TokenMeasurement] {
        &self.measurements
    }

    /// Clear all recorded measurements.
    pub fn reset_measurements(&mut self) {
        self.measurements.clear();
    }

    fn estimate_message(&mut self, message: &MeterMessage) -> u64 {
        const ROLE_OVERHEAD: u64 = 4;
        const NON_TEXT_OVERHEAD: u64 = 6;

        let role_str = match message.role {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        };

        let mut total = ROLE_OVERHEAD;
        for block in &message.content {
            total += match block {
                ContentBlock::Text { text } => self.encode_length(text),
                ContentBlock::ToolUse { input, .. } => {
                    self.encode_length(&input.to_string()) + NON_TEXT_OVERHEAD
                }
                ContentBlock::ToolResult { content, .. } => {
                    self.encode_length(content) + NON_TEXT_OVERHEAD
                }
            };
        }
        total += role_str.len() as u64;
        total
    }

    fn encode_length(&self, text: &str) -> u64 {
        if text.is_empty() {
            return 0;
        }
        let chars = text.chars().count();
        (chars.div_ceil(self.fallback_ratio)).max(1) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_costs_zero() {
        let meter = TokenMeter::default();
        assert_eq!(meter.encode_length(""), 0);
    }

    #[test]
    fn fallback_ratio_rounds_up() {
        let meter = TokenMeter::new(4);
        // 5 chars / 4 -> ceil = 2
        assert_eq!(meter.encode_length("hello"), 2);
    }

    #[test]
    fn message_estimate_includes_overhead() {
        let mut meter = TokenMeter::new(4);
        let messages = vec![MeterMessage {
            role: Role::User,
            content: vec![ContentBlock::Text {
                text: "hi".to_string(),
            }],
        }];
        // overhead(4) + ceil(2/4)=1 + len("user")=4 -> 9
        assert_eq!(meter.estimate_messages(&messages), 9);
    }

    #[test]
    fn measurements_accumulate_and_reset() {
        let mut meter = TokenMeter::default();
        meter.estimate_text_labeled("abcd", "prompt");
        assert_eq!(meter.measurements().len(), 1);
        assert_eq!(meter.measurements()[0].label, "prompt");
        meter.reset_measurements();
        assert!(meter.measurements().is_empty());
    }
}
