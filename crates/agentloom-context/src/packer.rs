//! Prompt Packer (C7): a thin function over the context session.

use agentloom_core::{ContentBlock, Role};

use crate::session::ContextSession;

/// The message list and token accounting for one LLM call.
#[derive(Debug, Clone)]
pub struct PackedPrompt {
    /// The wire-ready message list.
    pub messages: Vec<(Role, Vec<ContentBlock>)>,
    /// Total tokens across `messages`.
    pub token_total: u64,
    /// The model's window tokens.
    pub window_tokens: u64,
}

impl PackedPrompt {
    /// Percentage of the window currently used, rounded to two decimals.
    /// `0.0` when the window is zero.
    pub fn usage_pct(&self) -> f64 {
        if self.window_tokens == 0 {
            return 0.0;
        }
        let pct = self.token_total as f64 / self.window_tokens as f64 * 100.0;
        (pct * 100.0).round() / 100.0
    }
}

/// Produces the final message list sent to the LLM for one scheduler
/// iteration. Holds no state of its own beyond a reference to the session.
pub struct PromptPacker<'a> {
    session: &'a mut ContextSession,
}

impl<'a> PromptPacker<'a> {
    /// Wrap a session for packing.
    pub fn new(session: &'a mut ContextSession) -> Self {
        Self { session }
    }

    /// Pack the current session state into a prompt.
    pub fn pack(&mut self) -> PackedPrompt {
        let messages = self.session.build_messages();
        let status = self.session.status();
        PackedPrompt {
            messages,
            token_total: status.tokens,
            window_tokens: status.window,
        }
    }

    /// Alias for [`PromptPacker::pack`], kept for call-site symmetry with
    /// the scheduler's dry-run mode (packing has no side effects to skip).
    pub fn dry_run(&mut self) -> PackedPrompt {
        self.pack()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::ContextSettings;

    #[test]
    fn usage_pct_is_zero_with_zero_window() {
        let prompt = PackedPrompt {
            messages: vec![],
            token_total: 10,
            window_tokens: 0,
        };
        assert_eq!(prompt.usage_pct(), 0.0);
    }

    #[test]
    fn pack_reflects_session_status() {
        let mut session = ContextSession::new(ContextSettings::default());
        session.register_system_text("hi");
        let expected_tokens = session.status().tokens;
        let mut packer = PromptPacker::new(&mut session);
        let packed = packer.pack();
        assert_eq!(packed.token_total, expected_tokens);
    }
}
