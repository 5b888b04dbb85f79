//! Context Session (C6): the facade the scheduler talks to.

use agentloom_core::{ContentBlock, Role, TokenMeter};
use agentloom_history::{CompactionEngine, CompactionOutcome, HistoryStore, PinManager};
use chrono::Utc;

use crate::error::{ContextError, ContextResult};
use crate::settings::ContextSettings;

/// A snapshot of session health, used by `/status` and telemetry.
#[derive(Debug, Clone, Copy)]
pub struct SessionStatus {
    /// Current total effective tokens in the store.
    pub tokens: u64,
    /// The model's window tokens.
    pub window: u64,
    /// The current turn counter.
    pub turn: u64,
    /// Number of currently active (unexpired) pins.
    pub pins_active: usize,
}

/// Owns the token meter, history store, pin manager and compaction engine
/// for a single run or interactive session.
pub struct ContextSession {
    settings: ContextSettings,
    meter: TokenMeter,
    store: HistoryStore,
    pins: PinManager,
    compaction: CompactionEngine,
    /// Cumulative counters bumped by compaction; drained by telemetry.
    pub compact_events: u64,
    /// See [`ContextSession::compact_events`].
    pub drops_count: u64,
    /// See [`ContextSession::compact_events`].
    pub summarizer_calls: u64,
}

impl ContextSession {
    /// Construct a new session with the given settings.
    pub fn new(settings: ContextSettings) -> Self {
        let compaction = CompactionEngine::new(settings.compaction_limits());
        Self {
            settings,
            meter: TokenMeter::default(),
            store: HistoryStore::new(),
            pins: PinManager::new(),
            compaction,
            compact_events: 0,
            drops_count: 0,
            summarizer_calls: 0,
        }
    }

    /// Register the (single) system prompt text.
    pub fn register_system_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        let tokens = self.meter.estimate_text(&text);
        self.store.register_system(text, tokens, Utc::now());
    }

    /// Append a user message, advancing the turn counter, and maybe compact.
    pub fn add_user_message(&mut self, text: impl Into<String>) -> u64 {
        let text = text.into();
        let tokens = self.meter.estimate_text(&text);
        let turn = self.store.register_user(text, tokens, Utc::now());
        self.maybe_compact();
        turn
    }

    /// Append an assistant message (its raw content blocks, preserved
    /// exactly as returned by the oracle), and maybe compact.
    pub fn add_assistant_message(&mut self, blocks: Vec<ContentBlock>) {
        let tokens = self.estimate_blocks(Role::Assistant, &blocks);
        self.store.register_assistant(blocks, tokens, Utc::now());
        self.maybe_compact();
    }

    /// Append tool-result blocks as a single user-role record, and maybe
    /// compact.
    pub fn add_tool_results(&mut self, blocks: Vec<ContentBlock>) {
        let tokens = self.estimate_blocks(Role::User, &blocks);
        self.store.register_tool_results(blocks, tokens, Utc::now());
        self.maybe_compact();
    }

    /// Append a single tool_result as text, truncating per tool limits.
    /// Always enqueues regardless of dedup, since every tool_use must be
    /// immediately answered.
    pub fn add_tool_text_result(&mut self, tool_use_id: impl Into<String>, text: &str, is_error: bool) {
        let capped = agentloom_history::truncate_tool_output(text, self.settings.max_lines);
        let block = ContentBlock::ToolResult {
            tool_use_id: tool_use_id.into(),
            content: capped,
            is_error,
        };
        self.add_tool_results(vec![block]);
    }

    /// Whether a tool-result content matching `hash` has already been
    /// observed this session.
    pub fn has_tool_hash(&self, hash: &str) -> bool {
        self.store.has_tool_hash(hash)
    }

    /// Record a tool-result content hash as observed.
    pub fn register_tool_hash(&mut self, hash: impl Into<String>) {
        self.store.register_tool_hash(hash);
    }

    /// Build the wire-ready message list, prepending a synthetic system
    /// message of rendered pin blocks when pins exist.
    pub fn build_messages(&mut self) -> Vec<(Role, Vec<ContentBlock>)> {
        let budget = self.settings.pin_budget_tokens;
        let rendered = {
            let meter = &mut self.meter;
            self.pins
                .render_bounded(Utc::now(), budget, |text| meter.estimate_text(text))
        };

        let mut messages = self.store.messages();
        if !rendered.is_empty() {
            let pin_text = rendered.join("\n");
            messages.insert(
                0,
                (
                    Role::System,
                    vec![ContentBlock::Text {
                        text: format!("# Pinned context\n{pin_text}"),
                    }],
                ),
            );
        }
        messages
    }

    /// Force a compaction pass regardless of current token usage.
    pub fn force_compact(&mut self) -> bool {
        let (outcome, delta) =
            self.compaction
                .maybe_compact(&mut self.store, &mut self.meter, true, Utc::now());
        self.apply_delta(delta);
        matches!(outcome, CompactionOutcome::Compacted { .. })
    }

    /// Roll back the current (still-open) turn, discarding everything
    /// appended to it.
    pub fn rollback_last_turn(&mut self) {
        self.store.rollback_current_turn();
    }

    /// Add a pin; returns its id.
    pub fn add_pin(&mut self, text: impl Into<String>, ttl_seconds: Option<i64>) -> ContextResult<u64> {
        Ok(self.pins.add_pin(text, ttl_seconds, Utc::now())?)
    }

    /// Remove a pin by id.
    pub fn remove_pin(&mut self, id: u64) -> bool {
        self.pins.remove_pin(id)
    }

    /// A point-in-time status snapshot.
    pub fn status(&mut self) -> SessionStatus {
        SessionStatus {
            tokens: self.store.total_tokens(),
            window: self.settings.window_tokens(),
            turn: self.store.turn_counter(),
            pins_active: self.pins.active_pins(Utc::now()).len(),
        }
    }

    /// Apply a `/config set group.field=value` style dotted override.
    pub fn update_setting(&mut self, group: &str, field: &str, value: &str) -> ContextResult<()> {
        macro_rules! set_u64 {
            ($target:expr) => {{
                $target = value
                    .parse()
                    .map_err(|_| ContextError::InvalidOverrideValue {
                        field: field.to_string(),
                        value: value.to_string(),
                    })?;
            }};
        }
        macro_rules! set_bool {
            ($target:expr) => {{
                $target = value
                    .parse()
                    .map_err(|_| ContextError::InvalidOverrideValue {
                        field: field.to_string(),
                        value: value.to_string(),
                    })?;
            }};
        }

        match group {
            "model" => match field {
                "context_tokens" => set_u64!(self.settings.context_tokens),
                "guardrail_tokens" => set_u64!(self.settings.guardrail_tokens),
                other => {
                    return Err(ContextError::UnknownField {
                        group: group.to_string(),
                        field: other.to_string(),
                    })
                }
            },
            "compaction" => match field {
                "auto" => set_bool!(self.settings.auto_compact),
                "keep_last_turns" => set_u64!(self.settings.keep_last_turns),
                "target_tokens" => set_u64!(self.settings.target_tokens),
                "pin_budget_tokens" => set_u64!(self.settings.pin_budget_tokens),
                other => {
                    return Err(ContextError::UnknownField {
                        group: group.to_string(),
                        field: other.to_string(),
                    })
                }
            },
            other => return Err(ContextError::UnknownGroup(other.to_string())),
        }
        self.compaction = CompactionEngine::new(self.settings.compaction_limits());
        Ok(())
    }

    fn maybe_compact(&mut self) {
        if !self.settings.auto_compact {
            return;
        }
        let (_, delta) =
            self.compaction
                .maybe_compact(&mut self.store, &mut self.meter, false, Utc::now());
        self.apply_delta(delta);
    }

    fn apply_delta(&mut self, delta: agentloom_history::compaction::CompactionTelemetryDelta) {
        self.compact_events += delta.compact_events;
        self.drops_count += delta.drops_count;
        self.summarizer_calls += delta.summarizer_calls;
    }

    fn estimate_blocks(&mut self, role: Role, blocks: &[ContentBlock]) -> u64 {
        self.meter
            .estimate_messages(&[agentloom_core::token_meter::MeterMessage {
                role,
                content: blocks.to_vec(),
            }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_never_exceeds_window_after_compaction() {
        let mut settings = ContextSettings::default();
        settings.context_tokens = 244;
        settings.guardrail_tokens = 20;
        settings.keep_last_turns = 1;
        settings.target_tokens = 224;
        let mut session = ContextSession::new(settings);
        session.register_system_text("be helpful");
        for _ in 0..4 {
            session.add_user_message("x".repeat(200));
            session.add_assistant_message(vec![ContentBlock::Text { text: "x".repeat(200) }]);
        }
        session.force_compact();
        let status = session.status();
        assert!(
            status.tokens <= status.window,
            "post-compaction tokens {} exceed window {}",
            status.tokens,
            status.window,
        );
    }

    #[test]
    fn every_tool_use_gets_a_result_even_with_dedup() {
        let mut session = ContextSession::new(ContextSettings::default());
        session.add_tool_text_result("call_1", "same output", false);
        session.add_tool_text_result("call_1", "same output", false);
        let messages = session.build_messages();
        let tool_result_count = messages
            .iter()
            .flat_map(|(_, blocks)| blocks.iter())
            .filter(|b| matches!(b, ContentBlock::ToolResult { .. }))
            .count();
        assert_eq!(tool_result_count, 2);
    }

    #[test]
    fn unknown_settings_group_errors() {
        let mut session = ContextSession::new(ContextSettings::default());
        let err = session.update_setting("bogus", "field", "1").unwrap_err();
        assert!(matches!(err, ContextError::UnknownGroup(_)));
    }

    #[test]
    fn rollback_drops_open_turn() {
        let mut session = ContextSession::new(ContextSettings::default());
        session.add_user_message("hello");
        let before = session.status().turn;
        session.rollback_last_turn();
        assert_eq!(session.status().turn, before - 1);
    }
}
