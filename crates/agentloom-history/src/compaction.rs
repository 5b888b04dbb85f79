//! Compaction engine (C5): decides when/what to drop and replaces dropped
//! spans with a single summary record.

use agentloom_core::{ContentBlock, Kind, TokenMeter};
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::store::HistoryStore;
use crate::summarizer::{summarize_conversation, truncate_tool_output};

/// Tool-output caps enforced on every compaction pass, independent of
/// whether compaction itself triggers.
#[derive(Debug, Clone, Copy)]
pub struct CompactionLimits {
    /// Maximum estimated tokens a tool_result may carry before truncation.
    pub max_tool_tokens: u64,
    /// Maximum raw byte size a tool_result may carry before truncation.
    pub max_stdout_bytes: usize,
    /// Maximum line count a tool_result may carry before truncation.
    pub max_lines: usize,
    /// The model's context window in tokens.
    pub window_tokens: u64,
    /// The compaction target in tokens (before the 95%-of-window cap).
    pub target_tokens: u64,
    /// Number of most recent turns always kept uncompacted.
    pub keep_last_turns: u64,
}

/// The result of a single `maybe_compact` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompactionOutcome {
    /// Compaction ran and dropped records.
    Compacted {
        /// Number of records removed from the store.
        removed: usize,
    },
    /// Compaction was not necessary (or had nothing to compact).
    Skipped,
}

/// Orchestrates tool-output capping and history compaction.
pub struct CompactionEngine {
    limits: CompactionLimits,
}

/// Counters the compaction engine bumps; the caller (Context Session) wires
/// these into its telemetry sink.
#[derive(Debug, Default, Clone, Copy)]
pub struct CompactionTelemetryDelta {
    /// Incremented once per summarizer invocation.
    pub summarizer_calls: u64,
    /// Incremented by the number of records removed.
    pub drops_count: u64,
    /// Incremented once per successful compaction pass.
    pub compact_events: u64,
}

impl CompactionEngine {
    /// Construct an engine with the given limits.
    pub fn new(limits: CompactionLimits) -> Self {
        Self { limits }
    }

    fn budget(&self) -> u64 {
        let threshold = (self.limits.window_tokens as f64 * 0.95) as u64;
        self.limits.target_tokens.min(threshold)
    }

    /// Enforce per-tool-result output caps, truncating oversized tool
    /// results and clearing the overlay on ones that now fit.
    pub fn enforce_tool_limits(&self, store: &mut HistoryStore, meter: &mut TokenMeter) {
        let candidates: Vec<(usize, String)> = store
            .raw_records()
            .iter()
            .enumerate()
            .filter(|(_, r)| r.kind == Kind::ToolResult)
            .filter_map(|(i, r)| {
                let text = r.text_fragments().join("\n");
                if text.is_empty() {
                    None
                } else {
                    Some((i, text))
                }
            })
            .collect();

        for (index, text) in candidates {
            let tokens = meter.estimate_text(&text);
            let line_count = text.lines().count().max(1);
            let oversized = tokens > self.limits.max_tool_tokens
                || text.len() > self.limits.max_stdout_bytes;
            if !oversized && line_count <= self.limits.max_lines {
                let _ = store.clear_compacted_content(index);
                continue;
            }
            let truncated = truncate_tool_output(&text, self.limits.max_lines);
            let truncated_tokens = meter.estimate_text(&truncated);
            let _ = store.set_compacted_content(
                index,
                vec![ContentBlock::Text { text: truncated }],
                truncated_tokens,
            );
        }
    }

    /// Run the compaction algorithm. Always enforces tool-output caps
    /// first; only drops/summarizes history when the budget is exceeded
    /// (or `force` is set).
    pub fn maybe_compact(
        &self,
        store: &mut HistoryStore,
        meter: &mut TokenMeter,
        force: bool,
        now: DateTime<Utc>,
    ) -> (CompactionOutcome, CompactionTelemetryDelta) {
        self.enforce_tool_limits(store, meter);

        let mut delta = CompactionTelemetryDelta::default();
        let budget = self.budget();
        let current_tokens = store.total_tokens();

        if !force && current_tokens <= budget {
            return (CompactionOutcome::Skipped, delta);
        }

        let current_turn = store.turn_counter();
        let cutoff = current_turn
            .saturating_sub(self.limits.keep_last_turns)
            .saturating_add(1)
            .max(1);

        let candidates: Vec<&agentloom_core::MessageRecord> = store
            .raw_records()
            .into_iter()
            .filter(|r| {
                matches!(r.kind, Kind::User | Kind::Assistant | Kind::ToolResult)
                    && r.turn_id < cutoff
            })
            .collect();

        if candidates.is_empty() {
            return (CompactionOutcome::Skipped, delta);
        }

        let summary_text = summarize_conversation(&candidates);
        delta.summarizer_calls += 1;
        let summary_tokens = meter.estimate_text(&summary_text);

        let before_count = store.raw_records().len();
        let summary_turn_id = cutoff.saturating_sub(1);
        store.upsert_summary(summary_text, summary_turn_id, summary_tokens, now);
        let removed = store.drop_turns_before(cutoff);
        store.reposition_summary(
            store
                .raw_records()
                .iter()
                .filter(|r| r.kind == Kind::System)
                .count(),
        );

        let after_count = store.raw_records().len();
        debug!(removed, before_count, after_count, "compaction dropped records");

        delta.drops_count += removed as u64;
        delta.compact_events += 1;
        (CompactionOutcome::Compacted { removed }, delta)
    }

    /// Report the current token usage without mutating anything.
    pub fn dry_run_report(&self, store: &HistoryStore) -> u64 {
        store.total_tokens()
    }
}
