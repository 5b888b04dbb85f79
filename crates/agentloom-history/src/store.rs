//! The ordered message log (C2).

use std::collections::HashSet;

use agentloom_core::{ContentBlock, Kind, MessageRecord, Role};
use chrono::{DateTime, Utc};

use crate::error::{HistoryError, HistoryResult};

/// Ordered, append-mostly log of message records.
///
/// Storage is kept in registration order; iteration order (system records
/// first, then the summary, then everything else in registration order) is
/// computed on read rather than maintained physically, so there is no
/// separate "reposition" bookkeeping to keep in sync with drops.
#[derive(Debug, Default)]
pub struct HistoryStore {
    records: Vec<MessageRecord>,
    turn_counter: u64,
    tool_hashes: HashSet<String>,
}

impl HistoryStore {
    /// Construct an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current turn counter (the turn id a new user message would get).
    pub fn turn_counter(&self) -> u64 {
        self.turn_counter
    }

    /// Append a system record. Always carries `turn_id = 0`.
    pub fn register_system(&mut self, text: impl Into<String>, tokens: u64, now: DateTime<Utc>) {
        self.records.push(MessageRecord::new(
            Role::System,
            Kind::System,
            vec![ContentBlock::Text { text: text.into() }],
            0,
            tokens,
            now,
        ));
    }

    /// Append a user message, advancing the turn counter.
    pub fn register_user(&mut self, text: impl Into<String>, tokens: u64, now: DateTime<Utc>) -> u64 {
        self.turn_counter += 1;
        self.records.push(MessageRecord::new(
            Role::User,
            Kind::User,
            vec![ContentBlock::Text { text: text.into() }],
            self.turn_counter,
            tokens,
            now,
        ));
        self.turn_counter
    }

    /// Append an assistant record carrying the given content blocks, at the
    /// current turn.
    pub fn register_assistant(&mut self, blocks: Vec<ContentBlock>, tokens: u64, now: DateTime<Utc>) {
        self.records.push(MessageRecord::new(
            Role::Assistant,
            Kind::Assistant,
            blocks,
            self.turn_counter,
            tokens,
            now,
        ));
    }

    /// Append a tool-result record (role `User`, kind `ToolResult`) at the
    /// current turn, and record its content hash for dedup.
    pub fn register_tool_results(
        &mut self,
        blocks: Vec<ContentBlock>,
        tokens: u64,
        now: DateTime<Utc>,
    ) {
        let mut record = MessageRecord::new(
            Role::User,
            Kind::ToolResult,
            blocks,
            self.turn_counter,
            tokens,
            now,
        );
        record.set_content_hash();
        if let Some(hash) = record.metadata.tool_hash.clone() {
            self.tool_hashes.insert(hash);
        }
        self.records.push(record);
    }

    /// Insert or update the single summary record.
    pub fn upsert_summary(&mut self, text: impl Into<String>, turn_id: u64, tokens: u64, now: DateTime<Utc>) {
        let content = vec![ContentBlock::Text { text: text.into() }];
        if let Some(existing) = self.records.iter_mut().find(|r| r.kind == Kind::Summary) {
            existing.content = content;
            existing.turn_id = turn_id;
            existing.token_count = tokens;
            existing.clear_compacted();
            existing.metadata.timestamp = now;
            return;
        }
        self.records.push(MessageRecord::new(
            Role::User,
            Kind::Summary,
            content,
            turn_id,
            tokens,
            now,
        ));
    }

    /// Drop every non-system record with `turn_id < cutoff`, except the
    /// summary record. Returns the number of records removed.
    pub fn drop_turns_before(&mut self, cutoff: u64) -> usize {
        let before = self.records.len();
        self.records
            .retain(|r| r.kind == Kind::System || r.kind == Kind::Summary || r.turn_id >= cutoff);
        before - self.records.len()
    }

    /// Re-anchor the summary record immediately after system records.
    ///
    /// Iteration order is computed dynamically by [`HistoryStore::ordered`],
    /// so this call is a no-op kept for API parity with the compaction
    /// algorithm's step sequence.
    pub fn reposition_summary(&mut self, _system_count: usize) {}

    /// Discard every non-system record at the current turn counter and
    /// decrement it. Used when an LLM call fails and nothing of value was
    /// appended.
    pub fn rollback_current_turn(&mut self) {
        let turn = self.turn_counter;
        self.records
            .retain(|r| r.kind == Kind::System || r.turn_id != turn);
        self.turn_counter = self.turn_counter.saturating_sub(1);
    }

    /// Install a compacted overlay on the record at `index` (in iteration
    /// order). Errors if the index is out of range.
    pub fn set_compacted_content(
        &mut self,
        index: usize,
        content: Vec<ContentBlock>,
        tokens: u64,
    ) -> HistoryResult<()> {
        let order = self.ordered_indices();
        let real_index = *order
            .get(index)
            .ok_or(HistoryError::IndexOutOfRange(index))?;
        self.records[real_index].set_compacted(content, tokens);
        Ok(())
    }

    /// Clear a compacted overlay on the record at `index` (in iteration
    /// order).
    pub fn clear_compacted_content(&mut self, index: usize) -> HistoryResult<()> {
        let order = self.ordered_indices();
        let real_index = *order
            .get(index)
            .ok_or(HistoryError::IndexOutOfRange(index))?;
        self.records[real_index].clear_compacted();
        Ok(())
    }

    /// Whether a tool-result content hash has already been observed.
    pub fn has_tool_hash(&self, hash: &str) -> bool {
        self.tool_hashes.contains(hash)
    }

    /// Record a tool-result content hash as observed.
    pub fn register_tool_hash(&mut self, hash: impl Into<String>) {
        self.tool_hashes.insert(hash.into());
    }

    /// Records in iteration order: system records first (registration
    /// order), then the summary record if present, then the rest in
    /// registration order.
    pub fn raw_records(&self) -> Vec<&MessageRecord> {
        self.ordered_indices()
            .into_iter()
            .map(|i| &self.records[i])
            .collect()
    }

    /// Wire-ready `(role, effective_content)` pairs in iteration order.
    pub fn messages(&self) -> Vec<(Role, Vec<ContentBlock>)> {
        self.raw_records()
            .into_iter()
            .map(|r| (r.role, r.effective_content().to_vec()))
            .collect()
    }

    /// Sum of effective tokens across all records.
    pub fn total_tokens(&self) -> u64 {
        self.records.iter().map(|r| r.effective_tokens()).sum()
    }

    fn ordered_indices(&self) -> Vec<usize> {
        let mut system = Vec::new();
        let mut summary = None;
        let mut rest = Vec::new();
        for (i, r) in self.records.iter().enumerate() {
            match r.kind {
                Kind::System => system.push(i),
                Kind::Summary => summary = Some(i),
                _ => rest.push(i),
            }
        }
        let mut order = system;
        if let Some(s) = summary {
            order.push(s);
        }
        order.extend(rest);
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn user_register_advances_turn_counter() {
        let mut store = HistoryStore::new();
        assert_eq!(store.register_user("hi", 1, now()), 1);
        assert_eq!(store.register_user("again", 1, now()), 2);
    }

    #[test]
    fn system_records_always_first() {
        let mut store = HistoryStore::new();
        store.register_user("hi", 1, now());
        store.register_system("rules", 1, now());
        let ordered = store.raw_records();
        assert_eq!(ordered[0].kind, Kind::System);
    }

    #[test]
    fn summary_sits_right_after_system() {
        let mut store = HistoryStore::new();
        store.register_system("sys", 1, now());
        store.register_user("a", 1, now());
        store.upsert_summary("summary text", 0, 3, now());
        let ordered = store.raw_records();
        assert_eq!(ordered[0].kind, Kind::System);
        assert_eq!(ordered[1].kind, Kind::Summary);
    }

    #[test]
    fn upsert_summary_is_idempotent_on_count() {
        let mut store = HistoryStore::new();
        store.upsert_summary("s1", 0, 1, now());
        store.upsert_summary("s2", 0, 1, now());
        let summaries = store
            .raw_records()
            .into_iter()
            .filter(|r| r.kind == Kind::Summary)
            .count();
        assert_eq!(summaries, 1);
    }

    #[test]
    fn drop_turns_before_respects_cutoff() {
        let mut store = HistoryStore::new();
        store.register_system("sys", 1, now());
        store.register_user("turn1", 1, now());
        store.register_user("turn2", 1, now());
        let removed = store.drop_turns_before(2);
        assert_eq!(removed, 1);
        assert!(store
            .raw_records()
            .iter()
            .all(|r| r.kind == Kind::System || r.turn_id >= 2));
    }

    #[test]
    fn rollback_discards_current_turn_only() {
        let mut store = HistoryStore::new();
        store.register_user("turn1", 1, now());
        store.register_assistant(vec![ContentBlock::Text { text: "ok".into() }], 1, now());
        store.register_user("turn2", 1, now());
        store.rollback_current_turn();
        assert_eq!(store.turn_counter(), 1);
        assert!(store.raw_records().iter().all(|r| r.turn_id != 2));
    }

    #[test]
    fn tool_hash_dedup_roundtrip() {
        let mut store = HistoryStore::new();
        assert!(!store.has_tool_hash("abc"));
        store.register_tool_hash("abc");
        assert!(store.has_tool_hash("abc"));
    }
}
