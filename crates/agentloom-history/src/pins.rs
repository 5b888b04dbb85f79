//! Pin manager (C3): persistent text blocks that bypass compaction.

use agentloom_core::Pin;
use chrono::{DateTime, Utc};

use crate::error::HistoryResult;

/// Tracks pins and their TTL expiry, rendering them bounded by a token
/// budget.
#[derive(Debug, Default)]
pub struct PinManager {
    pins: Vec<Pin>,
    next_id: u64,
}

impl PinManager {
    /// Construct an empty pin manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pin, returning its freshly allocated id.
    pub fn add_pin(
        &mut self,
        text: impl Into<String>,
        ttl_seconds: Option<i64>,
        now: DateTime<Utc>,
    ) -> HistoryResult<u64> {
        self.next_id += 1;
        let id = self.next_id;
        let pin = Pin::new(id, text, now, ttl_seconds)?;
        self.pins.push(pin);
        Ok(id)
    }

    /// Remove a pin outright, regardless of expiry. Returns `false` if the
    /// id was unknown.
    pub fn remove_pin(&mut self, id: u64) -> bool {
        let before = self.pins.len();
        self.pins.retain(|p| p.id != id);
        self.pins.len() != before
    }

    /// Purge expired pins and return the remaining, live pins.
    pub fn active_pins(&mut self, now: DateTime<Utc>) -> &[Pin] {
        self.pins.retain(|p| !p.is_expired(now));
        &self.pins
    }

    /// Render active pins as a list of `(id, text)` bounded by
    /// `pin_budget_tokens`, using `estimate` to cost each pin's text.
    ///
    /// Once the rolling token sum would exceed the budget, rendering stops
    /// and a single `"additional pins omitted"` marker is appended instead
    /// of partially rendering the next pin.
    pub fn render_bounded(
        &mut self,
        now: DateTime<Utc>,
        budget_tokens: u64,
        mut estimate: impl FnMut(&str) -> u64,
    ) -> Vec<String> {
        let pins = self.active_pins(now).to_vec();
        let mut rendered = Vec::new();
        let mut used = 0u64;
        let mut omitted = false;
        for pin in &pins {
            let cost = estimate(&pin.text);
            if used + cost > budget_tokens {
                omitted = true;
                break;
            }
            used += cost;
            rendered.push(pin.text.clone());
        }
        if omitted {
            rendered.push("[additional pins omitted]".to_string());
        }
        rendered
    }
}
