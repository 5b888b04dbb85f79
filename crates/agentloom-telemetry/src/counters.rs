//! Named run counters and the append-only tool-event ledger (C13).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use agentloom_core::ToolExecutionEvent;

/// The fixed set of named counters a run tracks.
#[derive(Debug, Default)]
pub struct Counters {
    /// Cumulative tokens reported across packed prompts.
    pub tokens_used: AtomicU64,
    /// Number of compaction passes that actually removed records.
    pub compact_events: AtomicU64,
    /// Cumulative records dropped by compaction.
    pub drops_count: AtomicU64,
    /// Number of times the rule-based summarizer ran.
    pub summarizer_calls: AtomicU64,
    /// Current count of active pins.
    pub pins_size: AtomicU64,
    /// Number of MCP tool fetches (list_tools + call_tool combined).
    pub mcp_fetches: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> [(&'static str, u64); 6] {
        [
            ("tokens_used", self.tokens_used.load(Ordering::Relaxed)),
            ("compact_events", self.compact_events.load(Ordering::Relaxed)),
            ("drops_count", self.drops_count.load(Ordering::Relaxed)),
            ("summarizer_calls", self.summarizer_calls.load(Ordering::Relaxed)),
            ("pins_size", self.pins_size.load(Ordering::Relaxed)),
            ("mcp_fetches", self.mcp_fetches.load(Ordering::Relaxed)),
        ]
    }
}

/// Per-tool aggregate, returned by [`Telemetry::tool_stats`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToolStats {
    /// Total calls recorded for this tool.
    pub calls: u64,
    /// Calls that recorded `success=false`.
    pub errors: u64,
    /// `1.0 - (errors / calls)`, or `1.0` when there were no calls.
    pub success_rate: f64,
}

/// The run's telemetry: named counters plus every tool call recorded
/// so far. Counter updates are idempotent with respect to ordering
/// (each call bumps by a fixed delta); reads are best-effort snapshots
/// taken without blocking writers.
#[derive(Default)]
pub struct Telemetry {
    /// The named counters.
    pub counters: Counters,
    events: Mutex<Vec<ToolExecutionEvent>>,
}

impl Telemetry {
    /// An empty telemetry ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one tool event. Never fails; telemetry is best-effort and
    /// must not block the scheduler on a poisoned lock.
    pub fn record_tool_event(&self, event: ToolExecutionEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }

    /// A snapshot of every recorded event, in recording order.
    pub fn events(&self) -> Vec<ToolExecutionEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Aggregate stats for one tool name.
    pub fn tool_stats(&self, name: &str) -> ToolStats {
        let events = self.events();
        let matching: Vec<&ToolExecutionEvent> =
            events.iter().filter(|e| e.tool_name == name).collect();
        let calls = matching.len() as u64;
        let errors = matching.iter().filter(|e| !e.success).count() as u64;
        let success_rate = if calls == 0 {
            1.0
        } else {
            1.0 - (errors as f64 / calls as f64)
        };
        ToolStats {
            calls,
            errors,
            success_rate,
        }
    }

    /// Render the counters and event ledger as a single JSON document.
    pub fn export_otel(&self) -> serde_json::Value {
        let counters: serde_json::Map<String, serde_json::Value> = self
            .counters
            .snapshot()
            .into_iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::from(v)))
            .collect();
        serde_json::json!({
            "counters": counters,
            "events": self.events(),
        })
    }
}
