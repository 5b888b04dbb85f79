//! Parallel arbitration for one assistal turn's tool calls (C9).
//!
//! Calls are grouped into maximal runs of consecutive parallel-safe
//! calls; each run executes under a shared read guard (true
//! concurrency within the run), and any non-parallel-safe call is its
//! own singleton run under a write guard. Runs execute strictly in
//! emission order, so a write run only starts once every preceding read
//! run has drained, and a read run that follows a write run only starts
//! once that write completes. Results are returned in emission order
//! regardless of completion order.

use std::sync::Arc;

use agentloom_diff::TurnDiffTracker;
use tokio::sync::{Mutex, RwLock};

use crate::payload::ToolCall;
use crate::registry::ToolRegistry;
use crate::router::{DispatchedCall, ToolRouter};

/// Wraps a [`ToolRouter`] with the read/write arbitration the parallel
/// dispatch guarantee relies on.
pub struct ToolCallRuntime {
    router: Arc<ToolRouter>,
    registry: Arc<ToolRegistry>,
    lock: Arc<RwLock<()>>,
}

impl ToolCallRuntime {
    /// Build a runtime dispatching through `router`, consulting
    /// `registry` to classify each call as parallel-safe.
    pub fn new(router: Arc<ToolRouter>, registry: Arc<ToolRegistry>) -> Self {
        Self {
            router,
            registry,
            lock: Arc::new(RwLock::new(())),
        }
    }

    /// MCP calls (names containing `/`) and any name with no registered
    /// spec are conservatively treated as non-parallel-safe.
    fn is_parallel_safe(&self, call: &ToolCall) -> bool {
        if call.tool_name.contains('/') {
            return false;
        }
        self.registry
            .spec(&call.tool_name)
            .map(|s| s.is_parallel_safe())
            .unwrap_or(false)
    }

    /// Dispatch every call emitted in one assistant turn, preserving
    /// emission order in the returned `tool_result` blocks.
    pub async fn dispatch_turn(
        &self,
        turn_id: u64,
        calls: Vec<ToolCall>,
        tracker: Arc<Mutex<TurnDiffTracker>>,
    ) -> Vec<DispatchedCall> {
        let indexed: Vec<(usize, ToolCall)> = calls.into_iter().enumerate().collect();
        let mut results: Vec<Option<DispatchedCall>> = std::iter::repeat_with(|| None)
            .take(indexed.len())
            .collect();

        let mut i = 0;
        while i < indexed.len() {
            if self.is_parallel_safe(&indexed[i].1) {
                let mut batch = Vec::new();
                while i < indexed.len() && self.is_parallel_safe(&indexed[i].1) {
                    batch.push(indexed[i].clone());
                    i += 1;
                }
                let _guard = self.lock.read().await;
                let handles: Vec<_> = batch
                    .into_iter()
                    .map(|(idx, call)| {
                        let router = Arc::clone(&self.router);
                        let tracker = Arc::clone(&tracker);
                        tokio::spawn(async move {
                            (idx, router.dispatch_tool_call(turn_id, call, tracker).await)
                        })
                    })
                    .collect();
                for handle in handles {
                    let (idx, block) = handle.await.expect("tool call task panicked");
                    results[idx] = Some(block);
                }
            } else {
                let (idx, call) = indexed[i].clone();
                let _guard = self.lock.write().await;
                let block = self
                    .router
                    .dispatch_tool_call(turn_id, call, Arc::clone(&tracker))
                    .await;
                results[idx] = Some(block);
                i += 1;
            }
        }

        results.into_iter().map(|r| r.expect("every call answered")).collect()
    }
}
