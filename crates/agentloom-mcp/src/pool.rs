//! The per-server client pool (C12).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::client::{McpClient, McpClientFactory};
use crate::error::McpResult;

struct Entry {
    client: Arc<dyn McpClient>,
    last_used: Instant,
}

/// A factory-backed pool of MCP clients, keyed by server name.
///
/// Each server gets its own async mutex so that concurrent
/// `get_client` calls for the same server single-flight through one
/// factory call, while calls for different servers proceed
/// independently. `shutdown` takes a pool-wide lock so it can drain
/// every entry without racing a fresh `get_client`.
pub struct McpClientPool {
    factory: Arc<dyn McpClientFactory>,
    ttl: Duration,
    slots: Mutex<HashMap<String, Arc<Mutex<Option<Entry>>>>>,
}

impl McpClientPool {
    /// Build a pool that creates entries via `factory`, evicting any
    /// entry idle for longer than `ttl`.
    pub fn new(factory: Arc<dyn McpClientFactory>, ttl: Duration) -> Self {
        Self {
            factory,
            ttl,
            slots: Mutex::new(HashMap::new()),
        }
    }

    async fn slot_for(&self, server: &str) -> Arc<Mutex<Option<Entry>>> {
        let mut slots = self.slots.lock().await;
        Arc::clone(
            slots
                .entry(server.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(None))),
        )
    }

    /// Obtain a live client for `server`, creating or replacing the
    /// pooled entry as needed. Concurrent calls for the same server
    /// issue only one factory call.
    pub async fn get_client(&self, server: &str) -> McpResult<Arc<dyn McpClient>> {
        let slot = self.slot_for(server).await;
        let mut guard = slot.lock().await;

        if let Some(entry) = guard.as_ref() {
            let expired = entry.last_used.elapsed() >= self.ttl;
            let healthy = entry.client.is_healthy().await;
            if !expired && healthy {
                let client = Arc::clone(&entry.client);
                guard.as_mut().expect("entry present").last_used = Instant::now();
                return Ok(client);
            }
            debug!(server, expired, healthy, "evicting mcp client");
            entry.client.aclose().await;
        }

        let client = self.factory.connect(server).await?;
        let handle = Arc::clone(&client);
        *guard = Some(Entry {
            client,
            last_used: Instant::now(),
        });
        Ok(handle)
    }

    /// Explicitly invalidate `server`'s entry, e.g. after the caller
    /// observed a failed call that the health check itself wouldn't
    /// catch. The next `get_client` reconnects.
    pub async fn mark_unhealthy(&self, server: &str) {
        let slot = self.slot_for(server).await;
        let mut guard = slot.lock().await;
        if let Some(entry) = guard.take() {
            entry.client.aclose().await;
        }
    }

    /// Close every pooled client. Draining happens under each server's
    /// own lock, taken one at a time, so a `get_client` racing a
    /// shutdown either completes before the drain reaches it or finds
    /// no entry afterward.
    pub async fn shutdown(&self) {
        let slots = self.slots.lock().await;
        for (server, slot) in slots.iter() {
            let mut guard = slot.lock().await;
            if let Some(entry) = guard.take() {
                warn!(server, "closing mcp client on shutdown");
                entry.client.aclose().await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{McpClientFactory, ToolCallResult, ToolDefinition};
    use crate::error::McpError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingFactory {
        connects: AtomicUsize,
    }

    struct FakeClient {
        healthy: std::sync::atomic::AtomicBool,
    }

    #[async_trait]
    impl McpClient for FakeClient {
        async fn list_tools(&self) -> McpResult<Vec<ToolDefinition>> {
            Ok(vec![])
        }
        async fn call_tool(&self, _name: &str, _arguments: serde_json::Value) -> McpResult<ToolCallResult> {
            Ok(ToolCallResult {
                content: "ok".into(),
                is_error: false,
            })
        }
        async fn is_healthy(&self) -> bool {
            self.healthy.load(Ordering::SeqCst)
        }
        async fn aclose(&self) {}
    }

    #[async_trait]
    impl McpClientFactory for CountingFactory {
        async fn connect(&self, server: &str) -> McpResult<Arc<dyn McpClient>> {
            if server == "broken" {
                return Err(McpError::ConnectFailed {
                    server: server.to_string(),
                    reason: "simulated".into(),
                });
            }
            self.connects.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(FakeClient {
                healthy: std::sync::atomic::AtomicBool::new(true),
            }))
        }
    }

    #[tokio::test]
    async fn repeated_get_client_reuses_entry() {
        let factory = Arc::new(CountingFactory {
            connects: AtomicUsize::new(0),
        });
        let pool = McpClientPool::new(factory.clone(), Duration::from_secs(60));
        pool.get_client("filesystem").await.unwrap();
        pool.get_client("filesystem").await.unwrap();
        assert_eq!(factory.connects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expired_entry_is_recreated() {
        let factory = Arc::new(CountingFactory {
            connects: AtomicUsize::new(0),
        });
        let pool = McpClientPool::new(factory.clone(), Duration::from_millis(1));
        pool.get_client("filesystem").await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        pool.get_client("filesystem").await.unwrap();
        assert_eq!(factory.connects.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn connect_failure_propagates() {
        let factory = Arc::new(CountingFactory {
            connects: AtomicUsize::new(0),
        });
        let pool = McpClientPool::new(factory, Duration::from_secs(60));
        assert!(pool.get_client("broken").await.is_err());
    }

    #[tokio::test]
    async fn mark_unhealthy_forces_reconnect() {
        let factory = Arc::new(CountingFactory {
            connects: AtomicUsize::new(0),
        });
        let pool = McpClientPool::new(factory.clone(), Duration::from_secs(60));
        pool.get_client("filesystem").await.unwrap();
        pool.mark_unhealthy("filesystem").await;
        pool.get_client("filesystem").await.unwrap();
        assert_eq!(factory.connects.load(Ordering::SeqCst), 2);
    }
}
