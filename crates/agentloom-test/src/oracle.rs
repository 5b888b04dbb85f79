//! A scripted [`Oracle`] for driving the scheduler deterministically in
//! tests, without a real LLM backend.

use std::collections::VecDeque;
use std::sync::Arc;

use agentloom_runtime::{Oracle, OracleError, OracleRequest, OracleResponse};
use async_trait::async_trait;
use tokio::sync::Mutex;

/// Replays a queued sequence of `complete` outcomes in order. Every
/// request sent to it is also recorded, so assertions can inspect what
/// the scheduler actually packed.
pub struct FakeOracle {
    outcomes: Mutex<VecDeque<Result<OracleResponse, OracleError>>>,
    requests: Mutex<Vec<OracleRequest>>,
}

impl FakeOracle {
    /// An oracle with no queued outcomes; calling it errors.
    #[must_use]
    pub fn new() -> Self {
        Self {
            outcomes: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful response.
    #[must_use]
    pub fn with_response(self, response: OracleResponse) -> Self {
        self.outcomes
            .try_lock()
            .expect("fixture not yet shared")
            .push_back(Ok(response));
        self
    }

    /// Queue a failure.
    #[must_use]
    pub fn with_error(self, error: OracleError) -> Self {
        self.outcomes
            .try_lock()
            .expect("fixture not yet shared")
            .push_back(Err(error));
        self
    }

    /// Wrap in an `Arc`, ready to hand to a [`agentloom_runtime::TurnScheduler`].
    #[must_use]
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Every request passed to `complete`, in call order.
    pub async fn requests(&self) -> Vec<OracleRequest> {
        self.requests.lock().await.clone()
    }

    /// How many times `complete` has been called.
    pub async fn call_count(&self) -> usize {
        self.requests.lock().await.len()
    }
}

impl Default for FakeOracle {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Oracle for FakeOracle {
    async fn complete(&self, request: OracleRequest) -> Result<OracleResponse, OracleError> {
        self.requests.lock().await.push(request);
        self.outcomes
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(OracleError::Other("fake oracle exhausted".to_string())))
    }
}
