//! The environment-sourced `Oracle` wiring (C16 boundary) this binary
//! ships: enough to fail fast on missing credentials, but no actual HTTP
//! client. A real LLM backend is an external collaborator this crate
//! never wires in.

use agentloom_runtime::{Oracle, OracleError, OracleRequest, OracleResponse};
use async_trait::async_trait;

/// The env vars the headless runner reads to describe an oracle
/// backend, per the command-line surface.
#[derive(Debug, Clone)]
pub struct OracleEnv {
    /// `ANTHROPIC_API_KEY`, required.
    pub api_key: String,
    /// `ANTHROPIC_MODEL`, when set.
    pub model: Option<String>,
    /// `ANTHROPIC_MAX_TOKENS`, when set and parseable.
    pub max_tokens: Option<u32>,
}

/// Raised when the environment doesn't describe a usable oracle.
#[derive(Debug, thiserror::Error)]
pub enum OracleConfigError {
    /// `ANTHROPIC_API_KEY` was not set.
    #[error("ANTHROPIC_API_KEY is not set; refusing to run without an oracle credential")]
    MissingApiKey,
}

impl OracleEnv {
    /// Read the oracle environment, failing if the credential is absent.
    pub fn from_env() -> Result<Self, OracleConfigError> {
        let api_key =
            std::env::var("ANTHROPIC_API_KEY").map_err(|_| OracleConfigError::MissingApiKey)?;
        let model = std::env::var("ANTHROPIC_MODEL").ok();
        let max_tokens = std::env::var("ANTHROPIC_MAX_TOKENS")
            .ok()
            .and_then(|v| v.parse().ok());
        Ok(Self {
            api_key,
            model,
            max_tokens,
        })
    }
}

/// Validates the credential is present, then refuses every completion:
/// wiring a real HTTP oracle is out of scope for this binary, so any
/// run that actually needs a model response fails with a clear error
/// rather than silently falling back to a scripted fake.
pub struct UnwiredOracle {
    env: OracleEnv,
}

impl UnwiredOracle {
    /// Build from an already-validated environment.
    pub fn new(env: OracleEnv) -> Self {
        Self { env }
    }
}

#[async_trait]
impl Oracle for UnwiredOracle {
    async fn complete(&self, _request: OracleRequest) -> Result<OracleResponse, OracleError> {
        let _ = &self.env.api_key;
        Err(OracleError::Other(
            "no HTTP oracle is wired into this binary; only the Oracle trait boundary is \
             implemented here"
                .to_string(),
        ))
    }
}
