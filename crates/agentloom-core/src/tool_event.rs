//! Tool execution events recorded by telemetry.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One record of a single tool invocation, kept append-only by telemetry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolExecutionEvent {
    /// The turn this call happened in.
    pub turn: u64,
    /// The tool's registered name.
    pub tool_name: String,
    /// The oracle-assigned call id.
    pub call_id: String,
    /// Wall-clock duration of the call.
    #[serde(with = "duration_millis")]
    pub duration: Duration,
    /// Whether the call succeeded.
    pub success: bool,
    /// Size in bytes of the serialized input.
    pub input_size: usize,
    /// Size in bytes of the rendered output.
    pub output_size: usize,
    /// The error taxonomy tag, when the call failed.
    pub error: Option<String>,
    /// Whether the output was truncated to satisfy tool-output caps.
    pub truncated: bool,
    /// Filesystem paths this call touched or attempted to touch.
    pub paths: Vec<String>,
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u128(d.as_millis())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(d)?;
        Ok(Duration::from_millis(millis))
    }
}
