//! Tool specs (C8).

use serde::{Deserialize, Serialize};

/// A published tool spec: name, description, and a JSON-Schema-shaped
/// input schema (`type:"object"`, `additionalProperties:false`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    /// The tool's registered name.
    pub name: String,
    /// A human-readable description shown to the LLM.
    pub description: String,
    /// The JSON-Schema object describing accepted arguments.
    pub input_schema: serde_json::Value,
}

impl ToolSpec {
    /// Construct a spec with a strict object schema: no additional
    /// properties, the given required property names.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        properties: serde_json::Value,
        required: Vec<&str>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: serde_json::json!({
                "type": "object",
                "additionalProperties": false,
                "properties": properties,
                "required": required,
            }),
        }
    }
}
