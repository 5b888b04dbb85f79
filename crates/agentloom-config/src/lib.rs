//! Agentloom Config - Settings (C17): a single-file TOML configuration
//! tree mirroring the runtime's namespaces, with dotted-path overrides
//! for `/config set`.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

mod error;
mod settings;
mod types;

pub use error::{SettingsError, SettingsResult};
pub use types::{
    CompactionSettings, ExecutionPolicySettings, McpServerDefinition, McpSettings, ModelSettings,
    PrivacySettings, RunnerSettings, Settings, TelemetrySettings, ToolLimitSettings,
};
