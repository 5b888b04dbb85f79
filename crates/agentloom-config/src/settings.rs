//! Loading a [`Settings`] tree and applying `/config set`-style
//! dotted-path overrides to it.

use std::path::Path;

use agentloom_policy::{ApprovalPolicy, SandboxPolicy};

use crate::error::{SettingsError, SettingsResult};
use crate::types::Settings;

impl Settings {
    /// Load settings from `path`, or return defaults when `path` is
    /// `None`. Unlike a multi-layer search path, this reads exactly one
    /// file — the single `--config` flag this crate's scope covers.
    pub fn load(path: Option<&Path>) -> SettingsResult<Settings> {
        let Some(path) = path else {
            return Ok(Settings::default());
        };
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply one `group.field=value` override, type-coercing `value`
    /// against the current field's type.
    pub fn update_with(&mut self, dotted: &str, value: &str) -> SettingsResult<()> {
        let (group, field) = dotted
            .split_once('.')
            .ok_or_else(|| SettingsError::MalformedOverride(dotted.to_string()))?;

        macro_rules! set {
            ($target:expr) => {
                value
                    .parse()
                    .map_err(|_| SettingsError::InvalidValue {
                        group: group.to_string(),
                        field: field.to_string(),
                        value: value.to_string(),
                    })
                    .map(|parsed| $target = parsed)?
            };
        }
        macro_rules! unknown_field {
            () => {
                return Err(SettingsError::UnknownField {
                    group: group.to_string(),
                    field: field.to_string(),
                })
            };
        }

        match group {
            "model" => match field {
                "name" => self.model.name = value.to_string(),
                "context_tokens" => set!(self.model.context_tokens),
                "guardrail_tokens" => set!(self.model.guardrail_tokens),
                _ => unknown_field!(),
            },
            "compaction" => match field {
                "auto" => set!(self.compaction.auto),
                "keep_last_turns" => set!(self.compaction.keep_last_turns),
                "target_tokens" => set!(self.compaction.target_tokens),
                "pin_budget_tokens" => set!(self.compaction.pin_budget_tokens),
                _ => unknown_field!(),
            },
            "tools" => match field {
                "max_tool_tokens" => set!(self.tools.max_tool_tokens),
                "max_stdout_bytes" => set!(self.tools.max_stdout_bytes),
                "max_lines" => set!(self.tools.max_lines),
                _ => unknown_field!(),
            },
            "mcp" => match field {
                "enable" => set!(self.mcp.enable),
                _ => unknown_field!(),
            },
            "privacy" => match field {
                "no_external_http" => set!(self.privacy.no_external_http),
                "redact_pii" => set!(self.privacy.redact_pii),
                _ => unknown_field!(),
            },
            "execution" => match field {
                "sandbox" => self.execution.sandbox = parse_sandbox(group, field, value)?,
                "approval" => self.execution.approval = parse_approval(group, field, value)?,
                "timeout_seconds" => {
                    let parsed: u64 =
                        value.parse().map_err(|_| SettingsError::InvalidValue {
                            group: group.to_string(),
                            field: field.to_string(),
                            value: value.to_string(),
                        })?;
                    self.execution.timeout_seconds = Some(parsed);
                }
                _ => unknown_field!(),
            },
            "telemetry" => match field {
                "enable_export" => set!(self.telemetry.enable_export),
                "service_name" => self.telemetry.service_name = value.to_string(),
                _ => unknown_field!(),
            },
            "runner" => match field {
                "max_turns" => set!(self.runner.max_turns),
                "exit_on_tool_error" => set!(self.runner.exit_on_tool_error),
                "dry_run" => set!(self.runner.dry_run),
                _ => unknown_field!(),
            },
            other => return Err(SettingsError::UnknownGroup(other.to_string())),
        }
        Ok(())
    }
}

fn parse_sandbox(group: &str, field: &str, value: &str) -> SettingsResult<SandboxPolicy> {
    match value {
        "none" => Ok(SandboxPolicy::None),
        "restricted" => Ok(SandboxPolicy::Restricted),
        "strict" => Ok(SandboxPolicy::Strict),
        _ => Err(SettingsError::InvalidValue {
            group: group.to_string(),
            field: field.to_string(),
            value: value.to_string(),
        }),
    }
}

fn parse_approval(group: &str, field: &str, value: &str) -> SettingsResult<ApprovalPolicy> {
    match value {
        "never" => Ok(ApprovalPolicy::Never),
        "on_request" => Ok(ApprovalPolicy::OnRequest),
        "on_write" => Ok(ApprovalPolicy::OnWrite),
        "always" => Ok(ApprovalPolicy::Always),
        _ => Err(SettingsError::InvalidValue {
            group: group.to_string(),
            field: field.to_string(),
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn load_with_no_path_returns_defaults() {
        let settings = Settings::load(None).unwrap();
        assert_eq!(settings.model.name, "claude-sonnet-4-5");
        assert_eq!(settings.runner.max_turns, 25);
    }

    #[test]
    fn load_merges_a_partial_file_over_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[compaction]\nkeep_last_turns = 9\n").unwrap();
        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.compaction.keep_last_turns, 9);
        assert_eq!(settings.compaction.target_tokens, 110_000);
    }

    #[test]
    fn load_rejects_malformed_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not valid toml [[[").unwrap();
        let err = Settings::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, SettingsError::Parse { .. }));
    }

    #[test]
    fn update_with_sets_a_nested_field() {
        let mut settings = Settings::default();
        settings.update_with("compaction.keep_last_turns", "10").unwrap();
        assert_eq!(settings.compaction.keep_last_turns, 10);
    }

    #[test]
    fn update_with_parses_enum_fields() {
        let mut settings = Settings::default();
        settings.update_with("execution.sandbox", "strict").unwrap();
        assert_eq!(settings.execution.sandbox, SandboxPolicy::Strict);
    }

    #[test]
    fn update_with_rejects_unknown_group() {
        let mut settings = Settings::default();
        let err = settings.update_with("bogus.field", "1").unwrap_err();
        assert!(matches!(err, SettingsError::UnknownGroup(_)));
    }

    #[test]
    fn update_with_rejects_unknown_field() {
        let mut settings = Settings::default();
        let err = settings.update_with("compaction.bogus", "1").unwrap_err();
        assert!(matches!(err, SettingsError::UnknownField { .. }));
    }

    #[test]
    fn update_with_rejects_malformed_dotted_path() {
        let mut settings = Settings::default();
        let err = settings.update_with("compaction", "1").unwrap_err();
        assert!(matches!(err, SettingsError::MalformedOverride(_)));
    }

    #[test]
    fn update_with_rejects_value_of_the_wrong_type() {
        let mut settings = Settings::default();
        let err = settings
            .update_with("compaction.keep_last_turns", "not-a-number")
            .unwrap_err();
        assert!(matches!(err, SettingsError::InvalidValue { .. }));
    }
}
