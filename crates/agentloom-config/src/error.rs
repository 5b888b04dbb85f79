//! Errors raised while loading or overriding settings.

use std::path::PathBuf;

use thiserror::Error;

/// Failures from [`crate::Settings::load`] or
/// [`crate::Settings::update_with`].
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The config file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The path that failed to open.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The config file's TOML was malformed.
    #[error("failed to parse {path}: {source}")]
    Parse {
        /// The path that failed to parse.
        path: PathBuf,
        /// The underlying parse error.
        #[source]
        source: toml::de::Error,
    },
    /// An override was not of the form `group.field=value`.
    #[error("override must be of the form group.field (got '{0}')")]
    MalformedOverride(String),
    /// An override named a group this settings tree doesn't have.
    #[error("unknown settings group '{0}'")]
    UnknownGroup(String),
    /// An override named a field its group doesn't have.
    #[error("unknown field '{field}' for settings group '{group}'")]
    UnknownField {
        /// The group the field was looked up in.
        group: String,
        /// The field name that wasn't found.
        field: String,
    },
    /// An override's value failed to parse as the field's type.
    #[error("invalid value '{value}' for {group}.{field}")]
    InvalidValue {
        /// The group the field belongs to.
        group: String,
        /// The field whose value failed to parse.
        field: String,
        /// The raw string that failed to parse.
        value: String,
    },
}

/// Convenience alias for fallible settings operations.
pub type SettingsResult<T> = Result<T, SettingsError>;
