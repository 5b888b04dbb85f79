//! Tracing-subscriber setup.

use tracing_subscriber::EnvFilter;

use crate::error::{TelemetryError, TelemetryResult};

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Multi-line, human-readable.
    #[default]
    Pretty,
    /// Single-line, human-readable.
    Compact,
    /// One JSON object per line, for machine ingestion.
    Json,
}

/// Where log lines are written.
#[derive(Debug, Clone, Default)]
pub enum LogTarget {
    /// Standard error (the default).
    #[default]
    Stderr,
    /// Standard output.
    Stdout,
}

/// Logging configuration: a base level, an output format, a target,
/// and additional per-module directives layered on top of the base
/// level.
#[derive(Debug, Clone)]
pub struct LogConfig {
    base_level: String,
    format: LogFormat,
    target: LogTarget,
    directives: Vec<String>,
}

impl LogConfig {
    /// Start a config at `base_level` (e.g. `"info"`, `"debug"`).
    pub fn new(base_level: impl Into<String>) -> Self {
        Self {
            base_level: base_level.into(),
            format: LogFormat::default(),
            target: LogTarget::default(),
            directives: Vec::new(),
        }
    }

    /// Set the output format.
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the output target.
    pub fn with_target(mut self, target: LogTarget) -> Self {
        self.target = target;
        self
    }

    /// Add a per-module directive (e.g. `"agentloom_mcp=trace"`) on top
    /// of the base level.
    pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    fn filter(&self) -> TelemetryResult<EnvFilter> {
        let mut spec = self.base_level.clone();
        for directive in &self.directives {
            spec.push(',');
            spec.push_str(directive);
        }
        EnvFilter::try_new(spec).map_err(|e| TelemetryError::ConfigError(e.to_string()))
    }
}

/// Install a global tracing subscriber built from `config`. Returns an
/// error if a subscriber is already installed or the directive string
/// doesn't parse.
pub fn setup_logging(config: &LogConfig) -> TelemetryResult<()> {
    let filter = config.filter()?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let result = match (config.format, &config.target) {
        (LogFormat::Json, LogTarget::Stderr) => builder.json().try_init(),
        (LogFormat::Json, LogTarget::Stdout) => builder.json().with_writer(std::io::stdout).try_init(),
        (LogFormat::Compact, LogTarget::Stderr) => builder.compact().try_init(),
        (LogFormat::Compact, LogTarget::Stdout) => {
            builder.compact().with_writer(std::io::stdout).try_init()
        }
        (LogFormat::Pretty, LogTarget::Stderr) => builder.pretty().try_init(),
        (LogFormat::Pretty, LogTarget::Stdout) => {
            builder.pretty().with_writer(std::io::stdout).try_init()
        }
    };

    result.map_err(|e| TelemetryError::InitError(e.to_string()))
}

/// Install a subscriber at `info` level with the default format and
/// target, honoring `RUST_LOG` if set.
pub fn setup_default_logging() -> TelemetryResult<()> {
    setup_logging(&LogConfig::new("info"))
}
