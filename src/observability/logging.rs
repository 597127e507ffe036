//! Structured logging configuration.

use crate::config::LoggingSettings;
use std::path::PathBuf;
use std::str::FromStr;

/// Environment variable selecting the log format.
pub const LOG_FORMAT_ENV: &str = "CALLFLOW_LOG_FORMAT";
/// Environment variable selecting the log level or filter directive.
pub const LOG_LEVEL_ENV: &str = "CALLFLOW_LOG_LEVEL";
/// Environment variable naming a log file.
pub const LOG_FILE_ENV: &str = "CALLFLOW_LOG_FILE";

const DEFAULT_LEVEL: &str = "warn";
const VERBOSE_LEVEL: &str = "debug";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl FromStr for LogFormat {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(crate::Error::InvalidInput(format!("Unknown log format: {s}"))),
        }
    }
}

/// Resolved logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Output format.
    pub format: LogFormat,
    /// `EnvFilter` directive.
    pub filter: String,
    /// Log file; stderr when `None`.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            filter: DEFAULT_LEVEL.to_string(),
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Builds logging configuration from config settings with env overrides.
    ///
    /// `RUST_LOG`, when set, takes precedence over every level setting.
    /// `verbose` raises the level to `debug` unless a level is set
    /// explicitly. Invalid format values fall back to pretty output.
    #[must_use]
    pub fn from_settings(settings: Option<&LoggingSettings>, verbose: bool) -> Self {
        let mut config = Self::default();

        if let Some(settings) = settings {
            if let Some(format) = settings.format.as_deref().and_then(|f| f.parse().ok()) {
                config.format = format;
            }
            config.file.clone_from(&settings.file);
        }
        if verbose {
            config.filter = VERBOSE_LEVEL.to_string();
        }
        if let Some(level) = settings.and_then(|s| s.level.clone()) {
            config.filter = level;
        }

        if let Some(format) = std::env::var(LOG_FORMAT_ENV)
            .ok()
            .and_then(|f| f.parse().ok())
        {
            config.format = format;
        }
        if let Ok(level) = std::env::var(LOG_LEVEL_ENV) {
            config.filter = level;
        }
        if let Ok(file) = std::env::var(LOG_FILE_ENV) {
            config.file = Some(PathBuf::from(file));
        }
        if let Ok(directive) = std::env::var("RUST_LOG") {
            config.filter = directive;
        }

        config
    }
}
