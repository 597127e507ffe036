//! Configuration management.
//!
//! Configuration is resolved in this order:
//!
//! 1. Explicit path (`--config`)
//! 2. `CALLFLOW_CONFIG_PATH`
//! 3. Platform config dir (`~/.config/callflow/config.toml` on Linux)
//! 4. Built-in defaults
//!
//! Environment variables then override individual values.

use crate::io::{DirectoryPaths, Format};
use crate::services::deduplication::{DEDUP_STRATEGY_ENV, DedupStrategy};
use crate::services::grouping::PUSH_NOTIFICATION_REASON;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "CALLFLOW_CONFIG_PATH";

/// Environment variable overriding the notification reason.
pub const NOTIFICATION_REASON_ENV: &str = "CALLFLOW_NOTIFICATION_REASON";

/// Environment variable overriding the output format.
pub const OUTPUT_FORMAT_ENV: &str = "CALLFLOW_OUTPUT_FORMAT";

/// Main configuration for callflow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CallflowConfig {
    /// Pipeline settings.
    pub pipeline: PipelineSettings,
    /// Reference directory paths.
    pub directories: DirectoryPaths,
    /// Output settings.
    pub output: OutputSettings,
    /// Logging settings.
    pub logging: LoggingSettings,
    /// File the configuration was loaded from, if any.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// Pipeline behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Related reason marking notification noise rows.
    pub notification_reason: String,
    /// Deduplication strategy.
    pub dedup_strategy: DedupStrategy,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            notification_reason: PUSH_NOTIFICATION_REASON.to_string(),
            dedup_strategy: DedupStrategy::default(),
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Format used when the output path does not name one.
    pub format: Format,
}

/// Logging settings from the config file.
///
/// Resolved against environment variables by
/// [`crate::observability::LoggingConfig::from_settings`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// `pretty` or `json`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Level or filter directive, e.g. `info` or `callflow=debug`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    /// Log file path. Logs go to stderr when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Pipeline section.
    pub pipeline: Option<ConfigFilePipeline>,
    /// Directories section.
    pub directories: Option<DirectoryPaths>,
    /// Output section.
    pub output: Option<ConfigFileOutput>,
    /// Logging section.
    pub logging: Option<LoggingSettings>,
}

/// Pipeline section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFilePipeline {
    /// Notification reason.
    pub notification_reason: Option<String>,
    /// Dedup strategy name.
    pub dedup_strategy: Option<String>,
}

/// Output section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileOutput {
    /// Output format name.
    pub format: Option<String>,
}

impl CallflowConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves the configuration and applies environment overrides.
    ///
    /// An explicit path, or the path in `CALLFLOW_CONFIG_PATH`, must load;
    /// the platform default is skipped if missing or unreadable.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly named file cannot be loaded, or an
    /// environment override holds an invalid value.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
        let config = match explicit.map(Path::to_path_buf).or(env_path) {
            Some(path) => Self::load_from_file(&path)?,
            None => Self::load_default(),
        };
        config.with_env_overrides()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_config_file".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;

        let file: ConfigFile = toml::from_str(&contents).map_err(|e| Error::OperationFailed {
            operation: "parse_config_file".to_string(),
            cause: e.to_string(),
        })?;

        let mut config = Self::from_config_file(file)?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    /// Returns the platform-specific default config file path.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "callflow")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Loads configuration from the default location.
    ///
    /// Returns default configuration if no config file is found or it fails
    /// to load.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable config file");
                Self::default()
            },
        }
    }

    /// Converts a `ConfigFile` to `CallflowConfig`.
    fn from_config_file(file: ConfigFile) -> Result<Self> {
        let mut config = Self::default();

        if let Some(pipeline) = file.pipeline {
            if let Some(reason) = pipeline.notification_reason {
                config.pipeline.notification_reason = reason;
            }
            if let Some(strategy) = pipeline.dedup_strategy {
                config.pipeline.dedup_strategy = strategy.parse()?;
            }
        }
        if let Some(directories) = file.directories {
            config.directories = directories;
        }
        if let Some(format) = file.output.and_then(|output| output.format) {
            config.output.format = format.parse()?;
        }
        if let Some(logging) = file.logging {
            config.logging = logging;
        }

        Ok(config)
    }

    /// Applies environment variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if an override holds an invalid value.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(reason) = std::env::var(NOTIFICATION_REASON_ENV) {
            self.pipeline.notification_reason = reason;
        }
        if let Ok(strategy) = std::env::var(DEDUP_STRATEGY_ENV) {
            self.pipeline.dedup_strategy = strategy.parse()?;
        }
        if let Ok(format) = std::env::var(OUTPUT_FORMAT_ENV) {
            self.output.format = format.parse()?;
        }
        Ok(self)
    }

    /// Sets the deduplication strategy.
    #[must_use]
    pub const fn with_dedup_strategy(mut self, strategy: DedupStrategy) -> Self {
        self.pipeline.dedup_strategy = strategy;
        self
    }

    /// Sets the reference directory paths.
    #[must_use]
    pub fn with_directories(mut self, directories: DirectoryPaths) -> Self {
        self.directories = directories;
        self
    }

    /// Renders the effective configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::OperationFailed {
            operation: "serialize_config".to_string(),
            cause: e.to_string(),
        })
    }
}
