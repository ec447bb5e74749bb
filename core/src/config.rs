//! # Config: TOML Settings
//!
//! Settings for the ambient layers around the combinators. The combinators
//! themselves take no configuration.
//!
//! ```toml
//! [telemetry]
//! filter = "info,ligature_runtime=debug"
//! format = "json"
//! trace_steps = true
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Path of the config file, when set.
pub const CONFIG_ENV: &str = "LIGATURE_CONFIG";
/// Overrides `telemetry.filter`.
pub const LOG_ENV: &str = "LIGATURE_LOG";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LigatureConfig {
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// `EnvFilter` directives.
    pub filter: String,
    pub format: LogFormat,
    /// Wrap steps in `Traced` spans.
    pub trace_steps: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            format: LogFormat::Pretty,
            trace_steps: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LigatureConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Read the file named by `LIGATURE_CONFIG` (defaults otherwise), then
    /// apply the `LIGATURE_LOG` override.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_path(path)?,
            None => Self::default(),
        };
        if let Ok(filter) = std::env::var(LOG_ENV) {
            if !filter.trim().is_empty() {
                config.telemetry.filter = filter;
            }
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_source_gives_defaults() {
        let config = LigatureConfig::from_toml_str("").unwrap();
        assert_eq!(config, LigatureConfig::default());
        assert_eq!(config.telemetry.filter, "info");
    }

    #[test]
    fn parses_telemetry_section() {
        let config = LigatureConfig::from_toml_str(
            r#"
            [telemetry]
            filter = "debug"
            format = "json"
            trace_steps = true
            "#,
        )
        .unwrap();
        assert_eq!(config.telemetry.filter, "debug");
        assert_eq!(config.telemetry.format, LogFormat::Json);
        assert!(config.telemetry.trace_steps);
    }

    #[test]
    fn rejects_unknown_format() {
        let err = LigatureConfig::from_toml_str("[telemetry]\nformat = \"xml\"")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = LigatureConfig::from_path("/definitely/not/here.toml")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
