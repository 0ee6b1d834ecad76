//! Configuration file parsing
//!
//! Reads sqlshift.toml configuration files.

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::VariantNames;
use thiserror::Error;

use crate::batch::Dialect;
use crate::runner::RunnerOptions;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub runner: RunnerSection,

    #[serde(default)]
    pub parser: ParserSection,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RunnerSection {
    /// Stop the run at the first failing migration.
    #[serde(default = "default_abort_on_error")]
    pub abort_on_error: bool,
}

impl Default for RunnerSection {
    fn default() -> Self {
        Self {
            abort_on_error: default_abort_on_error(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ParserSection {
    /// SQL dialect: "sql-server", "my-sql", or "ansi".
    #[serde(default = "default_dialect")]
    pub dialect: String,

    /// Strip comments from the emitted batches.
    #[serde(default)]
    pub strip_comments: bool,
}

impl Default for ParserSection {
    fn default() -> Self {
        Self {
            dialect: default_dialect(),
            strip_comments: false,
        }
    }
}

fn default_abort_on_error() -> bool {
    true
}

fn default_dialect() -> String {
    "ansi".to_string()
}

impl Config {
    /// Load and validate a config file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.dialect().map(|_| ())
    }

    /// The configured dialect, parsed.
    pub fn dialect(&self) -> Result<Dialect, ConfigError> {
        Dialect::from_str(&self.parser.dialect).map_err(|_| {
            ConfigError::Validation(format!(
                "unknown dialect '{}' (expected one of: {})",
                self.parser.dialect,
                Dialect::VARIANTS.join(", ")
            ))
        })
    }

    pub fn runner_options(&self) -> RunnerOptions {
        RunnerOptions {
            abort_on_error: self.runner.abort_on_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.dialect().expect("valid"), Dialect::Ansi);
        assert!(config.runner_options().abort_on_error);
    }

    #[test]
    fn sections_parse_from_toml() {
        let config: Config = toml::from_str(
            "[runner]\nabort_on_error = false\n\n[parser]\ndialect = \"sql-server\"\nstrip_comments = true\n",
        )
        .expect("parse");
        assert!(!config.runner_options().abort_on_error);
        assert_eq!(config.dialect().expect("valid"), Dialect::SqlServer);
        assert!(config.parser.strip_comments);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let config: Config = toml::from_str("[parser]\ndialect = \"my-sql\"\n").expect("parse");
        assert!(config.runner_options().abort_on_error);
        assert_eq!(config.dialect().expect("valid"), Dialect::MySql);
    }

    #[test]
    fn unknown_dialect_is_rejected_with_the_valid_set() {
        let config: Config = toml::from_str("[parser]\ndialect = \"oracle\"\n").expect("parse");
        let err = config.validate().expect_err("oracle is not supported");
        let message = err.to_string();
        assert!(message.contains("oracle"), "got: {message}");
        assert!(message.contains("sql-server"), "got: {message}");
    }
}
