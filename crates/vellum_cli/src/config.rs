//! Vellum configuration file handling

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Name of the configuration file looked up in the working directory
pub const CONFIG_FILE: &str = "vellum.toml";

/// Top-level configuration (vellum.toml)
#[derive(Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct VellumConfig {
    #[serde(default)]
    pub boolean: BooleanConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// Defaults for boolean options not given on the command line
#[derive(Debug, Deserialize, Serialize, PartialEq)]
pub struct BooleanConfig {
    #[serde(default = "default_true")]
    pub trace: bool,
    #[serde(default)]
    pub stroke: bool,
}

fn default_true() -> bool {
    true
}

impl Default for BooleanConfig {
    fn default() -> Self {
        Self {
            trace: true,
            stroke: false,
        }
    }
}

/// Path data output
#[derive(Debug, Deserialize, Serialize, PartialEq)]
pub struct OutputConfig {
    /// Maximum number of decimals
    #[serde(default = "default_precision")]
    pub precision: usize,
}

fn default_precision() -> usize {
    5
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            precision: default_precision(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, PartialEq)]
pub struct LogConfig {
    /// Filter directive used when RUST_LOG is unset
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_level() -> String {
    "warn".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

impl VellumConfig {
    /// Loads `path`, or `vellum.toml` from the working directory when no
    /// path is given. Only a missing default file falls back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = Path::new(CONFIG_FILE);
                if !default.exists() {
                    return Ok(Self::default());
                }
                default.to_path_buf()
            }
        };

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = VellumConfig::from_toml("").unwrap();
        assert_eq!(config, VellumConfig::default());
        assert!(config.boolean.trace);
        assert_eq!(config.output.precision, 5);
        assert_eq!(config.log.level, "warn");
    }

    #[test]
    fn test_partial_sections() {
        let config = VellumConfig::from_toml(
            r#"
            [boolean]
            stroke = true

            [output]
            precision = 2
            "#,
        )
        .unwrap();
        assert!(config.boolean.trace);
        assert!(config.boolean.stroke);
        assert_eq!(config.output.precision, 2);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(VellumConfig::from_toml("[output]\nprecision = \"high\"").is_err());
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let err = VellumConfig::load(Some(Path::new("does/not/exist/vellum.toml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }
}
