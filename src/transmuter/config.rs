//! Configuration loader for the transmuter toolchain.
//!
//! `defaults/transmuter.default.toml` is embedded so that documented defaults and runtime
//! behavior stay in sync. Applications layer user-specific files on top of those defaults
//! via [`Loader`] before deserializing into [`TransmuterConfig`].

use crate::transmuter::common::{conditions, Conditions};
use crate::transmuter::parsing::rule::Features;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use serde::Deserialize;
use std::path::Path;

const DEFAULT_TOML: &str = include_str!("../../defaults/transmuter.default.toml");

/// Top-level configuration consumed by transmuter applications.
#[derive(Debug, Clone, Deserialize)]
pub struct TransmuterConfig {
    pub parser: ParserConfig,
    pub grammar: GrammarConfig,
    pub output: OutputConfig,
}

/// Knobs of the parse driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ParserConfig {
    pub max_depth: usize,
    pub trailing_ignorable: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_depth: crate::transmuter::parsing::runtime::DEFAULT_MAX_DEPTH,
            trailing_ignorable: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GrammarConfig {
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub conditions: Vec<String>,
}

impl GrammarConfig {
    pub fn feature_set(&self) -> Features {
        self.features.iter().cloned().collect()
    }

    pub fn condition_set(&self) -> Conditions {
        conditions(self.conditions.iter().cloned())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub spans: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    Treeviz,
    Json,
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional configuration file (ignored if the file is absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override (useful for CLI settings).
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Finalize the builder and deserialize the resulting configuration.
    pub fn build(self) -> Result<TransmuterConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<TransmuterConfig, ConfigError> {
    Loader::new().build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loads_default_config() {
        let config = load_defaults().expect("defaults to deserialize");
        assert_eq!(config.parser, ParserConfig::default());
        assert!(config.grammar.features.is_empty());
        assert_eq!(config.grammar.condition_set(), conditions(["syntactic"]));
        assert_eq!(config.output.format, OutputFormat::Treeviz);
        assert!(!config.output.spans);
    }

    #[test]
    fn test_supports_overrides() {
        let config = Loader::new()
            .set_override("output.format", "json")
            .expect("override to apply")
            .set_override("parser.max_depth", 16_i64)
            .expect("override to apply")
            .build()
            .expect("config to build");
        assert_eq!(config.output.format, OutputFormat::Json);
        assert_eq!(config.parser.max_depth, 16);
    }

    #[test]
    fn test_missing_required_file_fails() {
        let result = Loader::new()
            .with_file("/nonexistent/transmuter.toml")
            .build();
        assert!(result.is_err());
    }
}
