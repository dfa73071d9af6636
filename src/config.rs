//! Project configuration.
//!
//! YAML schema with camelCase keys. Validation happens before any file is
//! touched; an invalid configuration aborts the run with a single error.
//! `Config::template` serializes the full registered default model set, which
//! is what the `config` subcommand writes.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::lang::Registry;
use crate::model::ModelConfig;

/// Default number of lint workers.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Output formats the engine understands.
pub const FORMATS: &[&str] = &["cmd", "json"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub version: String,
    /// Lint worker count, validated > 0.
    pub concurrency: usize,
    pub log_level: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub log_file: String,
    pub warning_disable: bool,
    /// Report destination; empty writes to stdout.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub output_file: String,
    /// `"cmd"` or `"json"`.
    pub output_format: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclude_files: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclude_dirs: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclude_names: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclude_tags: Vec<String>,
    pub languages: Vec<LanguageConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            version: env!("CARGO_PKG_VERSION").to_string(),
            concurrency: DEFAULT_CONCURRENCY,
            log_level: "error".to_string(),
            log_file: String::new(),
            warning_disable: false,
            output_file: String::new(),
            output_format: "cmd".to_string(),
            exclude_files: Vec::new(),
            exclude_dirs: Vec::new(),
            exclude_names: Vec::new(),
            exclude_tags: Vec::new(),
            languages: Vec::new(),
        }
    }
}

/// One configured language: its name (empty selects the anonymous,
/// language-independent rule set), explicit extensions, and model overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LanguageConfig {
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<String>,
    pub models: Vec<ModelConfig>,
}

impl Config {
    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let config: Config = serde_yaml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Startup validation; nothing runs after a failure here.
    pub fn validate(&self) -> Result<(), Error> {
        if self.concurrency == 0 {
            return Err(Error::InvalidConcurrency);
        }
        if !FORMATS.contains(&self.output_format.as_str()) {
            return Err(Error::UnknownFormat(self.output_format.clone()));
        }
        Ok(())
    }

    /// Default configuration covering every registered language and model
    /// with its declared defaults.
    pub fn template(registry: &Registry) -> Self {
        let mut config = Config {
            log_level: "info".to_string(),
            ..Config::default()
        };
        for language in registry.languages() {
            let models: Vec<ModelConfig> = language.models().map(ModelConfig::from_model).collect();
            if models.is_empty() {
                continue;
            }
            config.languages.push(LanguageConfig {
                name: if language.is_anonymous() {
                    String::new()
                } else {
                    language.id().to_string()
                },
                extensions: language
                    .extensions()
                    .iter()
                    .map(|e| e.to_string())
                    .collect(),
                models,
            });
        }
        config
    }

    /// Serialize to YAML for the `config` subcommand.
    pub fn to_yaml(&self) -> Result<String, Error> {
        Ok(serde_yaml::to_string(self)?)
    }
}
