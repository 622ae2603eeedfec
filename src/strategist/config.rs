// SPDX-License-Identifier: MIT

//! Run configuration
//!
//! Loaded from an optional YAML file where every key has a default, then
//! overridden by `MODEL_PROVIDER` / `MODEL_NAME` from the environment.

use crate::adk::error::StrategistError;
use crate::adk::model::Provider;
use crate::adk::retry::RetryConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_MODEL: &str = "llama-3.1-70b-versatile";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ModelSettings {
    #[serde(default)]
    pub provider: Option<Provider>,
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
}

impl ModelSettings {
    pub fn model_name(&self) -> &str {
        self.model_name.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    /// Explicit provider, else inferred from the model name
    pub fn provider(&self) -> Provider {
        self.provider
            .unwrap_or_else(|| Provider::infer_from_model(self.model_name()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FetchConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_chars: default_max_chars(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchConfig {
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StrategistConfig {
    #[serde(default)]
    pub model: ModelSettings,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Node executions allowed per run; `null` disables the guard
    #[serde(default = "default_max_steps")]
    pub max_steps: Option<usize>,
    /// Corrections the quality gate may request; `null` is unbounded
    #[serde(default = "default_max_correction_rounds")]
    pub max_correction_rounds: Option<u32>,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_max_steps() -> Option<usize> {
    Some(50)
}

fn default_max_correction_rounds() -> Option<u32> {
    Some(3)
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_chars() -> usize {
    8_000
}

fn default_max_results() -> u32 {
    5
}

impl Default for StrategistConfig {
    fn default() -> Self {
        Self {
            model: ModelSettings::default(),
            output_dir: default_output_dir(),
            max_steps: default_max_steps(),
            max_correction_rounds: default_max_correction_rounds(),
            retry: RetryConfig::default(),
            fetch: FetchConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

impl StrategistConfig {
    /// Parse a configuration from a YAML string
    pub fn parse_yaml(content: &str) -> Result<Self, StrategistError> {
        // An empty file is a valid, all-defaults config
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Load from `path` (defaults when `None`) and apply env overrides
    pub fn load(path: Option<&Path>) -> Result<Self, StrategistError> {
        let mut config = match path {
            Some(path) => {
                let content = fs::read_to_string(path).map_err(|e| {
                    StrategistError::config(format!("cannot read {}: {}", path.display(), e))
                })?;
                Self::parse_yaml(&content)?
            }
            None => Self::default(),
        };
        config.apply_env()?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<(), StrategistError> {
        if let Ok(provider) = env::var("MODEL_PROVIDER") {
            self.model.provider = Some(
                provider
                    .parse()
                    .map_err(|e| StrategistError::config(format!("MODEL_PROVIDER: {}", e)))?,
            );
        }
        if let Ok(name) = env::var("MODEL_NAME") {
            self.model.model_name = Some(name);
        }
        Ok(())
    }
}

/// Reject anything that is not an absolute http(s) URL
pub fn validate_links(links: &[String]) -> Result<Vec<String>, StrategistError> {
    links
        .iter()
        .map(|link| {
            let parsed = url::Url::parse(link)
                .map_err(|e| StrategistError::config(format!("invalid URL '{}': {}", link, e)))?;
            match parsed.scheme() {
                "http" | "https" => Ok(parsed.to_string()),
                other => Err(StrategistError::config(format!(
                    "unsupported URL scheme '{}' in '{}'",
                    other, link
                ))),
            }
        })
        .collect()
}
