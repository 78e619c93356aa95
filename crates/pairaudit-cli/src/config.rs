//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use pairaudit_checker::CheckerConfig;
use pairaudit_extractor::{ExtractorConfig, PromptTemplates};
use pairaudit_llm::OllamaProvider;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// CLI configuration, loaded from TOML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Extraction settings
    pub extractor: ExtractorConfig,

    /// Pair-check settings
    pub checker: CheckerConfig,

    /// Oracle backend
    pub oracle: OracleConfig,

    /// Prompt template overrides
    pub prompts: PromptsConfig,
}

/// Oracle (Ollama) connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Ollama API endpoint
    pub endpoint: String,

    /// Model for primary calls
    pub model: String,

    /// Model for critic calls; the primary model when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub critic_model: Option<String>,

    /// HTTP-level retry attempts
    pub max_retries: u32,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Prompt template settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    /// Directory holding `<template>.txt` overrides
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl AppConfig {
    /// Default configuration file path (`~/.pairaudit/config.toml`).
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".pairaudit").join("config.toml"))
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, the default path is used
    /// when present and built-in defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) if !path.is_file() => {
                return Err(CliError::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )))
            }
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_path().filter(|p| p.is_file()),
        };

        let config = match path {
            Some(path) => {
                let contents = fs::read_to_string(&path)?;
                let config: AppConfig = toml::from_str(&contents)?;
                info!("Loaded configuration from {}", path.display());
                config
            }
            None => Self::default(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        self.extractor
            .validate()
            .map_err(|e| CliError::Config(format!("[extractor] {}", e)))?;
        self.checker
            .validate()
            .map_err(|e| CliError::Config(format!("[checker] {}", e)))?;
        if self.oracle.model.trim().is_empty() {
            return Err(CliError::Config("[oracle] model must not be empty".into()));
        }
        Ok(())
    }

    /// Serialize the effective configuration.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Prompt templates: the override directory when set, else built-ins.
    pub fn templates(&self) -> Result<PromptTemplates> {
        match &self.prompts.dir {
            Some(dir) => Ok(PromptTemplates::from_dir(dir)?),
            None => Ok(PromptTemplates::default()),
        }
    }

    /// Build the oracle provider.
    pub fn provider(&self) -> OllamaProvider {
        let provider = OllamaProvider::with_timeout(
            &self.oracle.endpoint,
            &self.oracle.model,
            Duration::from_secs(self.oracle.timeout_secs),
        )
        .with_max_retries(self.oracle.max_retries);

        match &self.oracle.critic_model {
            Some(model) => provider.with_critic_model(model),
            None => provider,
        }
    }
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            endpoint: pairaudit_llm::ollama::DEFAULT_ENDPOINT.to_string(),
            model: "llama3".to_string(),
            critic_model: None,
            max_retries: pairaudit_llm::ollama::DEFAULT_MAX_RETRIES,
            timeout_secs: pairaudit_llm::ollama::DEFAULT_TIMEOUT_SECS,
        }
    }
}
