//! Configuration for the Extractor

use pairaudit_llm::RetryPolicy;
use serde::{Deserialize, Serialize};

/// Configuration for the Extractor
///
/// Sizes are in characters. Token budgets are approximated as four
/// characters per token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Texts longer than this are chunked; also the per-chunk bound
    pub chunk_size: usize,

    /// Characters of trailing context carried into the next chunk
    pub chunk_overlap: usize,

    /// Token ceiling for one condition-driven prompt (text plus conditions)
    pub condition_token_budget: usize,

    /// Items whose text is this short or shorter are dropped as noise
    pub min_item_chars: usize,

    /// Attempts per oracle call before an oracle failure is surfaced
    pub max_oracle_attempts: u32,

    /// Base backoff between oracle attempts (milliseconds)
    pub oracle_backoff_ms: u64,
}

impl ExtractorConfig {
    /// Retry policy for oracle calls
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_oracle_attempts, self.oracle_backoff_ms)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_size == 0 {
            return Err("chunk_size must be greater than 0".to_string());
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err("chunk_overlap must be smaller than chunk_size".to_string());
        }
        if self.condition_token_budget == 0 {
            return Err("condition_token_budget must be greater than 0".to_string());
        }
        if self.max_oracle_attempts == 0 {
            return Err("max_oracle_attempts must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            chunk_size: 4000,
            chunk_overlap: 200,
            condition_token_budget: 8192,
            min_item_chars: 5,
            max_oracle_attempts: 1,
            oracle_backoff_ms: 500,
        }
    }
}
