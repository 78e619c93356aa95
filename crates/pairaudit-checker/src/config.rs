//! Checker configuration

use pairaudit_llm::RetryPolicy;
use serde::{Deserialize, Serialize};

/// Configuration for the PairChecker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckerConfig {
    /// Pair checks in flight at once; 1 checks pairs one after another
    pub max_concurrency: usize,

    /// Attempts per oracle call before an oracle failure is surfaced
    pub max_oracle_attempts: u32,

    /// Base backoff between oracle attempts (milliseconds)
    pub oracle_backoff_ms: u64,
}

impl CheckerConfig {
    /// Retry policy for oracle calls
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_oracle_attempts, self.oracle_backoff_ms)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_concurrency == 0 {
            return Err("max_concurrency must be greater than 0".to_string());
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

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 1,
            max_oracle_attempts: 1,
            oracle_backoff_ms: 500,
        }
    }
}
