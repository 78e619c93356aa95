//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Extraction failed
    #[error(transparent)]
    Extractor(#[from] pairaudit_extractor::ExtractorError),

    /// Pair check failed
    #[error(transparent)]
    Checker(#[from] pairaudit_checker::CheckerError),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
