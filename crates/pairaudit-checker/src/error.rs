//! Checker error types

use pairaudit_extractor::TemplateError;
use pairaudit_llm::OracleCallError;
use thiserror::Error;

/// Errors that can occur during a pair check
///
/// A malformed pair response is not an error; it becomes an `Unknown`
/// judgment.
#[derive(Error, Debug)]
pub enum CheckerError {
    /// Oracle call failed after the retry budget
    #[error("LLM error: {0}")]
    Llm(#[from] OracleCallError),

    /// Pair-check template is unusable
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    /// A concurrent pair-check task panicked or was cancelled
    #[error("Pair check task failed: {0}")]
    Task(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
