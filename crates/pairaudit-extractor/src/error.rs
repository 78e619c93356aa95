//! Error types for the Extractor

use pairaudit_llm::OracleCallError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during extraction
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// Oracle call failed after the retry budget
    #[error("LLM error: {0}")]
    Llm(#[from] OracleCallError),

    /// Input file does not exist
    #[error("Resource not found: {}", .0.display())]
    ResourceNotFound(PathBuf),

    /// File system error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(String),

    /// Item file content does not match the expected layout
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Prompt template is unusable
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for ExtractorError {
    fn from(e: serde_json::Error) -> Self {
        ExtractorError::JsonParse(e.to_string())
    }
}

/// An oracle response does not carry a valid item payload
///
/// This is the trigger for the retry/critic repair protocol, not a fatal
/// error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaValidationError {
    /// The payload is not parseable JSON
    #[error("response is not valid JSON: {0}")]
    NotJson(String),

    /// The payload is JSON but not an array of items
    #[error("expected a JSON array of items, found {0}")]
    NotAnArray(String),

    /// One element violates the item schema
    #[error("item {index} is invalid: {reason}")]
    InvalidItem {
        /// Position in the array
        index: usize,
        /// What is wrong with it
        reason: String,
    },
}

/// A prompt template cannot be rendered
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// A placeholder the caller relies on is absent from the template
    #[error("template '{template}' is missing placeholder {{{placeholder}}}")]
    MissingPlaceholder {
        /// Template name
        template: String,
        /// Placeholder name
        placeholder: String,
    },

    /// The template uses a placeholder no value was supplied for
    #[error("template '{template}' uses unknown placeholder {{{placeholder}}}")]
    UnknownPlaceholder {
        /// Template name
        template: String,
        /// Placeholder name
        placeholder: String,
    },

    /// An opening brace is never closed
    #[error("template '{template}' has an unclosed placeholder")]
    UnclosedPlaceholder {
        /// Template name
        template: String,
    },
}
