//! Pairaudit CLI library.
//!
//! This library provides the core functionality for the `pairaudit`
//! command-line interface, including configuration loading, command
//! execution and output formatting.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use cli::{Cli, Command, ExtractOnly};
pub use config::AppConfig;
pub use error::{CliError, Result};
pub use output::{Formatter, OutputFormat};
