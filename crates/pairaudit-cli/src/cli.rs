//! CLI command definitions and argument parsing.

use crate::output::OutputFormat;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Pairaudit CLI - Extract conditions and facts from documents and check
/// every pair for compliance.
#[derive(Debug, Parser)]
#[command(name = "pairaudit")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "PAIRAUDIT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log filter (e.g. "debug", "pairaudit_extractor=trace")
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract conditions from a document
    Conditions(ConditionsArgs),

    /// Extract facts from a document
    Facts(FactsArgs),

    /// Check every condition against every fact
    Check(CheckArgs),

    /// Print the effective configuration
    Config,
}

/// Arguments for the conditions command.
#[derive(Debug, Parser)]
pub struct ConditionsArgs {
    /// Document to extract conditions from
    pub file: PathBuf,

    /// Write the conditions as JSON to this path
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Source label stamped on every item (defaults to the file path)
    #[arg(long)]
    pub source: Option<String>,
}

/// Arguments for the facts command.
#[derive(Debug, Parser)]
pub struct FactsArgs {
    /// Document to extract facts from
    pub file: PathBuf,

    /// Conditions JSON file; makes extraction condition-driven
    #[arg(long)]
    pub conditions: Option<PathBuf>,

    /// Write the facts as JSON to this path
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Also write facts grouped under their conditions to this path
    /// (requires --conditions)
    #[arg(long)]
    pub grouped: Option<PathBuf>,

    /// Source label stamped on every item (defaults to the file path)
    #[arg(long)]
    pub source: Option<String>,
}

/// Arguments for the check command.
///
/// Conditions come from `--conditions`, else `--use-existing-conditions`,
/// else extraction from `--source-file`. Facts are resolved the same way
/// from `--facts`, `--use-existing-facts` and `--target-file`.
#[derive(Debug, Parser)]
pub struct CheckArgs {
    /// Conditions JSON file
    #[arg(long, conflicts_with = "use_existing_conditions")]
    pub conditions: Option<PathBuf>,

    /// Facts JSON file
    #[arg(long, conflicts_with = "use_existing_facts")]
    pub facts: Option<PathBuf>,

    /// Document to extract conditions from
    #[arg(short, long)]
    pub source_file: Option<PathBuf>,

    /// Document to extract facts from
    #[arg(short, long)]
    pub target_file: Option<PathBuf>,

    /// Directory for extracted items and the pair-check report
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Reuse conditions_output.json from the output directory
    #[arg(long)]
    pub use_existing_conditions: bool,

    /// Reuse facts_output.json from the output directory
    #[arg(long)]
    pub use_existing_facts: bool,

    /// Stop after extracting the named items
    #[arg(long, value_enum)]
    pub extract_only: Option<ExtractOnly>,
}

/// Extraction stages run by `check --extract-only`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExtractOnly {
    /// Conditions from the source document
    Conditions,
    /// Facts from the target document
    Facts,
    /// Conditions, then condition-driven facts
    Both,
}
