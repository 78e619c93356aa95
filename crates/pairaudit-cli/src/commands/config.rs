//! Config command implementation.

use crate::config::AppConfig;
use crate::error::Result;
use crate::output::{Formatter, OutputFormat};

/// Execute the config command: print the effective configuration.
pub fn execute_config(config: &AppConfig, format: OutputFormat, formatter: &Formatter) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
        OutputFormat::Table => {
            if let Some(path) = AppConfig::default_path() {
                let message = format!("Default config path: {}", path.display());
                eprintln!("{}", formatter.info(&message));
            }
            println!("{}", config.to_toml()?);
        }
    }
    Ok(())
}
