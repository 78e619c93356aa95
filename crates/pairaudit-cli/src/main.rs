//! Pairaudit CLI - Extract conditions and facts and check them pairwise.

use clap::Parser;
use pairaudit_cli::commands;
use pairaudit_cli::{AppConfig, Cli, Command, Formatter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> pairaudit_cli::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    let config = AppConfig::load(cli.config.as_deref())?;
    let format = cli.format.unwrap_or_default();
    let formatter = Formatter::new(format, !cli.no_color);

    match cli.command {
        Command::Conditions(args) => {
            commands::execute_conditions(args, config.provider(), &config, &formatter).await?;
        }
        Command::Facts(args) => {
            commands::execute_facts(args, config.provider(), &config, &formatter).await?;
        }
        Command::Check(args) => {
            commands::execute_check(args, config.provider(), &config, &formatter).await?;
        }
        Command::Config => {
            commands::execute_config(&config, format, &formatter)?;
        }
    }

    Ok(())
}

/// Log to stderr so stdout stays clean for results.
fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
