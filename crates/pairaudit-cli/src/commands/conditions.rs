//! Conditions command implementation.

use crate::cli::ConditionsArgs;
use crate::config::AppConfig;
use crate::error::Result;
use crate::output::Formatter;
use pairaudit_domain::LlmProvider;
use pairaudit_extractor::{files, Extractor};
use std::fmt;

use super::{extraction_summary, report_failures, source_label};

/// Execute the conditions command.
pub async fn execute_conditions<L>(
    args: ConditionsArgs,
    llm: L,
    config: &AppConfig,
    formatter: &Formatter,
) -> Result<()>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: fmt::Display,
{
    let text = files::load_document(&args.file)?;
    let source = source_label(args.source, &args.file);

    let extractor =
        Extractor::new(llm, config.extractor.clone())?.with_templates(config.templates()?);
    let result = extractor.extract_conditions(&text, Some(&source)).await?;
    report_failures(&result, formatter);

    match &args.output {
        Some(path) => {
            files::save_items(path, &result.items)?;
            println!(
                "{}",
                formatter.success(&format!(
                    "{} condition(s) written to {}",
                    result.items.len(),
                    path.display()
                ))
            );
        }
        None => println!("{}", formatter.format_items(&result.items, &result.hierarchy)?),
    }
    eprintln!("{}", formatter.info(&extraction_summary("condition", &result)));

    Ok(())
}
