//! Facts command implementation.

use crate::cli::FactsArgs;
use crate::config::AppConfig;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use pairaudit_domain::{ItemKind, LlmProvider};
use pairaudit_extractor::{files, Extractor};
use std::fmt;

use super::{extraction_summary, report_failures, source_label};

/// Execute the facts command.
pub async fn execute_facts<L>(
    args: FactsArgs,
    llm: L,
    config: &AppConfig,
    formatter: &Formatter,
) -> Result<()>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: fmt::Display,
{
    if args.grouped.is_some() && args.conditions.is_none() {
        return Err(CliError::InvalidInput(
            "--grouped requires --conditions".to_string(),
        ));
    }

    let conditions = match &args.conditions {
        Some(path) => files::load_items(path, Some(ItemKind::Condition))?.0,
        None => Vec::new(),
    };

    let text = files::load_document(&args.file)?;
    let source = source_label(args.source, &args.file);

    let extractor =
        Extractor::new(llm, config.extractor.clone())?.with_templates(config.templates()?);
    let result = extractor
        .extract_facts(&text, &conditions, Some(&source))
        .await?;
    report_failures(&result, formatter);

    if let Some(path) = &args.grouped {
        let groups = files::group_facts_by_condition(&conditions, &result.items);
        files::save_grouped_facts(path, &groups)?;
        println!(
            "{}",
            formatter.success(&format!(
                "Facts grouped under {} condition(s) written to {}",
                groups.len(),
                path.display()
            ))
        );
    }

    match &args.output {
        Some(path) => {
            files::save_items(path, &result.items)?;
            println!(
                "{}",
                formatter.success(&format!(
                    "{} fact(s) written to {}",
                    result.items.len(),
                    path.display()
                ))
            );
        }
        None if args.grouped.is_none() => {
            println!("{}", formatter.format_items(&result.items, &result.hierarchy)?)
        }
        None => {}
    }
    eprintln!("{}", formatter.info(&extraction_summary("fact", &result)));

    Ok(())
}
