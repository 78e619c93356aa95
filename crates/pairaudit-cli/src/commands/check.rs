//! Check command implementation.

use crate::cli::{CheckArgs, ExtractOnly};
use crate::config::AppConfig;
use crate::error::{CliError, Result};
use crate::output::{check_result_json, Formatter};
use pairaudit_checker::PairChecker;
use pairaudit_domain::{Item, ItemKind, LlmProvider};
use pairaudit_extractor::{files, Extractor};
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use super::{extraction_summary, report_failures};

/// Extracted or reused conditions, inside the output directory.
pub const CONDITIONS_OUTPUT: &str = "conditions_output.json";

/// Extracted or reused facts, inside the output directory.
pub const FACTS_OUTPUT: &str = "facts_output.json";

/// Pair-check report, inside the output directory.
pub const PAIR_CHECK_OUTPUT: &str = "pair_check_output.json";

/// Execute the check command.
pub async fn execute_check<L>(
    args: CheckArgs,
    llm: L,
    config: &AppConfig,
    formatter: &Formatter,
) -> Result<()>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: fmt::Display,
{
    validate_args(&args)?;

    let llm = Arc::new(llm);
    let templates = config.templates()?;
    let extractor =
        Extractor::with_shared_provider(Arc::clone(&llm), config.extractor.clone())?
            .with_templates(templates.clone());

    let extract_conditions = args.extract_only != Some(ExtractOnly::Facts);
    let conditions = resolve_conditions(&args, &extractor, extract_conditions, formatter).await?;
    if args.extract_only == Some(ExtractOnly::Conditions) {
        return Ok(());
    }

    let facts = resolve_facts(&args, &extractor, &conditions, formatter).await?;
    if args.extract_only.is_some() {
        return Ok(());
    }

    let (conditions, facts) = whole_document_fallback(&args, conditions, facts, formatter)?;
    if conditions.is_empty() || facts.is_empty() {
        eprintln!(
            "{}",
            formatter.warning("No conditions or no facts to check; the result will be empty")
        );
    }

    let checker = PairChecker::with_shared_provider(llm, config.checker.clone())?
        .with_templates(templates);
    let result = checker.check_pairs(&conditions, &facts).await?;

    let report_path = args.output_dir.join(PAIR_CHECK_OUTPUT);
    write_report(&report_path, &check_result_json(&result))?;

    println!("{}", formatter.format_check_result(&result)?);
    eprintln!(
        "{}",
        formatter.info(&format!("Pair-check report written to {}", report_path.display()))
    );

    Ok(())
}

fn validate_args(args: &CheckArgs) -> Result<()> {
    let missing = match args.extract_only {
        Some(ExtractOnly::Conditions) if args.source_file.is_none() => {
            Some("--extract-only conditions requires --source-file")
        }
        Some(ExtractOnly::Facts) if args.target_file.is_none() => {
            Some("--extract-only facts requires --target-file")
        }
        Some(ExtractOnly::Both) if args.source_file.is_none() || args.target_file.is_none() => {
            Some("--extract-only both requires --source-file and --target-file")
        }
        None if args.conditions.is_none()
            && !args.use_existing_conditions
            && args.source_file.is_none() =>
        {
            Some("no conditions: pass --conditions, --use-existing-conditions or --source-file")
        }
        None if args.facts.is_none() && !args.use_existing_facts && args.target_file.is_none() => {
            Some("no facts: pass --facts, --use-existing-facts or --target-file")
        }
        _ => None,
    };

    match missing {
        Some(message) => Err(CliError::InvalidInput(message.to_string())),
        None => Ok(()),
    }
}

async fn resolve_conditions<L>(
    args: &CheckArgs,
    extractor: &Extractor<L>,
    allow_extraction: bool,
    formatter: &Formatter,
) -> Result<Vec<Item>>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: fmt::Display,
{
    if let Some(path) = &args.conditions {
        return Ok(files::load_items(path, Some(ItemKind::Condition))?.0);
    }
    if args.use_existing_conditions {
        let path = args.output_dir.join(CONDITIONS_OUTPUT);
        return load_existing(&path, ItemKind::Condition, formatter);
    }

    match &args.source_file {
        Some(path) if allow_extraction => {
            let text = files::load_document(path)?;
            let source = path.display().to_string();
            let result = extractor.extract_conditions(&text, Some(&source)).await?;
            report_failures(&result, formatter);

            let output = args.output_dir.join(CONDITIONS_OUTPUT);
            files::save_items(&output, &result.items)?;
            eprintln!("{}", formatter.info(&extraction_summary("condition", &result)));
            eprintln!(
                "{}",
                formatter.success(&format!(
                    "{} condition(s) written to {}",
                    result.items.len(),
                    output.display()
                ))
            );
            Ok(result.items)
        }
        _ => Ok(Vec::new()),
    }
}

async fn resolve_facts<L>(
    args: &CheckArgs,
    extractor: &Extractor<L>,
    conditions: &[Item],
    formatter: &Formatter,
) -> Result<Vec<Item>>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: fmt::Display,
{
    if args.extract_only.is_none() {
        if let Some(path) = &args.facts {
            return Ok(files::load_items(path, Some(ItemKind::Fact))?.0);
        }
        if args.use_existing_facts {
            return load_existing(&args.output_dir.join(FACTS_OUTPUT), ItemKind::Fact, formatter);
        }
    }

    match &args.target_file {
        Some(path) => {
            let text = files::load_document(path)?;
            let source = path.display().to_string();
            let result = extractor.extract_facts(&text, conditions, Some(&source)).await?;
            report_failures(&result, formatter);

            let output = args.output_dir.join(FACTS_OUTPUT);
            files::save_items(&output, &result.items)?;
            eprintln!("{}", formatter.info(&extraction_summary("fact", &result)));
            eprintln!(
                "{}",
                formatter.success(&format!(
                    "{} fact(s) written to {}",
                    result.items.len(),
                    output.display()
                ))
            );
            Ok(result.items)
        }
        None => Ok(Vec::new()),
    }
}

/// Reused items; a missing file yields nothing and a warning.
fn load_existing(path: &Path, kind: ItemKind, formatter: &Formatter) -> Result<Vec<Item>> {
    if !path.is_file() {
        eprintln!(
            "{}",
            formatter.warning(&format!("Existing {} file not found: {}", kind, path.display()))
        );
        return Ok(Vec::new());
    }
    Ok(files::load_items(path, Some(kind))?.0)
}

/// Stand in a whole document for the side that produced no items.
fn whole_document_fallback(
    args: &CheckArgs,
    conditions: Vec<Item>,
    facts: Vec<Item>,
    formatter: &Formatter,
) -> Result<(Vec<Item>, Vec<Item>)> {
    match (&args.source_file, &args.target_file) {
        (Some(source), _) if conditions.is_empty() && !facts.is_empty() => {
            info!("No conditions extracted, checking facts against the whole source document");
            eprintln!(
                "{}",
                formatter.info("No conditions; the whole source document is used as one condition")
            );
            let text = files::load_document(source)?;
            let condition = Item::condition(text)
                .with_id(1)
                .with_source(source.display().to_string());
            Ok((vec![condition], facts))
        }
        (_, Some(target)) if facts.is_empty() && !conditions.is_empty() => {
            info!("No facts extracted, checking conditions against the whole target document");
            eprintln!(
                "{}",
                formatter.info("No facts; the whole target document is used as one fact")
            );
            let text = files::load_document(target)?;
            let fact = Item::fact(text)
                .with_id(1)
                .with_source(target.display().to_string());
            Ok((conditions, vec![fact]))
        }
        _ => Ok((conditions, facts)),
    }
}

fn write_report(path: &Path, report: &serde_json::Value) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(report)?)?;
    info!("Saved pair-check report to {}", path.display());
    Ok(())
}
