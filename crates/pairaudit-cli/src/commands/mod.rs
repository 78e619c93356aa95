//! Command implementations.

pub mod check;
pub mod conditions;
pub mod config;
pub mod facts;

pub use self::check::execute_check;
pub use self::conditions::execute_conditions;
pub use self::config::execute_config;
pub use self::facts::execute_facts;

use crate::output::Formatter;
use pairaudit_extractor::ExtractionResult;
use std::path::Path;

/// Source label for a document: the explicit label, else the file path.
pub(crate) fn source_label(source: Option<String>, file: &Path) -> String {
    source.unwrap_or_else(|| file.display().to_string())
}

/// One-line summary of an extraction run.
pub(crate) fn extraction_summary(noun: &str, result: &ExtractionResult) -> String {
    format!(
        "Extracted {} {}(s) from {} chunk(s) in {} ms ({} oracle call(s), {} critic call(s))",
        result.items.len(),
        noun,
        result.metadata.chunk_count,
        result.metadata.processing_time_ms,
        result.metadata.oracle_calls,
        result.metadata.critic_calls
    )
}

/// Warn about every abandoned extraction unit.
pub(crate) fn report_failures(result: &ExtractionResult, formatter: &Formatter) {
    for failure in &result.failures {
        let location = match failure.batch_index {
            Some(batch) => format!("Chunk {} batch {}", failure.chunk_index, batch),
            None => format!("Chunk {}", failure.chunk_index),
        };
        eprintln!(
            "{}",
            formatter.warning(&format!("{} abandoned: {}", location, failure.reason))
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_label() {
        let file = Path::new("docs/policy.md");
        assert_eq!(source_label(None, file), "docs/policy.md");
        assert_eq!(source_label(Some("policy".to_string()), file), "policy");
    }
}
