//! Output formatting for the CLI.

use crate::error::Result;
use colored::*;
use pairaudit_domain::{ComplianceStatus, Item, ItemHierarchy, ItemId, PairCheckResult};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format extracted items.
    pub fn format_items(&self, items: &[Item], hierarchy: &ItemHierarchy) -> Result<String> {
        match self.format {
            OutputFormat::Json => self.format_items_json(items),
            OutputFormat::Table => Ok(self.format_items_table(items, hierarchy)),
        }
    }

    fn format_items_json(&self, items: &[Item]) -> Result<String> {
        let json_items: Vec<serde_json::Value> = items
            .iter()
            .map(|item| {
                serde_json::json!({
                    "id": item.id,
                    "text": item.text,
                    "parent_id": item.parent_id,
                    "type": item.kind.as_str(),
                    "source": item.source,
                    "condition_ids": item.condition_ids,
                })
            })
            .collect();

        Ok(serde_json::to_string_pretty(&json_items)?)
    }

    fn format_items_table(&self, items: &[Item], hierarchy: &ItemHierarchy) -> String {
        if items.is_empty() {
            return self.colorize("No items found.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["ID", "Parent", "Type", "Text", "Conditions"]);

        for (idx, item) in items.iter().enumerate() {
            // Indent children under their parents
            let depth = if idx < hierarchy.len() {
                hierarchy.depth_of(idx)
            } else {
                0
            };
            let text = format!("{}{}", "  ".repeat(depth), item.text);
            let conditions = item
                .condition_ids
                .as_ref()
                .map(|ids| {
                    ids.iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .unwrap_or_default();

            builder.push_record([
                optional_id(item.id),
                optional_id(item.parent_id),
                item.kind.as_str().to_string(),
                text,
                conditions,
            ]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        table.to_string()
    }

    /// Format a pair-check result.
    pub fn format_check_result(&self, result: &PairCheckResult) -> Result<String> {
        match self.format {
            OutputFormat::Json => self.format_check_result_json(result),
            OutputFormat::Table => Ok(self.format_check_result_table(result)),
        }
    }

    fn format_check_result_json(&self, result: &PairCheckResult) -> Result<String> {
        Ok(serde_json::to_string_pretty(&check_result_json(result))?)
    }

    fn format_check_result_table(&self, result: &PairCheckResult) -> String {
        let mut output = String::new();

        if result.pair_results.is_empty() {
            output.push_str(&self.colorize("No pairs checked.", "yellow"));
        } else {
            let mut builder = Builder::default();
            builder.push_record(["Condition", "Fact", "Status", "Confidence", "Explanation"]);

            for pair in &result.pair_results {
                builder.push_record([
                    pair.condition.preview(40),
                    pair.fact.preview(40),
                    self.status_label(pair.status),
                    format!("{:.2}", pair.confidence),
                    truncate(&pair.explanation, 60),
                ]);
            }

            let mut table = builder.build();
            table
                .with(Style::rounded())
                .with(Modify::new(Rows::first()).with(Alignment::center()));
            output.push_str(&table.to_string());
        }

        output.push_str("\n\n");
        output.push_str(&format!(
            "Overall: {}\n",
            self.status_label(result.overall_status)
        ));
        output.push_str(&result.summary);
        output
    }

    fn status_label(&self, status: ComplianceStatus) -> String {
        let color = match status {
            ComplianceStatus::Compliant => "green",
            ComplianceStatus::NonCompliant => "red",
            ComplianceStatus::Unrelated => "blue",
            ComplianceStatus::Unknown => "yellow",
        };
        self.colorize(status.as_str(), color)
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

/// JSON document of a pair-check result.
pub fn check_result_json(result: &PairCheckResult) -> serde_json::Value {
    let pairs: Vec<serde_json::Value> = result
        .pair_results
        .iter()
        .map(|pair| {
            serde_json::json!({
                "condition": { "id": pair.condition.id, "text": pair.condition.text },
                "fact": { "id": pair.fact.id, "text": pair.fact.text },
                "status": pair.status.as_str(),
                "confidence": pair.confidence,
                "explanation": pair.explanation,
            })
        })
        .collect();

    serde_json::json!({
        "overall_status": result.overall_status.as_str(),
        "total_count": result.total_count,
        "compliant_count": result.compliant_count(),
        "non_compliant_count": result.non_compliant_count(),
        "unrelated_count": result.unrelated_count(),
        "unknown_count": result.unknown_count(),
        "compliance_rate": result.compliance_rate,
        "summary": result.summary,
        "pair_results": pairs,
    })
}

fn optional_id(id: Option<ItemId>) -> String {
    id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string())
}

fn truncate(text: &str, max_chars: usize) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let cut: String = flat.chars().take(max_chars).collect();
    format!("{}...", cut)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pairaudit_domain::PairResult;

    fn items() -> Vec<Item> {
        vec![
            Item::condition("Reports must be submitted weekly").with_id(1),
            Item::condition("Reports must be signed")
                .with_id(2)
                .with_parent(1),
        ]
    }

    fn check_result() -> PairCheckResult {
        PairCheckResult::from_pairs(vec![PairResult {
            condition: Item::condition("Reports must be submitted weekly").with_id(1),
            fact: Item::fact("The report was submitted on Monday").with_id(1),
            status: ComplianceStatus::Compliant,
            confidence: 0.9,
            explanation: "Submitted within the week.".to_string(),
        }])
    }

    #[test]
    fn test_items_table_format() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let items = items();
        let output = formatter
            .format_items(&items, &ItemHierarchy::build(&items))
            .unwrap();
        assert!(output.contains("Parent"));
        assert!(output.contains("  Reports must be signed"));
    }

    #[test]
    fn test_items_json_format() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let items = items();
        let output = formatter
            .format_items(&items, &ItemHierarchy::build(&items))
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed[1]["parent_id"], 1);
        assert_eq!(parsed[0]["type"], "condition");
    }

    #[test]
    fn test_empty_items() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_items(&[], &ItemHierarchy::default()).unwrap();
        assert!(output.contains("No items found"));
    }

    #[test]
    fn test_check_result_table() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_check_result(&check_result()).unwrap();
        assert!(output.contains("Overall: compliant"));
        assert!(output.contains("0.90"));
    }

    #[test]
    fn test_check_result_json() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter.format_check_result(&check_result()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["overall_status"], "compliant");
        assert_eq!(parsed["compliant_count"], 1);
        assert_eq!(parsed["pair_results"][0]["fact"]["id"], 1);
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert_eq!(formatter.success("test"), "✓ test");
        assert_eq!(formatter.warning("careful"), "⚠ careful");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("line one\nline two", 8), "line one...");
    }
}
