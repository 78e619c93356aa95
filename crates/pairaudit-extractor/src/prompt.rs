//! Prompt templates and rendering
//!
//! Templates use `{name}` placeholders; `{{` and `}}` produce literal braces
//! so JSON samples can be embedded.

use crate::error::{ExtractorError, TemplateError};
use crate::structure::{Block, StructureAnalyzer};
use pairaudit_domain::Item;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Template names, also the file stems used by [`PromptTemplates::from_dir`]
pub const TEMPLATE_NAMES: [&str; 4] = [
    "condition_extraction",
    "fact_extraction",
    "critic_repair",
    "pair_check",
];

/// The four prompt templates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptTemplates {
    /// Condition extraction; needs `{text}`
    pub condition_extraction: String,

    /// Fact extraction; needs `{text}`, and `{conditions_list}` when conditions drive it
    pub fact_extraction: String,

    /// Critic repair; needs `{original_prompt}`, `{llm_response}`, `{error_message}`
    pub critic_repair: String,

    /// Pair check; needs `{condition}` and `{fact}`
    pub pair_check: String,
}

impl PromptTemplates {
    /// Check every template parses and has its required placeholders
    pub fn validate(&self) -> Result<(), TemplateError> {
        require("condition_extraction", &self.condition_extraction, &["text"])?;
        require("fact_extraction", &self.fact_extraction, &["text"])?;
        require(
            "critic_repair",
            &self.critic_repair,
            &["original_prompt", "llm_response", "error_message"],
        )?;
        require("pair_check", &self.pair_check, &["condition", "fact"])?;
        Ok(())
    }

    /// Load templates from `<dir>/<name>.txt`, keeping defaults for absent files
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, ExtractorError> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(ExtractorError::ResourceNotFound(dir.to_path_buf()));
        }

        let mut templates = Self::default();
        for name in TEMPLATE_NAMES {
            let path = dir.join(format!("{}.txt", name));
            if !path.is_file() {
                continue;
            }
            let content = std::fs::read_to_string(&path)?;
            debug!("Loaded prompt template '{}' from {}", name, path.display());
            match name {
                "condition_extraction" => templates.condition_extraction = content,
                "fact_extraction" => templates.fact_extraction = content,
                "critic_repair" => templates.critic_repair = content,
                _ => templates.pair_check = content,
            }
        }

        templates.validate()?;
        Ok(templates)
    }
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            condition_extraction: CONDITION_EXTRACTION_TEMPLATE.to_string(),
            fact_extraction: FACT_EXTRACTION_TEMPLATE.to_string(),
            critic_repair: CRITIC_REPAIR_TEMPLATE.to_string(),
            pair_check: PAIR_CHECK_TEMPLATE.to_string(),
        }
    }
}

/// Substitute `values` into `template`
///
/// # Examples
///
/// ```
/// use pairaudit_extractor::prompt::render;
///
/// let out = render("greeting", "{{\"to\": \"{name}\"}}", &[("name", "Ada")]).unwrap();
/// assert_eq!(out, "{\"to\": \"Ada\"}");
/// ```
pub fn render(
    template_name: &str,
    template: &str,
    values: &[(&str, &str)],
) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    for segment in segments(template_name, template)? {
        match segment {
            Segment::Literal(text) => out.push_str(text),
            Segment::Brace(c) => out.push(c),
            Segment::Placeholder(name) => {
                let value = values
                    .iter()
                    .find(|(key, _)| *key == name)
                    .map(|(_, value)| *value)
                    .ok_or_else(|| TemplateError::UnknownPlaceholder {
                        template: template_name.to_string(),
                        placeholder: name.to_string(),
                    })?;
                out.push_str(value);
            }
        }
    }
    Ok(out)
}

/// Placeholder names used by a template, in order of appearance
pub fn placeholders<'a>(
    template_name: &str,
    template: &'a str,
) -> Result<Vec<&'a str>, TemplateError> {
    Ok(segments(template_name, template)?
        .into_iter()
        .filter_map(|s| match s {
            Segment::Placeholder(name) => Some(name),
            _ => None,
        })
        .collect())
}

enum Segment<'a> {
    Literal(&'a str),
    Brace(char),
    Placeholder(&'a str),
}

fn segments<'a>(template_name: &str, template: &'a str) -> Result<Vec<Segment<'a>>, TemplateError> {
    let mut segments = Vec::new();
    let mut rest = template;

    while let Some(pos) = rest.find(['{', '}']) {
        if pos > 0 {
            segments.push(Segment::Literal(&rest[..pos]));
        }
        let tail = &rest[pos..];

        if tail.starts_with("{{") {
            segments.push(Segment::Brace('{'));
            rest = &tail[2..];
        } else if tail.starts_with("}}") {
            segments.push(Segment::Brace('}'));
            rest = &tail[2..];
        } else if tail.starts_with('}') {
            segments.push(Segment::Brace('}'));
            rest = &tail[1..];
        } else {
            let close = tail.find('}').ok_or_else(|| TemplateError::UnclosedPlaceholder {
                template: template_name.to_string(),
            })?;
            segments.push(Segment::Placeholder(&tail[1..close]));
            rest = &tail[close + 1..];
        }
    }

    if !rest.is_empty() {
        segments.push(Segment::Literal(rest));
    }
    Ok(segments)
}

fn require(template_name: &str, template: &str, required: &[&str]) -> Result<(), TemplateError> {
    let used = placeholders(template_name, template)?;
    for placeholder in required {
        if !used.contains(placeholder) {
            return Err(TemplateError::MissingPlaceholder {
                template: template_name.to_string(),
                placeholder: placeholder.to_string(),
            });
        }
    }
    Ok(())
}

/// Renders the four prompt kinds from a template set
#[derive(Debug, Clone, Default)]
pub struct PromptGenerator {
    templates: PromptTemplates,
}

impl PromptGenerator {
    /// Create a generator over the given templates
    pub fn new(templates: PromptTemplates) -> Self {
        Self { templates }
    }

    /// The template set in use
    pub fn templates(&self) -> &PromptTemplates {
        &self.templates
    }

    /// Prompt asking for the conditions stated in `text`
    pub fn condition_extraction_prompt(
        &self,
        text: &str,
        blocks: &[Block],
    ) -> Result<String, TemplateError> {
        let summary = StructureAnalyzer::create_structure_summary(blocks);
        render(
            "condition_extraction",
            &self.templates.condition_extraction,
            &[("text", text), ("structure_summary", &summary)],
        )
    }

    /// Prompt asking for the facts stated in `text`
    ///
    /// With a non-empty `conditions` slice the template must reference
    /// `{conditions_list}`, which renders one `condition_id: content` line
    /// per condition.
    pub fn fact_extraction_prompt(
        &self,
        text: &str,
        blocks: &[Block],
        conditions: &[Item],
    ) -> Result<String, TemplateError> {
        let conditions_list = if conditions.is_empty() {
            "(none)".to_string()
        } else {
            require(
                "fact_extraction",
                &self.templates.fact_extraction,
                &["conditions_list"],
            )?;
            format_conditions_list(conditions)
        };

        let summary = StructureAnalyzer::create_structure_summary(blocks);
        render(
            "fact_extraction",
            &self.templates.fact_extraction,
            &[
                ("text", text),
                ("structure_summary", &summary),
                ("conditions_list", &conditions_list),
            ],
        )
    }

    /// Prompt asking the critic to repair a malformed response
    pub fn critic_prompt(
        &self,
        original_prompt: &str,
        llm_response: &str,
        error_message: &str,
    ) -> Result<String, TemplateError> {
        render(
            "critic_repair",
            &self.templates.critic_repair,
            &[
                ("original_prompt", original_prompt),
                ("llm_response", llm_response),
                ("error_message", error_message),
            ],
        )
    }

    /// Prompt asking for a compliance judgment on one pair
    pub fn pair_check_prompt(&self, condition: &str, fact: &str) -> Result<String, TemplateError> {
        render(
            "pair_check",
            &self.templates.pair_check,
            &[("condition", condition), ("fact", fact)],
        )
    }
}

fn format_conditions_list(conditions: &[Item]) -> String {
    conditions
        .iter()
        .map(|c| match c.id {
            Some(id) => format!("{}: {}", id, c.text),
            None => format!("-: {}", c.text),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

const CONDITION_EXTRACTION_TEMPLATE: &str = r#"Extract every condition (requirement, rule or constraint) the following document states.

{structure_summary}

Rules:
- One condition per item, phrased as a complete sentence
- Keep the wording of the source where possible
- Use the headings to give each condition its context
- When a condition refines another one, set "parent_id" to the parent's "id"

Document:
---
{text}
---

Output format (JSON array only):
```json
[
  {{"id": 1, "text": "condition text", "parent_id": null}}
]
```"#;

const FACT_EXTRACTION_TEMPLATE: &str = r#"Extract the facts the following document states.

{structure_summary}

Conditions the facts will be checked against:
{conditions_list}

Rules:
- One fact per item, phrased as a complete sentence
- Keep the wording of the source where possible
- When conditions are listed, extract the facts relevant to them and list
  the ids of those conditions in "condition_ids"
- When a fact refines another one, set "parent_id" to the parent's "id"

Document:
---
{text}
---

Output format (JSON array only):
```json
[
  {{"id": 1, "text": "fact text", "parent_id": null, "condition_ids": [1]}}
]
```"#;

const CRITIC_REPAIR_TEMPLATE: &str = r#"A previous answer did not match the required format. Repair it.

Original request:
---
{original_prompt}
---

Previous answer:
---
{llm_response}
---

Validation error:
{error_message}

Return only the corrected JSON array, with the same items, in a ```json fenced block."#;

const PAIR_CHECK_TEMPLATE: &str = r#"Judge whether the fact complies with the condition.

Condition:
{condition}

Fact:
{fact}

Answer with exactly these three sections:

## 遵守状態
one of: compliant, non_compliant, unrelated

## 信頼度
a number between 0.0 and 1.0

## 説明
a short explanation of the judgment"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_templates_are_valid() {
        assert!(PromptTemplates::default().validate().is_ok());
    }

    #[test]
    fn test_render_substitutes_and_unescapes() {
        let out = render("t", "a {x} {{b}} c}", &[("x", "1")]).unwrap();
        assert_eq!(out, "a 1 {b} c}");
    }

    #[test]
    fn test_render_value_braces_are_not_reinterpreted() {
        let out = render("t", "[{x}]", &[("x", "{y}")]).unwrap();
        assert_eq!(out, "[{y}]");
    }

    #[test]
    fn test_unknown_placeholder() {
        let err = render("t", "hello {who}", &[]).unwrap_err();
        assert_eq!(
            err,
            TemplateError::UnknownPlaceholder {
                template: "t".to_string(),
                placeholder: "who".to_string(),
            }
        );
    }

    #[test]
    fn test_unclosed_placeholder() {
        let err = render("t", "hello {who", &[("who", "x")]).unwrap_err();
        assert!(matches!(err, TemplateError::UnclosedPlaceholder { .. }));
    }

    #[test]
    fn test_missing_required_placeholder() {
        let templates = PromptTemplates {
            pair_check: "only {condition}".to_string(),
            ..PromptTemplates::default()
        };
        let err = templates.validate().unwrap_err();
        assert_eq!(
            err,
            TemplateError::MissingPlaceholder {
                template: "pair_check".to_string(),
                placeholder: "fact".to_string(),
            }
        );
    }

    #[test]
    fn test_conditions_rendered_as_id_lines() {
        let generator = PromptGenerator::default();
        let conditions = vec![
            Item::condition("Reports must be weekly").with_id(3),
            Item::condition("Reports must be signed").with_id(7),
        ];
        let prompt = generator
            .fact_extraction_prompt("body", &[], &conditions)
            .unwrap();
        assert!(prompt.contains("3: Reports must be weekly\n7: Reports must be signed"));
        assert!(prompt.contains("\"condition_ids\": [1]"));
    }

    #[test]
    fn test_unconditioned_fact_prompt() {
        let generator = PromptGenerator::default();
        let prompt = generator.fact_extraction_prompt("body", &[], &[]).unwrap();
        assert!(prompt.contains("(none)"));
    }

    #[test]
    fn test_conditions_need_conditions_list_placeholder() {
        let generator = PromptGenerator::new(PromptTemplates {
            fact_extraction: "facts in {text}".to_string(),
            ..PromptTemplates::default()
        });
        assert!(generator.fact_extraction_prompt("body", &[], &[]).is_ok());

        let conditions = vec![Item::condition("Be weekly").with_id(1)];
        let err = generator
            .fact_extraction_prompt("body", &[], &conditions)
            .unwrap_err();
        assert!(matches!(err, TemplateError::MissingPlaceholder { .. }));
    }

    #[test]
    fn test_condition_prompt_includes_structure_summary() {
        let analyzer = StructureAnalyzer::default();
        let text = "# Policy\n- Submit weekly reports";
        let blocks = analyzer.analyze(text);
        let prompt = PromptGenerator::default()
            .condition_extraction_prompt(text, &blocks)
            .unwrap();
        assert!(prompt.contains("- Policy"));
        assert!(prompt.contains(text));
    }

    #[test]
    fn test_critic_prompt_embeds_all_parts() {
        let prompt = PromptGenerator::default()
            .critic_prompt("ORIGINAL", "RESPONSE", "ERROR")
            .unwrap();
        assert!(prompt.contains("ORIGINAL"));
        assert!(prompt.contains("RESPONSE"));
        assert!(prompt.contains("ERROR"));
    }

    #[test]
    fn test_from_dir_overrides_and_validates() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("pair_check.txt"),
            "C={condition} F={fact}",
        )
        .unwrap();

        let templates = PromptTemplates::from_dir(dir.path()).unwrap();
        assert_eq!(templates.pair_check, "C={condition} F={fact}");
        assert_eq!(
            templates.condition_extraction,
            PromptTemplates::default().condition_extraction
        );

        std::fs::write(dir.path().join("critic_repair.txt"), "no placeholders").unwrap();
        assert!(matches!(
            PromptTemplates::from_dir(dir.path()),
            Err(ExtractorError::Template(_))
        ));
    }

    #[test]
    fn test_from_missing_dir() {
        let result = PromptTemplates::from_dir("/nonexistent/pairaudit/prompts");
        assert!(matches!(result, Err(ExtractorError::ResourceNotFound(_))));
    }
}
