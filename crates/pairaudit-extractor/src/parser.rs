//! Parse oracle output into extracted items
//!
//! A parse failure is returned as [`SchemaValidationError`]; the pipeline
//! reacts to it with a retry and then a critic repair.

use crate::error::SchemaValidationError;
use crate::types::ExtractedItem;
use pairaudit_domain::ItemId;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::LazyLock;

static JSON_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json|JSON)[ \t]*\r?\n?(.*?)```").expect("json fence pattern is valid")
});

static ANY_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[A-Za-z]*[ \t]*\r?\n?(.*?)```").expect("fence pattern is valid")
});

/// Parse an oracle extraction response into items
///
/// The payload is the first ```` ```json ```` fenced block, else the first
/// fenced block of any kind, else the whole response. It must be a JSON
/// array of objects with a string `text`; `id`, `parent_id` and
/// `condition_ids` are optional, and `condition_id` is accepted as an alias
/// of `condition_ids`.
///
/// # Examples
///
/// ```
/// use pairaudit_extractor::parse_extraction_response;
///
/// let items = parse_extraction_response(r#"[{"id": 1, "text": "Reports are weekly"}]"#).unwrap();
/// assert_eq!(items[0].id, Some(1));
/// ```
pub fn parse_extraction_response(response: &str) -> Result<Vec<ExtractedItem>, SchemaValidationError> {
    let payload = extract_json(response);

    let json: Value =
        serde_json::from_str(payload).map_err(|e| SchemaValidationError::NotJson(e.to_string()))?;

    let elements = match json {
        Value::Array(elements) => elements,
        other => return Err(SchemaValidationError::NotAnArray(json_kind(&other).to_string())),
    };

    elements
        .into_iter()
        .enumerate()
        .map(|(index, element)| {
            parse_item_json(element)
                .map_err(|reason| SchemaValidationError::InvalidItem { index, reason })
        })
        .collect()
}

/// De-duplicate by exact text and drop short items
///
/// The first occurrence of each text is kept, in order. Items whose text has
/// `min_chars` characters or fewer are dropped.
pub fn post_process_extracted_items(items: Vec<ExtractedItem>, min_chars: usize) -> Vec<ExtractedItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.text.clone()))
        .filter(|item| item.text.chars().count() > min_chars)
        .collect()
}

/// Locate the JSON payload, handling markdown code blocks
fn extract_json(response: &str) -> &str {
    let captures = JSON_FENCE
        .captures(response)
        .or_else(|| ANY_FENCE.captures(response));

    match captures.and_then(|c| c.get(1)) {
        Some(body) => body.as_str().trim(),
        None => response.trim(),
    }
}

fn parse_item_json(element: Value) -> Result<ExtractedItem, String> {
    let mut obj = match element {
        Value::Object(obj) => obj,
        other => return Err(format!("expected an object, found {}", json_kind(&other))),
    };
    normalize_condition_ids(&mut obj);

    let text = match obj.get("text") {
        Some(Value::String(text)) => text.trim().to_string(),
        Some(other) => return Err(format!("'text' must be a string, found {}", json_kind(other))),
        None => return Err("missing required field 'text'".to_string()),
    };

    let id = optional_id(&obj, "id")?;
    let parent_id = optional_id(&obj, "parent_id")?;

    let condition_ids = match obj.get("condition_ids") {
        None | Some(Value::Null) => None,
        Some(Value::Array(values)) => Some(
            values
                .iter()
                .map(|v| id_value(v).ok_or_else(|| format!("'condition_ids' entry {} is not an id", v)))
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Some(other) => {
            return Err(format!(
                "'condition_ids' must be an array, found {}",
                json_kind(other)
            ))
        }
    };

    Ok(ExtractedItem {
        id,
        text,
        parent_id,
        condition_ids,
    })
}

/// Rename `condition_id` to `condition_ids`, wrapping a scalar in an array
fn normalize_condition_ids(obj: &mut Map<String, Value>) {
    if let Some(value) = obj.remove("condition_id") {
        if obj.contains_key("condition_ids") {
            return;
        }
        let value = match value {
            Value::Array(_) | Value::Null => value,
            scalar => Value::Array(vec![scalar]),
        };
        obj.insert("condition_ids".to_string(), value);
    }
}

fn optional_id(obj: &Map<String, Value>, field: &str) -> Result<Option<ItemId>, String> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => id_value(value)
            .map(Some)
            .ok_or_else(|| format!("'{}' must be an integer, found {}", field, value)),
    }
}

/// Integer ids, also accepted as digit strings
fn id_value(value: &Value) -> Option<ItemId> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fenced_json() {
        let response = "Here are the items:\n```json\n[{\"id\": 1, \"text\": \"Reports are weekly\"}]\n```\nDone.";
        let items = parse_extraction_response(response).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].text, "Reports are weekly");
    }

    #[test]
    fn test_parse_bare_fence() {
        let response = "```\n[{\"text\": \"Reports are weekly\"}]\n```";
        let items = parse_extraction_response(response).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, None);
    }

    #[test]
    fn test_json_fence_preferred_over_earlier_fence() {
        let response = "```text\nnot it\n```\n```json\n[{\"text\": \"the payload\"}]\n```";
        let items = parse_extraction_response(response).unwrap();
        assert_eq!(items[0].text, "the payload");
    }

    #[test]
    fn test_parse_unfenced_json() {
        let response = r#"  [{"id": 2, "text": "Weekly report submitted", "parent_id": 1}]  "#;
        let items = parse_extraction_response(response).unwrap();
        assert_eq!(items[0].id, Some(2));
        assert_eq!(items[0].parent_id, Some(1));
    }

    #[test]
    fn test_condition_id_alias() {
        let response = r#"[
            {"text": "scalar alias", "condition_id": 4},
            {"text": "array alias", "condition_id": [1, "2"]},
            {"text": "canonical", "condition_ids": [3]}
        ]"#;
        let items = parse_extraction_response(response).unwrap();
        assert_eq!(items[0].condition_ids, Some(vec![4]));
        assert_eq!(items[1].condition_ids, Some(vec![1, 2]));
        assert_eq!(items[2].condition_ids, Some(vec![3]));
    }

    #[test]
    fn test_not_json() {
        let err = parse_extraction_response("I could not find anything").unwrap_err();
        assert!(matches!(err, SchemaValidationError::NotJson(_)));
    }

    #[test]
    fn test_not_an_array() {
        let err = parse_extraction_response(r#"{"text": "single"}"#).unwrap_err();
        assert_eq!(err, SchemaValidationError::NotAnArray("an object".to_string()));
    }

    #[test]
    fn test_missing_text_invalidates_response() {
        let err = parse_extraction_response(r#"[{"text": "ok item"}, {"id": 2}]"#).unwrap_err();
        assert!(matches!(err, SchemaValidationError::InvalidItem { index: 1, .. }));
    }

    #[test]
    fn test_wrong_field_types() {
        assert!(parse_extraction_response(r#"[{"text": 5}]"#).is_err());
        assert!(parse_extraction_response(r#"[{"text": "x", "id": "one"}]"#).is_err());
        assert!(parse_extraction_response(r#"[{"text": "x", "condition_ids": "1"}]"#).is_err());
        assert!(parse_extraction_response(r#"["just a string"]"#).is_err());
    }

    #[test]
    fn test_empty_array_is_valid() {
        assert!(parse_extraction_response("[]").unwrap().is_empty());
    }

    #[test]
    fn test_post_process_dedup_and_filter() {
        let items = vec![
            ExtractedItem::with_text("Reports are weekly"),
            ExtractedItem::with_text("short"),
            ExtractedItem::with_text("Reports are signed"),
            ExtractedItem::with_text("Reports are weekly"),
            ExtractedItem::with_text("sixsix"),
        ];
        let texts: Vec<String> = post_process_extracted_items(items, 5)
            .into_iter()
            .map(|i| i.text)
            .collect();
        assert_eq!(texts, vec!["Reports are weekly", "Reports are signed", "sixsix"]);
    }
}
