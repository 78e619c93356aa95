//! Item files and document loading
//!
//! Items are stored as a pretty-printed JSON array of
//! `{id, text, parent_id, type, source?, condition_ids?}` objects.

use crate::error::ExtractorError;
use pairaudit_domain::{Item, ItemHierarchy, ItemId, ItemKind};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

#[derive(Debug, Serialize, Deserialize)]
struct ItemRecord {
    #[serde(default)]
    id: Option<ItemId>,
    text: String,
    #[serde(default)]
    parent_id: Option<ItemId>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    condition_ids: Option<Vec<ItemId>>,
}

impl From<&Item> for ItemRecord {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id,
            text: item.text.clone(),
            parent_id: item.parent_id,
            kind: Some(item.kind.as_str().to_string()),
            source: item.source.clone(),
            condition_ids: item.condition_ids.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct GroupRecord {
    id: Option<ItemId>,
    text: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<String>,
    facts: Vec<ItemRecord>,
}

/// Read a UTF-8 text document
pub fn load_document(path: impl AsRef<Path>) -> Result<String, ExtractorError> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(ExtractorError::ResourceNotFound(path.to_path_buf()));
    }
    Ok(std::fs::read_to_string(path)?)
}

/// Write items as a JSON array, creating parent directories
pub fn save_items(path: impl AsRef<Path>, items: &[Item]) -> Result<(), ExtractorError> {
    let records: Vec<ItemRecord> = items.iter().map(ItemRecord::from).collect();
    write_json(path.as_ref(), &records)?;
    info!("Saved {} item(s) to {}", items.len(), path.as_ref().display());
    Ok(())
}

/// Read items written by [`save_items`] and re-resolve their hierarchy
///
/// Each item takes its kind from its `type` field, or from `default_kind`
/// when the field is absent. An item with neither is rejected.
pub fn load_items(
    path: impl AsRef<Path>,
    default_kind: Option<ItemKind>,
) -> Result<(Vec<Item>, ItemHierarchy), ExtractorError> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(ExtractorError::ResourceNotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)?;
    let records: Vec<ItemRecord> = serde_json::from_str(&content)?;

    let items = records
        .into_iter()
        .enumerate()
        .map(|(idx, record)| {
            let kind = match record.kind.as_deref() {
                Some(raw) => ItemKind::parse(raw).ok_or_else(|| {
                    ExtractorError::InvalidFormat(format!("item {} has unknown type '{}'", idx, raw))
                })?,
                None => default_kind.ok_or_else(|| {
                    ExtractorError::InvalidFormat(format!(
                        "item {} has no type and no default type was given",
                        idx
                    ))
                })?,
            };
            Ok(Item {
                id: record.id,
                text: record.text,
                kind,
                source: record.source,
                parent_id: record.parent_id,
                condition_ids: record.condition_ids,
            })
        })
        .collect::<Result<Vec<_>, ExtractorError>>()?;

    let hierarchy = ItemHierarchy::build(&items);
    info!("Loaded {} item(s) from {}", items.len(), path.display());
    Ok((items, hierarchy))
}

/// Group facts under the conditions their `condition_ids` name
///
/// Conditions keep their order; a fact naming several conditions appears in
/// each of their groups, and facts naming none are left out.
pub fn group_facts_by_condition(conditions: &[Item], facts: &[Item]) -> Vec<(Item, Vec<Item>)> {
    conditions
        .iter()
        .map(|condition| {
            let related = facts
                .iter()
                .filter(|fact| match (condition.id, &fact.condition_ids) {
                    (Some(id), Some(ids)) => ids.contains(&id),
                    _ => false,
                })
                .cloned()
                .collect();
            (condition.clone(), related)
        })
        .collect()
}

/// Write condition-driven facts as `[{id, text, type, source?, facts: [...]}]`
pub fn save_grouped_facts(
    path: impl AsRef<Path>,
    groups: &[(Item, Vec<Item>)],
) -> Result<(), ExtractorError> {
    let records: Vec<GroupRecord> = groups
        .iter()
        .map(|(condition, facts)| GroupRecord {
            id: condition.id,
            text: condition.text.clone(),
            kind: condition.kind.as_str().to_string(),
            source: condition.source.clone(),
            facts: facts.iter().map(ItemRecord::from).collect(),
        })
        .collect();
    write_json(path.as_ref(), &records)?;
    info!(
        "Saved facts grouped under {} condition(s) to {}",
        groups.len(),
        path.as_ref().display()
    );
    Ok(())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ExtractorError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_items_survive_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/conditions.json");
        let items = vec![
            Item::condition("Reports must be submitted weekly")
                .with_id(1)
                .with_source("policy.md"),
            Item::condition("Reports must be signed by a manager")
                .with_id(2)
                .with_parent(1),
        ];

        save_items(&path, &items).unwrap();
        let (loaded, hierarchy) = load_items(&path, None).unwrap();

        assert_eq!(loaded, items);
        assert_eq!(hierarchy.children_of(0), &[1]);
    }

    #[test]
    fn test_saved_layout() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("facts.json");
        save_items(&path, &[Item::fact("Weekly report submitted").with_id(1)]).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let record = &json[0];
        assert_eq!(record["type"], "fact");
        assert!(record["parent_id"].is_null());
        assert!(record.get("source").is_none());
        assert!(record.get("condition_ids").is_none());
    }

    #[test]
    fn test_load_uses_default_kind() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("items.json");
        std::fs::write(
            &path,
            r#"[{"id": 1, "text": "untyped item"}, {"id": 2, "text": "typed", "type": "condition"}]"#,
        )
        .unwrap();

        let (items, _) = load_items(&path, Some(ItemKind::Fact)).unwrap();
        assert_eq!(items[0].kind, ItemKind::Fact);
        assert_eq!(items[1].kind, ItemKind::Condition);

        let err = load_items(&path, None).unwrap_err();
        assert!(matches!(err, ExtractorError::InvalidFormat(_)));
    }

    #[test]
    fn test_load_unknown_type() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("items.json");
        std::fs::write(&path, r#"[{"id": 1, "text": "x", "type": "opinion"}]"#).unwrap();
        assert!(matches!(
            load_items(&path, Some(ItemKind::Fact)),
            Err(ExtractorError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_load_dangling_parent_is_lenient() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("items.json");
        std::fs::write(&path, r#"[{"id": 1, "text": "orphan", "parent_id": 42}]"#).unwrap();

        let (items, hierarchy) = load_items(&path, Some(ItemKind::Condition)).unwrap();
        assert_eq!(items[0].parent_id, Some(42));
        assert_eq!(hierarchy.parent_of(0), None);
        assert_eq!(hierarchy.unresolved(), &[0]);
    }

    #[test]
    fn test_missing_files() {
        assert!(matches!(
            load_items("/nonexistent/items.json", None),
            Err(ExtractorError::ResourceNotFound(_))
        ));
        assert!(matches!(
            load_document("/nonexistent/doc.md"),
            Err(ExtractorError::ResourceNotFound(_))
        ));
    }

    #[test]
    fn test_invalid_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(load_items(&path, None), Err(ExtractorError::JsonParse(_))));
    }

    #[test]
    fn test_group_and_save_facts() {
        let conditions = vec![
            Item::condition("Reports must be weekly").with_id(1),
            Item::condition("Reports must be signed").with_id(2),
        ];
        let facts = vec![
            Item::fact("Weekly report submitted").with_id(1).with_condition_ids(vec![1]),
            Item::fact("Report signed weekly").with_id(2).with_condition_ids(vec![1, 2]),
            Item::fact("Unrelated statement").with_id(3),
        ];

        let groups = group_facts_by_condition(&conditions, &facts);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[1].1.len(), 1);
        assert_eq!(groups[1].1[0].id, Some(2));

        let dir = tempdir().unwrap();
        let path = dir.path().join("grouped.json");
        save_grouped_facts(&path, &groups).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json[0]["type"], "condition");
        assert_eq!(json[0]["facts"][1]["text"], "Report signed weekly");
        assert_eq!(json[1]["facts"].as_array().unwrap().len(), 1);
    }
}
