//! Item module - the unit of extracted meaning

use std::fmt;

/// Identifier of an item within one extraction run
///
/// Ids are assigned in oracle output order and are only unique inside the
/// run that produced them.
pub type ItemId = i64;

/// Kind of an extracted item
///
/// Only `Condition` and `Fact` are produced by extraction. The structural
/// kinds are reserved for document-outline items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    /// A normative statement a document is expected to satisfy
    Condition,

    /// A statement describing what a target document actually says
    Fact,

    /// Chapter heading
    Chapter,

    /// Section heading
    Section,

    /// Subsection heading
    Subsection,
}

impl ItemKind {
    /// Get the kind name as used in item files
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Condition => "condition",
            ItemKind::Fact => "fact",
            ItemKind::Chapter => "chapter",
            ItemKind::Section => "section",
            ItemKind::Subsection => "subsection",
        }
    }

    /// Parse a kind from its file name (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "condition" => Some(ItemKind::Condition),
            "fact" => Some(ItemKind::Fact),
            "chapter" => Some(ItemKind::Chapter),
            "section" => Some(ItemKind::Section),
            "subsection" => Some(ItemKind::Subsection),
            _ => None,
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An extracted condition or fact
///
/// Children are not stored here. They are computed by
/// [`ItemHierarchy`](crate::hierarchy::ItemHierarchy) from `parent_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    /// Run-local identifier
    pub id: Option<ItemId>,

    /// The extracted statement
    pub text: String,

    /// Condition, fact, or a structural kind
    pub kind: ItemKind,

    /// Originating file path or caller-supplied label
    pub source: Option<String>,

    /// Parent item within the same extraction result
    pub parent_id: Option<ItemId>,

    /// Conditions that motivated a condition-driven fact
    pub condition_ids: Option<Vec<ItemId>>,
}

impl Item {
    /// Create an item with only text and kind set
    ///
    /// # Examples
    ///
    /// ```
    /// use pairaudit_domain::{Item, ItemKind};
    ///
    /// let item = Item::new("Reports must be submitted weekly", ItemKind::Condition)
    ///     .with_id(1);
    /// assert_eq!(item.id, Some(1));
    /// assert!(item.is_condition());
    /// ```
    pub fn new(text: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            id: None,
            text: text.into(),
            kind,
            source: None,
            parent_id: None,
            condition_ids: None,
        }
    }

    /// Shorthand for a condition item
    pub fn condition(text: impl Into<String>) -> Self {
        Self::new(text, ItemKind::Condition)
    }

    /// Shorthand for a fact item
    pub fn fact(text: impl Into<String>) -> Self {
        Self::new(text, ItemKind::Fact)
    }

    /// Set the id
    pub fn with_id(mut self, id: ItemId) -> Self {
        self.id = Some(id);
        self
    }

    /// Set the parent id
    pub fn with_parent(mut self, parent_id: ItemId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Set the source label
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Set the motivating condition ids
    pub fn with_condition_ids(mut self, ids: Vec<ItemId>) -> Self {
        self.condition_ids = Some(ids);
        self
    }

    /// Whether this item is a condition
    pub fn is_condition(&self) -> bool {
        self.kind == ItemKind::Condition
    }

    /// Whether this item is a fact
    pub fn is_fact(&self) -> bool {
        self.kind == ItemKind::Fact
    }

    /// Text truncated to `max_chars` characters, for log lines
    pub fn preview(&self, max_chars: usize) -> String {
        let mut chars = self.text.chars();
        let head: String = chars.by_ref().take(max_chars).collect();
        if chars.next().is_some() {
            format!("{}...", head)
        } else {
            head
        }
    }
}
