//! Result types for extraction

use pairaudit_domain::{Item, ItemHierarchy, ItemId};

/// Result of an extraction run
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    /// Extracted items, in oracle output order across chunks and batches
    pub items: Vec<Item>,

    /// Parent/child links resolved over `items`
    pub hierarchy: ItemHierarchy,

    /// Units whose extraction was abandoned
    pub failures: Vec<ChunkFailure>,

    /// Metadata about the run
    pub metadata: ExtractionMetadata,
}

impl ExtractionResult {
    /// Items of the run that are children of the item with `id`
    pub fn children_of(&self, id: ItemId) -> Vec<&Item> {
        self.hierarchy.children_by_id(&self.items, id)
    }
}

/// A chunk (or chunk/condition-batch pair) whose extraction was abandoned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkFailure {
    /// Zero-based chunk position
    pub chunk_index: usize,

    /// Zero-based condition batch within the chunk; `None` when unconditioned
    pub batch_index: Option<usize>,

    /// Last validation error
    pub reason: String,
}

/// Metadata about an extraction run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionMetadata {
    /// Source label given by the caller
    pub source: Option<String>,

    /// Number of chunks the text was split into
    pub chunk_count: usize,

    /// Number of prompts built (chunks times condition batches)
    pub batch_count: usize,

    /// Number of abandoned units
    pub abandoned_count: usize,

    /// Successful primary oracle calls
    pub oracle_calls: usize,

    /// Successful critic oracle calls
    pub critic_calls: usize,

    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

/// One item as emitted by the oracle, before renumbering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedItem {
    /// Id local to the oracle response
    pub id: Option<ItemId>,

    /// Statement text, trimmed
    pub text: String,

    /// Parent id, local to the oracle response
    pub parent_id: Option<ItemId>,

    /// Referenced condition ids
    pub condition_ids: Option<Vec<ItemId>>,
}

impl ExtractedItem {
    #[cfg(test)]
    pub(crate) fn with_text(text: &str) -> Self {
        Self {
            id: None,
            text: text.to_string(),
            parent_id: None,
            condition_ids: None,
        }
    }
}
