//! Parent/child resolution over one extraction batch
//!
//! Items never hold back-references. The hierarchy is an arena of indices
//! into the item slice it was built from, so links are resolved by lookup and
//! malformed oracle output cannot create ownership cycles.

use crate::item::{Item, ItemId};
use std::collections::HashMap;

/// Resolved parent/child links for a slice of items
///
/// # Examples
///
/// ```
/// use pairaudit_domain::{Item, ItemHierarchy};
///
/// let items = vec![
///     Item::condition("Reports must be submitted").with_id(1),
///     Item::condition("Reports are due on Fridays").with_id(2).with_parent(1),
/// ];
/// let hierarchy = ItemHierarchy::build(&items);
/// assert_eq!(hierarchy.children_of(0), &[1]);
/// assert_eq!(hierarchy.parent_of(1), Some(0));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemHierarchy {
    positions: HashMap<ItemId, usize>,
    parents: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
    unresolved: Vec<usize>,
    rejected: Vec<usize>,
}

impl ItemHierarchy {
    /// Resolve `parent_id` links against sibling ids in `items`
    ///
    /// The first item carrying an id owns it. Dangling parent ids are
    /// recorded in [`unresolved`](Self::unresolved); self-references and
    /// links that would close a cycle are recorded in
    /// [`rejected`](Self::rejected). Neither is an error.
    pub fn build(items: &[Item]) -> Self {
        let mut positions = HashMap::new();
        for (idx, item) in items.iter().enumerate() {
            if let Some(id) = item.id {
                positions.entry(id).or_insert(idx);
            }
        }

        let mut hierarchy = Self {
            positions,
            parents: vec![None; items.len()],
            children: vec![Vec::new(); items.len()],
            unresolved: Vec::new(),
            rejected: Vec::new(),
        };

        for (idx, item) in items.iter().enumerate() {
            let Some(parent_id) = item.parent_id else {
                continue;
            };
            let Some(&parent) = hierarchy.positions.get(&parent_id) else {
                hierarchy.unresolved.push(idx);
                continue;
            };
            if parent == idx || hierarchy.is_ancestor(idx, parent) {
                hierarchy.rejected.push(idx);
                continue;
            }
            hierarchy.parents[idx] = Some(parent);
            hierarchy.children[parent].push(idx);
        }

        hierarchy
    }

    /// Whether `ancestor` is reachable by walking up from `node`
    fn is_ancestor(&self, ancestor: usize, node: usize) -> bool {
        let mut current = Some(node);
        let mut steps = 0;
        while let Some(idx) = current {
            if idx == ancestor {
                return true;
            }
            steps += 1;
            if steps > self.parents.len() {
                return true;
            }
            current = self.parents[idx];
        }
        false
    }

    /// Number of items the hierarchy was built over
    pub fn len(&self) -> usize {
        self.parents.len()
    }

    /// Whether the hierarchy is empty
    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    /// Position of the item owning `id`
    pub fn position_of(&self, id: ItemId) -> Option<usize> {
        self.positions.get(&id).copied()
    }

    /// Position of the resolved parent of the item at `idx`
    pub fn parent_of(&self, idx: usize) -> Option<usize> {
        self.parents.get(idx).copied().flatten()
    }

    /// Positions of the resolved children of the item at `idx`
    pub fn children_of(&self, idx: usize) -> &[usize] {
        self.children.get(idx).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Children of the item owning `id`, borrowed from `items`
    pub fn children_by_id<'a>(&self, items: &'a [Item], id: ItemId) -> Vec<&'a Item> {
        self.position_of(id)
            .map(|idx| {
                self.children_of(idx)
                    .iter()
                    .filter_map(|&child| items.get(child))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Positions of items without a resolved parent, in input order
    pub fn roots(&self) -> Vec<usize> {
        (0..self.parents.len())
            .filter(|&idx| self.parents[idx].is_none())
            .collect()
    }

    /// Number of resolved ancestors of the item at `idx`
    pub fn depth_of(&self, idx: usize) -> usize {
        let mut depth = 0;
        let mut current = self.parent_of(idx);
        while let Some(parent) = current {
            depth += 1;
            current = self.parent_of(parent);
        }
        depth
    }

    /// Items whose `parent_id` matched no sibling
    pub fn unresolved(&self) -> &[usize] {
        &self.unresolved
    }

    /// Items whose parent link was dropped as a self-reference or cycle
    pub fn rejected(&self) -> &[usize] {
        &self.rejected
    }
}
