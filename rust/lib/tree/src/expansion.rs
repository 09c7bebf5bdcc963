use std::collections::HashSet;
use std::hash::Hash;

use crate::record::{collect_ids, TreeNode, TreeRecord};

/// The set of expanded node ids for one rendered tree.
///
/// Independent of tree content: ids that are not (or no longer) in the
/// forest are simply carried along. Only [`ExpansionState::reset`] ties the
/// state back to a forest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpansionState<Id: Eq + Hash> {
    expanded: HashSet<Id>,
}

/// One drawable line of a tree: a node and its depth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibleRow<'a, T> {
    pub node: &'a TreeNode<T>,
    pub depth: usize,
    pub expanded: bool,
}

impl<Id: Clone + Eq + Hash> ExpansionState<Id> {
    /// Nothing expanded.
    pub fn new() -> Self {
        Self {
            expanded: HashSet::new(),
        }
    }

    /// Every node of a freshly assembled forest expanded.
    pub fn from_forest<T>(forest: &[TreeNode<T>]) -> Self
    where
        T: TreeRecord<Id = Id>,
    {
        let mut state = Self::new();
        state.expand_all(collect_ids(forest));
        state
    }

    /// Flip one id. Returns the new state (`true` = expanded).
    pub fn toggle(&mut self, id: &Id) -> bool {
        if self.expanded.remove(id) {
            false
        } else {
            self.expanded.insert(id.clone());
            true
        }
    }

    pub fn expand(&mut self, id: Id) {
        self.expanded.insert(id);
    }

    pub fn collapse(&mut self, id: &Id) {
        self.expanded.remove(id);
    }

    /// Add every id; ids already present are left as they are.
    pub fn expand_all<I: IntoIterator<Item = Id>>(&mut self, ids: I) {
        self.expanded.extend(ids);
    }

    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }

    pub fn is_expanded(&self, id: &Id) -> bool {
        self.expanded.contains(id)
    }

    /// Discard local toggles and expand the whole forest again.
    pub fn reset<T>(&mut self, forest: &[TreeNode<T>])
    where
        T: TreeRecord<Id = Id>,
    {
        *self = Self::from_forest(forest);
    }

    pub fn len(&self) -> usize {
        self.expanded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expanded.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Id> {
        self.expanded.iter()
    }

    /// Pre-order rows of every node whose ancestors are all expanded.
    pub fn visible<'a, T>(&self, forest: &'a [TreeNode<T>]) -> Vec<VisibleRow<'a, T>>
    where
        T: TreeRecord<Id = Id>,
    {
        let mut rows = Vec::new();
        self.push_visible(forest, 0, &mut rows);
        rows
    }

    fn push_visible<'a, T>(&self, nodes: &'a [TreeNode<T>], depth: usize, rows: &mut Vec<VisibleRow<'a, T>>)
    where
        T: TreeRecord<Id = Id>,
    {
        for node in nodes {
            let expanded = self.is_expanded(node.id());
            rows.push(VisibleRow { node, depth, expanded });
            if expanded {
                self.push_visible(&node.children, depth + 1, rows);
            }
        }
    }
}

impl<Id: Clone + Eq + Hash> Default for ExpansionState<Id> {
    fn default() -> Self {
        Self::new()
    }
}
