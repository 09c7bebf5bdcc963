use std::collections::HashSet;

use crate::assemble::assemble;
use crate::expansion::{ExpansionState, VisibleRow};
use crate::filter::filter_by_keyword;
use crate::record::{collect_ids, Forest, Searchable, TreeRecord};

/// Tree state for one screen: the loaded records assembled into a forest,
/// the keyword-filtered forest that is actually drawn, and expansion.
///
/// Reloading records resets expansion to "everything expanded". Changing
/// the keyword only refilters; ids shown for the first time are expanded,
/// ids the user collapsed stay collapsed.
#[derive(Debug, Clone)]
pub struct TreeView<T: TreeRecord> {
    forest: Forest<T>,
    filtered: Forest<T>,
    keyword: String,
    expansion: ExpansionState<T::Id>,
    seen: HashSet<T::Id>,
}

impl<T> TreeView<T>
where
    T: TreeRecord + Searchable + Clone,
{
    pub fn new(records: Vec<T>) -> Self {
        let forest = assemble(records);
        let expansion = ExpansionState::from_forest(&forest);
        let seen = collect_ids(&forest).into_iter().collect();
        Self {
            filtered: forest.clone(),
            forest,
            keyword: String::new(),
            expansion,
            seen,
        }
    }

    /// Replace the record set (e.g. another system or organization was
    /// selected). The keyword is kept and reapplied.
    pub fn load(&mut self, records: Vec<T>) {
        let keyword = std::mem::take(&mut self.keyword);
        *self = Self::new(records);
        self.set_keyword(&keyword);
    }

    pub fn set_keyword(&mut self, keyword: &str) {
        self.keyword = keyword.to_string();
        self.filtered = filter_by_keyword(&self.forest, keyword);
        for id in collect_ids(&self.filtered) {
            if self.seen.insert(id.clone()) {
                self.expansion.expand(id);
            }
        }
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// The full, unfiltered forest.
    pub fn forest(&self) -> &[crate::TreeNode<T>] {
        &self.forest
    }

    /// The forest after keyword filtering.
    pub fn filtered(&self) -> &[crate::TreeNode<T>] {
        &self.filtered
    }

    pub fn toggle(&mut self, id: &T::Id) -> bool {
        self.expansion.toggle(id)
    }

    pub fn is_expanded(&self, id: &T::Id) -> bool {
        self.expansion.is_expanded(id)
    }

    pub fn expand_all(&mut self) {
        self.expansion.expand_all(collect_ids(&self.forest));
    }

    pub fn collapse_all(&mut self) {
        self.expansion.collapse_all();
    }

    pub fn reset_expansion(&mut self) {
        self.expansion.reset(&self.forest);
    }

    pub fn expansion(&self) -> &ExpansionState<T::Id> {
        &self.expansion
    }

    /// Rows to draw, from the filtered forest.
    pub fn rows(&self) -> Vec<VisibleRow<'_, T>> {
        self.expansion.visible(&self.filtered)
    }
}
