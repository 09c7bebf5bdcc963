use crate::record::{Forest, Searchable, TreeNode};

/// Prune a forest to the nodes that match `predicate` or have at least one
/// surviving descendant.
///
/// Children are filtered before their parent decides (post-order), so a
/// non-matching node survives exactly when some branch below it does. The
/// input is left untouched; surviving records are cloned.
pub fn filter<T, F>(forest: &[TreeNode<T>], predicate: F) -> Forest<T>
where
    T: Clone,
    F: Fn(&T) -> bool,
{
    prune(forest, &predicate)
}

fn prune<T, F>(nodes: &[TreeNode<T>], predicate: &F) -> Forest<T>
where
    T: Clone,
    F: Fn(&T) -> bool,
{
    nodes
        .iter()
        .filter_map(|node| {
            let children = prune(&node.children, predicate);
            if children.is_empty() && !predicate(&node.record) {
                None
            } else {
                Some(TreeNode {
                    record: node.record.clone(),
                    children,
                })
            }
        })
        .collect()
}

/// Keyword filter with the console's matching rule.
///
/// The keyword is trimmed; an empty keyword returns the forest unchanged.
/// Otherwise a record matches when its label or its code contains the
/// keyword, compared case-insensitively.
pub fn filter_by_keyword<T>(forest: &[TreeNode<T>], keyword: &str) -> Forest<T>
where
    T: Clone + Searchable,
{
    let matcher = KeywordMatcher::new(keyword);
    if matcher.is_empty() {
        return forest.to_vec();
    }
    filter(forest, |record| matcher.matches(record))
}

/// Case-insensitive substring matcher over [`Searchable`] fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordMatcher {
    needle: String,
}

impl KeywordMatcher {
    pub fn new(keyword: &str) -> Self {
        Self {
            needle: keyword.trim().to_lowercase(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.needle.is_empty()
    }

    pub fn matches_text(&self, text: &str) -> bool {
        self.needle.is_empty() || text.to_lowercase().contains(&self.needle)
    }

    pub fn matches<T: Searchable + ?Sized>(&self, record: &T) -> bool {
        self.matches_text(record.label())
            || record.code().map(|c| self.matches_text(c)).unwrap_or(false)
    }
}
