use std::fmt::Debug;
use std::hash::Hash;

use serde::Serialize;

/// A flat record that knows its own id and, optionally, its parent's.
///
/// A record whose parent id is absent, or names an id that is not in the
/// same collection, is a root.
pub trait TreeRecord {
    type Id: Clone + Eq + Hash + Debug;

    fn id(&self) -> &Self::Id;

    fn parent_id(&self) -> Option<&Self::Id>;

    /// Sibling ordering key, ascending. Ties keep input order.
    fn sort_key(&self) -> i64 {
        0
    }
}

/// Fields a keyword filter matches against.
pub trait Searchable {
    /// Primary display text (name / title).
    fn label(&self) -> &str;

    /// Secondary code, if the record has one.
    fn code(&self) -> Option<&str> {
        None
    }
}

/// A record plus its ordered children.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeNode<T> {
    pub record: T,
    pub children: Vec<TreeNode<T>>,
}

/// Ordered sequence of root nodes.
pub type Forest<T> = Vec<TreeNode<T>>;

impl<T> TreeNode<T> {
    pub fn leaf(record: T) -> Self {
        Self {
            record,
            children: Vec::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Visit this node and all descendants in pre-order with their depth
    /// (this node is depth 0).
    pub fn walk<'a, F>(&'a self, f: &mut F)
    where
        F: FnMut(&'a TreeNode<T>, usize),
    {
        self.walk_at(0, f);
    }

    fn walk_at<'a, F>(&'a self, depth: usize, f: &mut F)
    where
        F: FnMut(&'a TreeNode<T>, usize),
    {
        f(self, depth);
        for child in &self.children {
            child.walk_at(depth + 1, f);
        }
    }
}

impl<T: TreeRecord> TreeNode<T> {
    pub fn id(&self) -> &T::Id {
        self.record.id()
    }
}

/// Every id in the forest, pre-order.
pub fn collect_ids<T: TreeRecord>(forest: &[TreeNode<T>]) -> Vec<T::Id> {
    let mut ids = Vec::new();
    for root in forest {
        root.walk(&mut |node, _| ids.push(node.id().clone()));
    }
    ids
}

/// Total number of nodes in the forest.
pub fn count<T>(forest: &[TreeNode<T>]) -> usize {
    forest.iter().map(|n| 1 + count(&n.children)).sum()
}

/// Find a node by id anywhere in the forest.
pub fn find<'a, T: TreeRecord>(forest: &'a [TreeNode<T>], id: &T::Id) -> Option<&'a TreeNode<T>> {
    for node in forest {
        if node.id() == id {
            return Some(node);
        }
        if let Some(found) = find(&node.children, id) {
            return Some(found);
        }
    }
    None
}

/// Minimal record used by this crate's tests.
#[cfg(test)]
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Item {
    pub id: u32,
    pub parent: Option<u32>,
    pub sort: i64,
    pub name: String,
    pub code: Option<String>,
}

#[cfg(test)]
impl Item {
    pub fn new(id: u32, parent: Option<u32>) -> Self {
        Self {
            id,
            parent,
            sort: 0,
            name: format!("item-{}", id),
            code: None,
        }
    }

    pub fn named(id: u32, parent: Option<u32>, name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::new(id, parent)
        }
    }

    pub fn sorted(id: u32, parent: Option<u32>, sort: i64) -> Self {
        Self {
            sort,
            ..Self::new(id, parent)
        }
    }
}

#[cfg(test)]
impl TreeRecord for Item {
    type Id = u32;

    fn id(&self) -> &u32 {
        &self.id
    }

    fn parent_id(&self) -> Option<&u32> {
        self.parent.as_ref()
    }

    fn sort_key(&self) -> i64 {
        self.sort
    }
}

#[cfg(test)]
impl Searchable for Item {
    fn label(&self) -> &str {
        &self.name
    }

    fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Forest<Item> {
        vec![
            TreeNode {
                record: Item::new(1, None),
                children: vec![
                    TreeNode::leaf(Item::new(2, Some(1))),
                    TreeNode {
                        record: Item::new(3, Some(1)),
                        children: vec![TreeNode::leaf(Item::new(4, Some(3)))],
                    },
                ],
            },
            TreeNode::leaf(Item::new(5, None)),
        ]
    }

    #[test]
    fn collect_ids_is_preorder() {
        assert_eq!(collect_ids(&sample()), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn count_all_nodes() {
        assert_eq!(count(&sample()), 5);
        assert_eq!(count::<Item>(&[]), 0);
    }

    #[test]
    fn find_nested() {
        let forest = sample();
        assert_eq!(find(&forest, &4).map(|n| n.record.id), Some(4));
        assert!(find(&forest, &9).is_none());
    }

    #[test]
    fn walk_reports_depth() {
        let forest = sample();
        let mut seen = Vec::new();
        forest[0].walk(&mut |n, d| seen.push((n.record.id, d)));
        assert_eq!(seen, vec![(1, 0), (2, 1), (3, 1), (4, 2)]);
    }

    #[test]
    fn node_serializes_with_children() {
        #[derive(Serialize)]
        struct Label(&'static str);
        let node = TreeNode {
            record: Label("root"),
            children: vec![TreeNode::leaf(Label("child"))],
        };
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["record"], "root");
        assert_eq!(json["children"][0]["record"], "child");
    }
}
