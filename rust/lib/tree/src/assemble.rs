use std::collections::HashMap;

use tracing::{debug, warn};

use crate::record::{Forest, TreeNode, TreeRecord};

/// Assemble a flat record collection into an ordered forest.
///
/// 1. Index every record by id, so a child may appear before its parent.
/// 2. Link each record under its parent; a record whose parent id is absent
///    or unknown to this collection becomes a root.
/// 3. Order every sibling list (and the roots) by `sort_key`, ties by input
///    order.
///
/// Records caught in a parent-pointer cycle are not reachable from any
/// root. They are promoted to roots (first in input order) rather than
/// dropped, so every input record appears exactly once in the output.
pub fn assemble<T: TreeRecord>(records: Vec<T>) -> Forest<T> {
    let n = records.len();

    let mut index: HashMap<T::Id, usize> = HashMap::with_capacity(n);
    for (i, record) in records.iter().enumerate() {
        // Duplicate ids: the first occurrence is the one children attach to.
        index.entry(record.id().clone()).or_insert(i);
    }

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut roots: Vec<usize> = Vec::new();
    for (i, record) in records.iter().enumerate() {
        match record.parent_id() {
            Some(pid) => match index.get(pid) {
                Some(&p) => children[p].push(i),
                None => {
                    debug!(
                        id = ?record.id(),
                        parent_id = ?pid,
                        "parent not in collection, promoting record to root"
                    );
                    roots.push(i);
                }
            },
            None => roots.push(i),
        }
    }

    let keys: Vec<i64> = records.iter().map(|r| r.sort_key()).collect();
    // Index lists are built in input order, so a stable sort keeps ties in
    // input order.
    for siblings in &mut children {
        siblings.sort_by_key(|&i| keys[i]);
    }

    let mut slots: Vec<Option<T>> = records.into_iter().map(Some).collect();
    let mut built: Vec<(usize, TreeNode<T>)> = roots
        .iter()
        .filter_map(|&i| build(i, &children, &mut slots).map(|node| (i, node)))
        .collect();

    let stranded: Vec<usize> = (0..n).filter(|&i| slots[i].is_some()).collect();
    if !stranded.is_empty() {
        warn!(
            count = stranded.len(),
            "parent pointers form a cycle, promoting unreachable records to roots"
        );
        for i in stranded {
            if let Some(node) = build(i, &children, &mut slots) {
                built.push((i, node));
            }
        }
    }

    built.sort_by(|(a, _), (b, _)| keys[*a].cmp(&keys[*b]).then(a.cmp(b)));
    built.into_iter().map(|(_, node)| node).collect()
}

fn build<T>(i: usize, children: &[Vec<usize>], slots: &mut [Option<T>]) -> Option<TreeNode<T>> {
    let record = slots[i].take()?;
    let kids = children[i]
        .iter()
        .filter_map(|&c| build(c, children, slots))
        .collect();
    Some(TreeNode {
        record,
        children: kids,
    })
}
