use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::model::{Candidate, Id, Menu, MenuOperation, RoleBindings};
use crate::service::search::PendingSelection;

/// The four permission categories a role owns.
///
/// Menus and menu operations are separate categories: checking a menu does
/// not check its operations and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PermissionCategory {
    Users,
    Menus,
    MenuOperations,
    DataResourceInterfaces,
}

impl PermissionCategory {
    pub const ALL: [PermissionCategory; 4] = [
        PermissionCategory::Users,
        PermissionCategory::Menus,
        PermissionCategory::MenuOperations,
        PermissionCategory::DataResourceInterfaces,
    ];
}

impl fmt::Display for PermissionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PermissionCategory::Users => "users",
            PermissionCategory::Menus => "menus",
            PermissionCategory::MenuOperations => "menu operations",
            PermissionCategory::DataResourceInterfaces => "data-resource interfaces",
        })
    }
}

/// A plain identifier set. Adding a member twice or removing an absent
/// one changes nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdSet {
    ids: BTreeSet<Id>,
}

impl IdSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `id` was not already a member.
    pub fn add(&mut self, id: Id) -> bool {
        self.ids.insert(id)
    }

    /// Returns `true` if `id` was a member.
    pub fn remove(&mut self, id: Id) -> bool {
        self.ids.remove(&id)
    }

    pub fn contains(&self, id: Id) -> bool {
        self.ids.contains(&id)
    }

    pub fn values(&self) -> &BTreeSet<Id> {
        &self.ids
    }

    pub fn to_vec(&self) -> Vec<Id> {
        self.ids.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn add_all<I: IntoIterator<Item = Id>>(&mut self, ids: I) {
        self.ids.extend(ids);
    }

    pub fn remove_all<I: IntoIterator<Item = Id>>(&mut self, ids: I) {
        for id in ids {
            self.ids.remove(&id);
        }
    }
}

impl FromIterator<Id> for IdSet {
    fn from_iter<I: IntoIterator<Item = Id>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

impl From<BTreeSet<Id>> for IdSet {
    fn from(ids: BTreeSet<Id>) -> Self {
        Self { ids }
    }
}

/// One [`IdSet`] per category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorySets {
    pub users: IdSet,
    pub menus: IdSet,
    pub menu_operations: IdSet,
    pub data_resource_interfaces: IdSet,
}

impl CategorySets {
    pub fn from_bindings(bindings: &RoleBindings) -> Self {
        Self {
            users: bindings.user_ids.clone().into(),
            menus: bindings.menu_ids.clone().into(),
            menu_operations: bindings.menu_operation_ids.clone().into(),
            data_resource_interfaces: bindings.data_resource_interface_ids.clone().into(),
        }
    }

    pub fn get(&self, category: PermissionCategory) -> &IdSet {
        match category {
            PermissionCategory::Users => &self.users,
            PermissionCategory::Menus => &self.menus,
            PermissionCategory::MenuOperations => &self.menu_operations,
            PermissionCategory::DataResourceInterfaces => &self.data_resource_interfaces,
        }
    }

    pub fn get_mut(&mut self, category: PermissionCategory) -> &mut IdSet {
        match category {
            PermissionCategory::Users => &mut self.users,
            PermissionCategory::Menus => &mut self.menus,
            PermissionCategory::MenuOperations => &mut self.menu_operations,
            PermissionCategory::DataResourceInterfaces => &mut self.data_resource_interfaces,
        }
    }
}

/// In-memory permission state of the role being edited.
///
/// `live` is what the operator has checked. `baseline` is what the server
/// is known to hold: the loaded snapshot, then whatever each successful
/// apply sent. Edits never touch the baseline, so discarding a session
/// needs no undo.
#[derive(Debug, Clone, Default)]
pub struct PermissionSelection {
    live: CategorySets,
    baseline: CategorySets,
    /// Display data for users, keyed by id. Not membership.
    directory: BTreeMap<Id, Candidate>,
}

impl PermissionSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace everything with a freshly fetched snapshot.
    pub fn from_bindings(bindings: RoleBindings) -> Self {
        let sets = CategorySets::from_bindings(&bindings);
        let directory = bindings.users.into_iter().map(|c| (c.id, c)).collect();
        Self {
            live: sets.clone(),
            baseline: sets,
            directory,
        }
    }

    pub fn add(&mut self, category: PermissionCategory, id: Id) -> bool {
        self.live.get_mut(category).add(id)
    }

    pub fn remove(&mut self, category: PermissionCategory, id: Id) -> bool {
        self.live.get_mut(category).remove(id)
    }

    pub fn contains(&self, category: PermissionCategory, id: Id) -> bool {
        self.live.get(category).contains(id)
    }

    pub fn values(&self, category: PermissionCategory) -> &BTreeSet<Id> {
        self.live.get(category).values()
    }

    pub fn add_all<I: IntoIterator<Item = Id>>(&mut self, category: PermissionCategory, ids: I) {
        self.live.get_mut(category).add_all(ids);
    }

    pub fn remove_all<I: IntoIterator<Item = Id>>(&mut self, category: PermissionCategory, ids: I) {
        self.live.get_mut(category).remove_all(ids);
    }

    pub fn clear(&mut self, category: PermissionCategory) {
        self.live.get_mut(category).clear();
    }

    pub fn live(&self) -> &CategorySets {
        &self.live
    }

    /// Last server-known value of a category.
    pub fn baseline(&self, category: PermissionCategory) -> &BTreeSet<Id> {
        self.baseline.get(category).values()
    }

    /// Record that the server now holds exactly `ids` for `category`.
    pub fn set_baseline<I: IntoIterator<Item = Id>>(&mut self, category: PermissionCategory, ids: I) {
        *self.baseline.get_mut(category) = ids.into_iter().collect();
    }

    pub fn has_unapplied_changes(&self, category: PermissionCategory) -> bool {
        self.live.get(category) != self.baseline.get(category)
    }

    pub fn has_any_unapplied_changes(&self) -> bool {
        PermissionCategory::ALL
            .iter()
            .any(|c| self.has_unapplied_changes(*c))
    }

    pub fn remember(&mut self, candidate: Candidate) {
        self.directory.insert(candidate.id, candidate);
    }

    /// Granted users for display, ordered by id. Ids without display data
    /// show as their number.
    pub fn granted_users(&self) -> Vec<Candidate> {
        self.live
            .users
            .values()
            .iter()
            .map(|id| {
                self.directory
                    .get(id)
                    .cloned()
                    .unwrap_or_else(|| Candidate::unknown(*id))
            })
            .collect()
    }

    /// Merge a confirmed picker buffer into `category` and empty the buffer.
    /// Returns how many ids were newly granted.
    pub fn confirm_pending(
        &mut self,
        category: PermissionCategory,
        pending: &mut PendingSelection,
    ) -> usize {
        let mut added = 0;
        for candidate in pending.take() {
            if self.add(category, candidate.id) {
                added += 1;
            }
            if category == PermissionCategory::Users {
                self.remember(candidate);
            }
        }
        added
    }

    /// Checked state of each operation of `menu`, read from the operations
    /// set only.
    pub fn operation_states<'m>(&self, menu: &'m Menu) -> Vec<(&'m MenuOperation, bool)> {
        menu.operations
            .iter()
            .map(|op| (op, self.contains(PermissionCategory::MenuOperations, op.id)))
            .collect()
    }
}
