use serde::{Deserialize, Serialize};

use openerp_tree::{Searchable, TreeRecord};

use super::Id;

/// A node of the navigation hierarchy.
///
/// Menus form a tree via `parent_id`. Each menu owns its operations (the
/// per-page action permissions); operations are not tree nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Menu {
    pub id: Id,

    /// Parent menu id (None = top-level).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Id>,

    /// Owning system (menus are administered per system).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_id: Option<Id>,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Route path of the page, if the menu is a page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(default)]
    pub sort: i64,

    /// Operations, ordered by `sort` then input order.
    #[serde(default)]
    pub operations: Vec<MenuOperation>,
}

/// A leaf-level permission unit attached to a menu (e.g. "export", "delete").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuOperation {
    pub id: Id,

    pub menu_id: Id,

    pub code: String,

    pub name: String,

    pub status: OperationStatus,

    #[serde(default)]
    pub sort: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationStatus {
    #[default]
    Enabled,
    Disabled,
}

impl TreeRecord for Menu {
    type Id = Id;

    fn id(&self) -> &Id {
        &self.id
    }

    fn parent_id(&self) -> Option<&Id> {
        self.parent_id.as_ref()
    }

    fn sort_key(&self) -> i64 {
        self.sort
    }
}

impl Searchable for Menu {
    fn label(&self) -> &str {
        &self.name
    }

    fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }
}
