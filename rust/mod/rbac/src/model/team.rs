use serde::{Deserialize, Serialize};

use openerp_tree::{Searchable, TreeRecord};

use super::Id;

/// An organization unit. Teams form a tree via `parent_id`, scoped to one
/// organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: Id,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Id>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<Id>,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(default)]
    pub sort: i64,
}

impl TreeRecord for Team {
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

impl Searchable for Team {
    fn label(&self) -> &str {
        &self.name
    }

    fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }
}
