//! Wire shapes of the platform REST API and their normalization.
//!
//! The backend is loosely typed: any field may be missing or `null`, and
//! "no parent" is sometimes sent as `0`. Every shape here is all-optional
//! and has exactly one `normalize` that turns it into the typed model, so
//! nothing past this module ever sees a three-valued field.

use std::collections::BTreeSet;

use serde::Deserialize;

use openerp_core::ServiceError;

use super::{Candidate, Id, Menu, MenuOperation, OperationStatus, RoleBindings, Team};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawMenu {
    pub id: Option<Id>,
    pub parent_id: Option<Id>,
    pub system_id: Option<Id>,
    pub name: Option<String>,
    pub code: Option<String>,
    pub path: Option<String>,
    pub sort: Option<i64>,
    pub operations: Option<Vec<RawMenuOperation>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawMenuOperation {
    pub id: Option<Id>,
    pub menu_id: Option<Id>,
    pub code: Option<String>,
    pub name: Option<String>,
    pub status: Option<String>,
    pub sort: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawTeam {
    pub id: Option<Id>,
    pub parent_id: Option<Id>,
    pub organization_id: Option<Id>,
    pub name: Option<String>,
    pub code: Option<String>,
    pub sort: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawCandidate {
    pub id: Option<Id>,
    pub display_name: Option<String>,
    pub name: Option<String>,
    pub code: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawRoleBindings {
    pub user_ids: Option<Vec<Id>>,
    pub menu_ids: Option<Vec<Id>>,
    pub menu_operation_ids: Option<Vec<Id>>,
    pub data_resource_interface_ids: Option<Vec<Id>>,
    pub users: Option<Vec<RawCandidate>>,
}

/// `{items, total}` page as sent by list endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RawPage<T> {
    pub items: Option<Vec<T>>,
    pub total: Option<usize>,
}

impl<T> Default for RawPage<T> {
    fn default() -> Self {
        Self { items: None, total: None }
    }
}

impl<T> RawPage<T> {
    /// Items plus a total that falls back to the item count.
    pub fn into_parts(self) -> (Vec<T>, usize) {
        let items = self.items.unwrap_or_default();
        let total = self.total.unwrap_or(items.len());
        (items, total)
    }
}

fn required_id(id: Option<Id>, what: &str) -> Result<Id, ServiceError> {
    id.ok_or_else(|| ServiceError::Decode(format!("{} without id", what)))
}

/// `""` and absent mean the same thing.
fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// `0` and absent both mean "no parent".
fn parent(id: Option<Id>) -> Option<Id> {
    id.filter(|v| *v != 0)
}

impl RawMenu {
    pub fn normalize(self) -> Result<Menu, ServiceError> {
        let id = required_id(self.id, "menu")?;
        let mut operations = self
            .operations
            .unwrap_or_default()
            .into_iter()
            .map(|op| op.normalize(id))
            .collect::<Result<Vec<_>, _>>()?;
        operations.sort_by_key(|op| op.sort);
        Ok(Menu {
            id,
            parent_id: parent(self.parent_id),
            system_id: self.system_id,
            name: self.name.unwrap_or_default(),
            code: non_empty(self.code),
            path: non_empty(self.path),
            sort: self.sort.unwrap_or(0),
            operations,
        })
    }
}

impl RawMenuOperation {
    /// `owner` is the menu the operation was listed under; it wins when the
    /// operation names no menu itself.
    pub fn normalize(self, owner: Id) -> Result<MenuOperation, ServiceError> {
        let status = match self.status.as_deref().map(str::trim) {
            Some(s) if s.eq_ignore_ascii_case("disabled") => OperationStatus::Disabled,
            _ => OperationStatus::Enabled,
        };
        Ok(MenuOperation {
            id: required_id(self.id, "menu operation")?,
            menu_id: self.menu_id.unwrap_or(owner),
            code: self.code.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            status,
            sort: self.sort.unwrap_or(0),
        })
    }
}

impl RawTeam {
    pub fn normalize(self) -> Result<Team, ServiceError> {
        Ok(Team {
            id: required_id(self.id, "team")?,
            parent_id: parent(self.parent_id),
            organization_id: self.organization_id,
            name: self.name.unwrap_or_default(),
            code: non_empty(self.code),
            sort: self.sort.unwrap_or(0),
        })
    }
}

impl RawCandidate {
    pub fn normalize(self) -> Result<Candidate, ServiceError> {
        let id = required_id(self.id, "candidate")?;
        let code = non_empty(self.code);
        let display_name = non_empty(self.display_name)
            .or_else(|| non_empty(self.name))
            .or_else(|| code.clone())
            .unwrap_or_else(|| id.to_string());
        Ok(Candidate { id, display_name, code })
    }
}

impl RawRoleBindings {
    pub fn normalize(self) -> Result<RoleBindings, ServiceError> {
        fn ids(v: Option<Vec<Id>>) -> BTreeSet<Id> {
            v.unwrap_or_default().into_iter().collect()
        }
        Ok(RoleBindings {
            user_ids: ids(self.user_ids),
            menu_ids: ids(self.menu_ids),
            menu_operation_ids: ids(self.menu_operation_ids),
            data_resource_interface_ids: ids(self.data_resource_interface_ids),
            users: self
                .users
                .unwrap_or_default()
                .into_iter()
                .map(RawCandidate::normalize)
                .collect::<Result<_, _>>()?,
        })
    }
}
