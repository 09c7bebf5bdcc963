use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{Candidate, Id};

/// Snapshot of everything bound to one role, as returned by the
/// "get role bindings" call.
///
/// Membership is the four id sets. `users` only carries display data for
/// (some of) the granted users and is never used to decide membership.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleBindings {
    pub user_ids: BTreeSet<Id>,
    pub menu_ids: BTreeSet<Id>,
    pub menu_operation_ids: BTreeSet<Id>,
    pub data_resource_interface_ids: BTreeSet<Id>,
    pub users: Vec<Candidate>,
}

/// Body of the "replace permission set" command.
///
/// All three arrays are always serialized: an empty array clears that
/// category on the server, an omitted one would be ambiguous.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionBundle {
    pub menu_ids: Vec<Id>,
    pub menu_operation_ids: Vec<Id>,
    pub data_resource_interface_ids: Vec<Id>,
}

/// Body of the "replace role users" command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAssignment {
    pub user_ids: Vec<Id>,
}
