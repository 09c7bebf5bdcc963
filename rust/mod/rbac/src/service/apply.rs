use std::fmt;

use tracing::{error, info};

use openerp_core::ServiceError;

use crate::backend::RbacBackend;
use crate::model::{Id, PermissionBundle};
use crate::service::selection::{PermissionCategory, PermissionSelection};
use crate::service::RbacError;

/// A unit the operator applies with one action.
///
/// Menus and menu operations travel together: the backend treats them as
/// one bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ApplyCategory {
    Users,
    Menus,
    DataResourceInterfaces,
}

impl ApplyCategory {
    pub const ALL: [ApplyCategory; 3] = [
        ApplyCategory::Users,
        ApplyCategory::Menus,
        ApplyCategory::DataResourceInterfaces,
    ];

    /// Selection categories whose live value this apply sends.
    pub fn categories(self) -> &'static [PermissionCategory] {
        match self {
            ApplyCategory::Users => &[PermissionCategory::Users],
            ApplyCategory::Menus => &[PermissionCategory::Menus, PermissionCategory::MenuOperations],
            ApplyCategory::DataResourceInterfaces => &[PermissionCategory::DataResourceInterfaces],
        }
    }
}

impl fmt::Display for ApplyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ApplyCategory::Users => "users",
            ApplyCategory::Menus => "menus",
            ApplyCategory::DataResourceInterfaces => "data-resource interfaces",
        })
    }
}

/// The exact replace command one apply sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignmentPayload {
    Users(Vec<Id>),
    Permissions(PermissionBundle),
}

impl AssignmentPayload {
    /// What each selection category will hold on the server once this
    /// payload is accepted.
    pub fn sent_sets(&self) -> Vec<(PermissionCategory, &[Id])> {
        match self {
            AssignmentPayload::Users(ids) => vec![(PermissionCategory::Users, ids.as_slice())],
            AssignmentPayload::Permissions(b) => vec![
                (PermissionCategory::Menus, b.menu_ids.as_slice()),
                (PermissionCategory::MenuOperations, b.menu_operation_ids.as_slice()),
                (
                    PermissionCategory::DataResourceInterfaces,
                    b.data_resource_interface_ids.as_slice(),
                ),
            ],
        }
    }
}

/// Build the full-replace command for `category`.
///
/// The category's live sets are sent whole (never a diff). The permission
/// endpoint replaces all three arrays at once, so the arrays that belong to
/// other categories carry their baseline: the value the server already
/// holds. Every array is present, empty or not.
pub fn build_payload(selection: &PermissionSelection, category: ApplyCategory) -> AssignmentPayload {
    let pick = |c: PermissionCategory| -> Vec<Id> {
        let set = if category.categories().contains(&c) {
            selection.values(c)
        } else {
            selection.baseline(c)
        };
        set.iter().copied().collect()
    };

    match category {
        ApplyCategory::Users => AssignmentPayload::Users(pick(PermissionCategory::Users)),
        ApplyCategory::Menus | ApplyCategory::DataResourceInterfaces => {
            AssignmentPayload::Permissions(PermissionBundle {
                menu_ids: pick(PermissionCategory::Menus),
                menu_operation_ids: pick(PermissionCategory::MenuOperations),
                data_resource_interface_ids: pick(PermissionCategory::DataResourceInterfaces),
            })
        }
    }
}

/// Send a payload as one backend call.
pub async fn send_payload(
    backend: &dyn RbacBackend,
    role_id: Id,
    payload: &AssignmentPayload,
) -> Result<(), ServiceError> {
    match payload {
        AssignmentPayload::Users(ids) => backend.assign_users(role_id, ids).await,
        AssignmentPayload::Permissions(bundle) => backend.assign_permissions(role_id, bundle).await,
    }
}

/// Push the current value of one category to the backend.
///
/// On success the selection's baseline is moved to what was sent. On
/// failure the selection is left exactly as it was so the operator can
/// retry; nothing is rolled back elsewhere.
pub async fn apply(
    backend: &dyn RbacBackend,
    role_id: Id,
    category: ApplyCategory,
    selection: &mut PermissionSelection,
) -> Result<(), RbacError> {
    let payload = build_payload(selection, category);
    match send_payload(backend, role_id, &payload).await {
        Ok(()) => {
            for (c, ids) in payload.sent_sets() {
                selection.set_baseline(c, ids.iter().copied());
            }
            info!(role_id, %category, "permission set applied");
            Ok(())
        }
        Err(source) => {
            error!(role_id, %category, error = %source, "applying permission set failed");
            Err(RbacError::Apply { category, source })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RoleBindings;
    use crate::testing::{Call, MemoryBackend};
    use PermissionCategory::*;

    fn selection() -> PermissionSelection {
        PermissionSelection::from_bindings(RoleBindings {
            user_ids: [1, 2].into_iter().collect(),
            menu_ids: [10].into_iter().collect(),
            menu_operation_ids: [100, 101].into_iter().collect(),
            data_resource_interface_ids: [900].into_iter().collect(),
            users: Vec::new(),
        })
    }

    #[test]
    fn menus_send_explicit_empty_operations() {
        let mut sel = selection();
        sel.add(Menus, 11);
        sel.clear(MenuOperations);
        let payload = build_payload(&sel, ApplyCategory::Menus);
        assert_eq!(
            payload,
            AssignmentPayload::Permissions(PermissionBundle {
                menu_ids: vec![10, 11],
                menu_operation_ids: vec![],
                data_resource_interface_ids: vec![900],
            })
        );
    }

    #[test]
    fn other_arrays_carry_baseline_not_live_edits() {
        let mut sel = selection();
        sel.add(DataResourceInterfaces, 901);
        sel.add(Menus, 12);
        let AssignmentPayload::Permissions(bundle) = build_payload(&sel, ApplyCategory::Menus) else {
            panic!("expected a permission bundle");
        };
        // The pending interface edit is not smuggled out with the menus.
        assert_eq!(bundle.data_resource_interface_ids, vec![900]);

        let AssignmentPayload::Permissions(bundle) =
            build_payload(&sel, ApplyCategory::DataResourceInterfaces)
        else {
            panic!("expected a permission bundle");
        };
        assert_eq!(bundle.menu_ids, vec![10]);
        assert_eq!(bundle.menu_operation_ids, vec![100, 101]);
        assert_eq!(bundle.data_resource_interface_ids, vec![900, 901]);
    }

    #[tokio::test]
    async fn apply_sends_whole_set_not_diff() {
        let backend = MemoryBackend::new();
        let mut sel = selection();
        sel.add(Users, 3);
        sel.remove(Users, 1);

        apply(&backend, 7, ApplyCategory::Users, &mut sel).await.unwrap();
        assert_eq!(backend.calls(), vec![Call::AssignUsers { role_id: 7, user_ids: vec![2, 3] }]);
        assert!(!sel.has_unapplied_changes(Users));
    }

    #[tokio::test]
    async fn failed_apply_keeps_selection() {
        let backend = MemoryBackend::new();
        backend.fail_next("assign_permissions", ServiceError::Internal("boom".into()));
        let mut sel = selection();
        sel.add(Menus, 11);
        let before = sel.clone();

        let err = apply(&backend, 7, ApplyCategory::Menus, &mut sel).await.unwrap_err();
        assert!(matches!(err, RbacError::Apply { category: ApplyCategory::Menus, .. }));
        assert_eq!(sel.live(), before.live());
        assert!(sel.has_unapplied_changes(Menus));
    }

    #[tokio::test]
    async fn applying_one_category_leaves_others_on_server() {
        let backend = MemoryBackend::new().with_bindings(7, RoleBindings {
            user_ids: [1, 2].into_iter().collect(),
            menu_ids: [10].into_iter().collect(),
            menu_operation_ids: [100, 101].into_iter().collect(),
            data_resource_interface_ids: [900].into_iter().collect(),
            users: Vec::new(),
        });
        let mut sel = selection();
        sel.clear(MenuOperations);
        sel.add(DataResourceInterfaces, 901);

        apply(&backend, 7, ApplyCategory::Menus, &mut sel).await.unwrap();
        let server = backend.bindings(7);
        assert!(server.menu_operation_ids.is_empty());
        assert_eq!(server.data_resource_interface_ids.into_iter().collect::<Vec<_>>(), vec![900]);
        assert_eq!(server.user_ids.into_iter().collect::<Vec<_>>(), vec![1, 2]);
        assert!(sel.has_unapplied_changes(DataResourceInterfaces));
    }

    #[test]
    fn categories_of_menus_bundle() {
        assert_eq!(ApplyCategory::Menus.categories(), &[Menus, MenuOperations]);
        assert_eq!(ApplyCategory::Menus.to_string(), "menus");
    }
}
