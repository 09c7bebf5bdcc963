use openerp_core::{ListParams, ListResult, ServiceError};

use crate::model::{Candidate, Id, Menu, PermissionBundle, RoleBindings, Team};

/// Which slice of records a list call is for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Scope {
    pub system_id: Option<Id>,
    pub organization_id: Option<Id>,
}

/// The platform backend as seen by the permission engine.
///
/// Everything here is an external collaborator: the engine only reads
/// records, fetches role bindings, runs candidate searches and issues
/// "replace permission set" commands. [`crate::client::HttpBackend`] is the
/// REST implementation.
#[async_trait::async_trait]
pub trait RbacBackend: Send + Sync + 'static {
    /// Menus of one system (full set, flat).
    async fn list_menus(&self, scope: &Scope) -> Result<Vec<Menu>, ServiceError>;

    /// Teams of one organization (full set, flat).
    async fn list_teams(&self, scope: &Scope) -> Result<Vec<Team>, ServiceError>;

    async fn get_role_bindings(&self, role_id: Id) -> Result<RoleBindings, ServiceError>;

    /// Replace the role's user set with exactly `user_ids`.
    async fn assign_users(&self, role_id: Id, user_ids: &[Id]) -> Result<(), ServiceError>;

    /// Replace each of the three permission arrays with the given one.
    async fn assign_permissions(
        &self,
        role_id: Id,
        bundle: &PermissionBundle,
    ) -> Result<(), ServiceError>;

    /// Users matching `keyword`. `exclude_hint` may be ignored by the
    /// backend; callers filter again.
    async fn search_candidate_users(
        &self,
        keyword: &str,
        params: &ListParams,
        exclude_hint: &[Id],
    ) -> Result<ListResult<Candidate>, ServiceError>;

    /// Interfaces of one data-resource service matching `keyword`.
    async fn search_candidate_interfaces(
        &self,
        drs_id: Id,
        keyword: &str,
    ) -> Result<Vec<Candidate>, ServiceError>;
}
