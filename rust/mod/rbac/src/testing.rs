//! In-memory [`RbacBackend`] for tests.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use openerp_core::{ListParams, ListResult, ServiceError};

use crate::backend::{RbacBackend, Scope};
use crate::model::{Candidate, Id, Menu, PermissionBundle, RoleBindings, Team};

/// A mutating call the backend received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    AssignUsers { role_id: Id, user_ids: Vec<Id> },
    AssignPermissions { role_id: Id, bundle: PermissionBundle },
}

#[derive(Default)]
struct Inner {
    menus: Vec<Menu>,
    teams: Vec<Team>,
    users: Vec<Candidate>,
    interfaces: HashMap<Id, Vec<Candidate>>,
    bindings: HashMap<Id, RoleBindings>,
    calls: Vec<Call>,
    user_searches: Vec<String>,
    failures: HashMap<&'static str, ServiceError>,
    delays: HashMap<&'static str, Duration>,
    search_delays: HashMap<String, Duration>,
}

#[derive(Default)]
pub struct MemoryBackend {
    inner: Mutex<Inner>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn with_menus(self, menus: Vec<Menu>) -> Self {
        self.inner().menus = menus;
        self
    }

    pub fn with_teams(self, teams: Vec<Team>) -> Self {
        self.inner().teams = teams;
        self
    }

    pub fn with_users(self, users: Vec<Candidate>) -> Self {
        self.inner().users = users;
        self
    }

    pub fn with_interfaces(self, drs_id: Id, interfaces: Vec<Candidate>) -> Self {
        self.inner().interfaces.insert(drs_id, interfaces);
        self
    }

    pub fn with_bindings(self, role_id: Id, bindings: RoleBindings) -> Self {
        self.inner().bindings.insert(role_id, bindings);
        self
    }

    /// Delay user searches for exactly this keyword.
    pub fn with_search_delay(self, keyword: &str, delay: Duration) -> Self {
        self.inner().search_delays.insert(keyword.to_string(), delay);
        self
    }

    /// Delay every call of `op` (a trait method name).
    pub fn set_delay(&self, op: &'static str, delay: Duration) {
        self.inner().delays.insert(op, delay);
    }

    /// Make the next call of `op` fail with `err`.
    pub fn fail_next(&self, op: &'static str, err: ServiceError) {
        self.inner().failures.insert(op, err);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner().calls.clone()
    }

    pub fn last_bundle(&self) -> Option<PermissionBundle> {
        self.inner().calls.iter().rev().find_map(|c| match c {
            Call::AssignPermissions { bundle, .. } => Some(bundle.clone()),
            Call::AssignUsers { .. } => None,
        })
    }

    /// Keywords of user searches that reached the backend, in call order.
    pub fn user_searches(&self) -> Vec<String> {
        self.inner().user_searches.clone()
    }

    pub fn bindings(&self, role_id: Id) -> RoleBindings {
        self.inner().bindings.get(&role_id).cloned().unwrap_or_default()
    }

    /// Sleep for the configured delay, then take a pending failure.
    async fn enter(&self, op: &'static str, extra: Option<Duration>) -> Result<(), ServiceError> {
        let delay = self.inner().delays.get(op).copied();
        if let Some(d) = delay.into_iter().chain(extra).max() {
            tokio::time::sleep(d).await;
        }
        match self.inner().failures.remove(op) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl RbacBackend for MemoryBackend {
    async fn list_menus(&self, scope: &Scope) -> Result<Vec<Menu>, ServiceError> {
        self.enter("list_menus", None).await?;
        Ok(self
            .inner()
            .menus
            .iter()
            .filter(|m| scope.system_id.is_none() || m.system_id == scope.system_id)
            .cloned()
            .collect())
    }

    async fn list_teams(&self, scope: &Scope) -> Result<Vec<Team>, ServiceError> {
        self.enter("list_teams", None).await?;
        Ok(self
            .inner()
            .teams
            .iter()
            .filter(|t| scope.organization_id.is_none() || t.organization_id == scope.organization_id)
            .cloned()
            .collect())
    }

    async fn get_role_bindings(&self, role_id: Id) -> Result<RoleBindings, ServiceError> {
        self.enter("get_role_bindings", None).await?;
        Ok(self.bindings(role_id))
    }

    async fn assign_users(&self, role_id: Id, user_ids: &[Id]) -> Result<(), ServiceError> {
        self.enter("assign_users", None).await?;
        let mut inner = self.inner();
        inner.calls.push(Call::AssignUsers {
            role_id,
            user_ids: user_ids.to_vec(),
        });
        inner.bindings.entry(role_id).or_default().user_ids = user_ids.iter().copied().collect();
        Ok(())
    }

    async fn assign_permissions(
        &self,
        role_id: Id,
        bundle: &PermissionBundle,
    ) -> Result<(), ServiceError> {
        self.enter("assign_permissions", None).await?;
        let mut inner = self.inner();
        inner.calls.push(Call::AssignPermissions {
            role_id,
            bundle: bundle.clone(),
        });
        let stored = inner.bindings.entry(role_id).or_default();
        stored.menu_ids = bundle.menu_ids.iter().copied().collect();
        stored.menu_operation_ids = bundle.menu_operation_ids.iter().copied().collect();
        stored.data_resource_interface_ids = bundle.data_resource_interface_ids.iter().copied().collect();
        Ok(())
    }

    async fn search_candidate_users(
        &self,
        keyword: &str,
        params: &ListParams,
        _exclude_hint: &[Id],
    ) -> Result<ListResult<Candidate>, ServiceError> {
        let extra = {
            let mut inner = self.inner();
            inner.user_searches.push(keyword.to_string());
            inner.search_delays.get(keyword).copied()
        };
        self.enter("search_candidate_users", extra).await?;
        let needle = keyword.to_lowercase();
        let matched: Vec<Candidate> = self
            .inner()
            .users
            .iter()
            .filter(|c| c.display_name.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        Ok(ListResult {
            total: matched.len(),
            items: params.apply(&matched),
        })
    }

    async fn search_candidate_interfaces(
        &self,
        drs_id: Id,
        keyword: &str,
    ) -> Result<Vec<Candidate>, ServiceError> {
        self.enter("search_candidate_interfaces", None).await?;
        let needle = keyword.to_lowercase();
        Ok(self
            .inner()
            .interfaces
            .get(&drs_id)
            .map(|all| {
                all.iter()
                    .filter(|c| c.display_name.to_lowercase().contains(&needle))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

pub fn menu(id: Id, parent_id: Option<Id>, name: &str, system_id: Option<Id>) -> Menu {
    Menu {
        id,
        parent_id,
        system_id,
        name: name.to_string(),
        code: None,
        path: None,
        sort: 0,
        operations: Vec::new(),
    }
}

pub fn team(id: Id, parent_id: Option<Id>, organization_id: Id) -> Team {
    Team {
        id,
        parent_id,
        organization_id: Some(organization_id),
        name: format!("team-{}", id),
        code: None,
        sort: 0,
    }
}
