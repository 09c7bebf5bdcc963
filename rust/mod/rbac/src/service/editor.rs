use std::collections::{BTreeSet, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, error, info, warn};

use openerp_core::ListParams;

use crate::backend::RbacBackend;
use crate::model::{Candidate, Id, Menu, MenuOperation};
use crate::service::apply::{build_payload, send_payload, ApplyCategory};
use crate::service::search::{CandidateSearch, PendingSelection, SearchOutcome};
use crate::service::selection::{PermissionCategory, PermissionSelection};
use crate::service::{EditorConfig, RbacError};

/// Where a role editing session is.
///
/// `Closed → Loading → Editing`, back to `Closed` on dismiss. Applies run
/// while `Editing` and do not change the phase; see
/// [`RoleEditor::is_applying`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Closed,
    Loading { role_id: Id },
    Editing { role_id: Id },
}

struct EditorState {
    /// Bumped on every open/close; async results from an older generation
    /// are dropped.
    generation: u64,
    phase: SessionPhase,
    selection: PermissionSelection,
    applying: HashSet<ApplyCategory>,
}

impl EditorState {
    fn editing_role(&self) -> Result<Id, RbacError> {
        match self.phase {
            SessionPhase::Editing { role_id } => Ok(role_id),
            _ => Err(RbacError::NotEditing),
        }
    }
}

/// Permission editing session for one role at a time.
///
/// All edits are in memory until [`RoleEditor::apply`] pushes one category
/// to the backend. Categories apply independently and may overlap; the
/// same category cannot be applied twice concurrently. Closing discards
/// unapplied edits without asking.
///
/// Methods take `&self` so a screen can hold the editor in an `Arc` and
/// fire searches and applies side by side. The state lock is never held
/// across a backend call.
///
/// Menus and data-resource interfaces share one replace endpoint that
/// overwrites all three permission arrays. Their applies are queued on
/// `bundle_lock`, and each payload is built only once the lock is held, so
/// it carries the baseline the previous bundle apply just set.
pub struct RoleEditor {
    backend: Arc<dyn RbacBackend>,
    config: EditorConfig,
    state: Mutex<EditorState>,
    bundle_lock: tokio::sync::Mutex<()>,
    user_search: CandidateSearch,
    interface_search: CandidateSearch,
}

impl RoleEditor {
    pub fn new(backend: Arc<dyn RbacBackend>, config: EditorConfig) -> Self {
        let user_search = CandidateSearch::new(config.search_debounce);
        let interface_search = CandidateSearch::new(config.search_debounce);
        Self {
            backend,
            config,
            state: Mutex::new(EditorState {
                generation: 0,
                phase: SessionPhase::Closed,
                selection: PermissionSelection::new(),
                applying: HashSet::new(),
            }),
            bundle_lock: tokio::sync::Mutex::new(()),
            user_search,
            interface_search,
        }
    }

    fn state(&self) -> MutexGuard<'_, EditorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn phase(&self) -> SessionPhase {
        self.state().phase
    }

    /// The role being edited, once its bindings are loaded.
    pub fn role_id(&self) -> Option<Id> {
        self.state().editing_role().ok()
    }

    // ── Session lifecycle ──

    /// Open `role_id` for editing, replacing any open session.
    ///
    /// All four sets are replaced wholesale from one bindings fetch. On
    /// failure the session ends up `Closed` with empty state; reopening
    /// retries.
    pub async fn open(&self, role_id: Id) -> Result<(), RbacError> {
        let generation = {
            let mut s = self.state();
            s.generation += 1;
            s.phase = SessionPhase::Loading { role_id };
            s.selection = PermissionSelection::new();
            s.applying.clear();
            s.generation
        };
        self.user_search.cancel();
        self.interface_search.cancel();
        info!(role_id, "opening role for editing");

        let result = self.backend.get_role_bindings(role_id).await;

        let mut s = self.state();
        if s.generation != generation {
            debug!(role_id, "ignoring bindings for a superseded session");
            return Err(RbacError::SessionClosed);
        }
        match result {
            Ok(bindings) => {
                s.selection = PermissionSelection::from_bindings(bindings);
                s.phase = SessionPhase::Editing { role_id };
                Ok(())
            }
            Err(e) => {
                warn!(role_id, error = %e, "loading role bindings failed");
                s.phase = SessionPhase::Closed;
                Err(RbacError::Load(e))
            }
        }
    }

    /// Dismiss the session. Unapplied edits are dropped; responses still in
    /// flight are ignored when they arrive.
    pub fn close(&self) {
        let mut s = self.state();
        if s.selection.has_any_unapplied_changes() {
            info!(phase = ?s.phase, "closing role editor, discarding unapplied changes");
        } else {
            debug!(phase = ?s.phase, "closing role editor");
        }
        s.generation += 1;
        s.phase = SessionPhase::Closed;
        s.selection = PermissionSelection::new();
        s.applying.clear();
        drop(s);
        self.user_search.cancel();
        self.interface_search.cancel();
    }

    // ── Selection ──

    fn with_selection<R>(&self, f: impl FnOnce(&mut PermissionSelection) -> R) -> Result<R, RbacError> {
        let mut s = self.state();
        s.editing_role()?;
        Ok(f(&mut s.selection))
    }

    pub fn add(&self, category: PermissionCategory, id: Id) -> Result<bool, RbacError> {
        self.with_selection(|sel| sel.add(category, id))
    }

    pub fn remove(&self, category: PermissionCategory, id: Id) -> Result<bool, RbacError> {
        self.with_selection(|sel| sel.remove(category, id))
    }

    pub fn contains(&self, category: PermissionCategory, id: Id) -> Result<bool, RbacError> {
        self.with_selection(|sel| sel.contains(category, id))
    }

    pub fn values(&self, category: PermissionCategory) -> Result<BTreeSet<Id>, RbacError> {
        self.with_selection(|sel| sel.values(category).clone())
    }

    pub fn add_all<I>(&self, category: PermissionCategory, ids: I) -> Result<(), RbacError>
    where
        I: IntoIterator<Item = Id>,
    {
        self.with_selection(|sel| sel.add_all(category, ids))
    }

    pub fn remove_all<I>(&self, category: PermissionCategory, ids: I) -> Result<(), RbacError>
    where
        I: IntoIterator<Item = Id>,
    {
        self.with_selection(|sel| sel.remove_all(category, ids))
    }

    /// Merge a confirmed picker buffer into `category`.
    pub fn confirm_pending(
        &self,
        category: PermissionCategory,
        pending: &mut PendingSelection,
    ) -> Result<usize, RbacError> {
        self.with_selection(|sel| sel.confirm_pending(category, pending))
    }

    /// Copy of the whole in-memory selection.
    pub fn selection(&self) -> Result<PermissionSelection, RbacError> {
        self.with_selection(|sel| sel.clone())
    }

    pub fn granted_users(&self) -> Result<Vec<Candidate>, RbacError> {
        self.with_selection(|sel| sel.granted_users())
    }

    pub fn operation_states<'m>(&self, menu: &'m Menu) -> Result<Vec<(&'m MenuOperation, bool)>, RbacError> {
        self.with_selection(|sel| sel.operation_states(menu))
    }

    pub fn has_unapplied_changes(&self, category: PermissionCategory) -> Result<bool, RbacError> {
        self.with_selection(|sel| sel.has_unapplied_changes(category))
    }

    // ── Apply ──

    pub fn is_applying(&self, category: ApplyCategory) -> bool {
        self.state().applying.contains(&category)
    }

    /// Send the current full value of `category` to the backend.
    ///
    /// Edits made while the call is in flight stay in memory and show up as
    /// unapplied afterwards. A failure leaves the selection untouched. If the
    /// returned future is dropped early, the category is released again.
    pub async fn apply(&self, category: ApplyCategory) -> Result<(), RbacError> {
        let (generation, role_id) = {
            let mut s = self.state();
            let role_id = s.editing_role()?;
            if !s.applying.insert(category) {
                return Err(RbacError::Busy(category));
            }
            (s.generation, role_id)
        };
        let _applying = ApplyingGuard {
            editor: self,
            category,
            generation,
        };

        let _bundle = match category {
            ApplyCategory::Users => None,
            ApplyCategory::Menus | ApplyCategory::DataResourceInterfaces => {
                Some(self.bundle_lock.lock().await)
            }
        };

        let payload = {
            let s = self.state();
            if s.generation != generation {
                debug!(role_id, %category, "session closed while apply was queued");
                return Err(RbacError::SessionClosed);
            }
            build_payload(&s.selection, category)
        };

        let result = send_payload(self.backend.as_ref(), role_id, &payload).await;

        let mut s = self.state();
        if s.generation != generation {
            debug!(role_id, %category, "apply finished after the session was closed");
            return result.map_err(|source| RbacError::Apply { category, source });
        }
        match result {
            Ok(()) => {
                for (c, ids) in payload.sent_sets() {
                    s.selection.set_baseline(c, ids.iter().copied());
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

    // ── Candidate search ──

    /// Debounced user search, excluding users the role already has.
    pub async fn search_users(&self, keyword: &str, page: usize) -> Result<SearchOutcome, RbacError> {
        let (generation, exclude) = self.search_snapshot(PermissionCategory::Users)?;
        let params = ListParams::page(page, self.config.search_page_size);
        let outcome = self
            .user_search
            .search_users(self.backend.as_ref(), keyword, params, exclude)
            .await?;
        Ok(self.still_open(generation, outcome))
    }

    /// Debounced interface search within one data-resource service,
    /// excluding interfaces the role already has.
    pub async fn search_interfaces(
        &self,
        drs_id: Id,
        keyword: &str,
        page: usize,
    ) -> Result<SearchOutcome, RbacError> {
        let (generation, exclude) = self.search_snapshot(PermissionCategory::DataResourceInterfaces)?;
        let params = ListParams::page(page, self.config.search_page_size);
        let outcome = self
            .interface_search
            .search_interfaces(self.backend.as_ref(), drs_id, keyword, params, exclude)
            .await?;
        Ok(self.still_open(generation, outcome))
    }

    fn search_snapshot(&self, category: PermissionCategory) -> Result<(u64, BTreeSet<Id>), RbacError> {
        let s = self.state();
        s.editing_role()?;
        Ok((s.generation, s.selection.values(category).clone()))
    }

    fn still_open(&self, generation: u64, outcome: SearchOutcome) -> SearchOutcome {
        if self.state().generation == generation {
            outcome
        } else {
            SearchOutcome::Superseded
        }
    }
}

/// Clears a category's in-flight flag when its apply ends, including when
/// the apply future is dropped before completion.
struct ApplyingGuard<'a> {
    editor: &'a RoleEditor,
    category: ApplyCategory,
    generation: u64,
}

impl Drop for ApplyingGuard<'_> {
    fn drop(&mut self) {
        let mut s = self.editor.state();
        // A newer session owns its own flags.
        if s.generation == self.generation {
            s.applying.remove(&self.category);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use openerp_core::ServiceError;

    use crate::model::RoleBindings;
    use crate::testing::{Call, MemoryBackend};
    use PermissionCategory::*;

    fn bindings() -> RoleBindings {
        RoleBindings {
            user_ids: [5, 6].into_iter().collect(),
            menu_ids: [10].into_iter().collect(),
            menu_operation_ids: [100].into_iter().collect(),
            data_resource_interface_ids: [900].into_iter().collect(),
            users: vec![Candidate::new(5, "Li Lei"), Candidate::new(6, "Zhang San")],
        }
    }

    fn editor(backend: &Arc<MemoryBackend>) -> RoleEditor {
        let config = EditorConfig {
            search_debounce: Duration::from_millis(300),
            search_page_size: 20,
        };
        RoleEditor::new(backend.clone(), config)
    }

    fn opened_backend() -> Arc<MemoryBackend> {
        Arc::new(
            MemoryBackend::new()
                .with_bindings(1, bindings())
                .with_users(vec![
                    Candidate::new(5, "Li Lei"),
                    Candidate::new(7, "Li Si"),
                    Candidate::new(8, "Lily"),
                ]),
        )
    }

    #[tokio::test]
    async fn open_loads_snapshot() {
        let backend = opened_backend();
        let editor = editor(&backend);
        assert_eq!(editor.phase(), SessionPhase::Closed);

        editor.open(1).await.unwrap();
        assert_eq!(editor.phase(), SessionPhase::Editing { role_id: 1 });
        assert_eq!(editor.values(Users).unwrap().into_iter().collect::<Vec<_>>(), vec![5, 6]);
        assert!(editor.contains(MenuOperations, 100).unwrap());
    }

    #[tokio::test]
    async fn edits_require_open_session() {
        let backend = opened_backend();
        let editor = editor(&backend);
        assert!(matches!(editor.add(Users, 1), Err(RbacError::NotEditing)));
        assert!(matches!(editor.apply(ApplyCategory::Users).await, Err(RbacError::NotEditing)));
    }

    #[tokio::test]
    async fn load_failure_closes_session() {
        let backend = opened_backend();
        backend.fail_next("get_role_bindings", ServiceError::NotFound("role 1".into()));
        let editor = editor(&backend);

        let err = editor.open(1).await.unwrap_err();
        assert!(matches!(err, RbacError::Load(ServiceError::NotFound(_))));
        assert_eq!(editor.phase(), SessionPhase::Closed);

        // Retrying by reopening works.
        editor.open(1).await.unwrap();
        assert_eq!(editor.role_id(), Some(1));
    }

    #[tokio::test]
    async fn close_discards_unapplied_edits() {
        let backend = opened_backend();
        let editor = editor(&backend);
        editor.open(1).await.unwrap();
        editor.add(Menus, 11).unwrap();
        editor.close();

        assert_eq!(editor.phase(), SessionPhase::Closed);
        assert!(backend.calls().iter().all(|c| !matches!(c, Call::AssignPermissions { .. })));

        editor.open(1).await.unwrap();
        assert!(!editor.contains(Menus, 11).unwrap());
    }

    #[tokio::test]
    async fn apply_menus_sends_full_bundle() {
        let backend = opened_backend();
        let editor = editor(&backend);
        editor.open(1).await.unwrap();
        editor.add(Menus, 11).unwrap();
        editor.remove(MenuOperations, 100).unwrap();

        editor.apply(ApplyCategory::Menus).await.unwrap();
        let bundle = backend.last_bundle().unwrap();
        assert_eq!(bundle.menu_ids, vec![10, 11]);
        assert!(bundle.menu_operation_ids.is_empty());
        assert_eq!(bundle.data_resource_interface_ids, vec![900]);
        assert!(!editor.has_unapplied_changes(Menus).unwrap());
        assert!(!editor.is_applying(ApplyCategory::Menus));
    }

    #[tokio::test]
    async fn apply_failure_keeps_edits_for_retry() {
        let backend = opened_backend();
        let editor = editor(&backend);
        editor.open(1).await.unwrap();
        editor.add(Users, 8).unwrap();

        backend.fail_next("assign_users", ServiceError::Network("reset".into()));
        let err = editor.apply(ApplyCategory::Users).await.unwrap_err();
        assert!(matches!(err, RbacError::Apply { category: ApplyCategory::Users, .. }));
        assert!(editor.contains(Users, 8).unwrap());
        assert!(editor.has_unapplied_changes(Users).unwrap());
        assert_eq!(editor.phase(), SessionPhase::Editing { role_id: 1 });

        editor.apply(ApplyCategory::Users).await.unwrap();
        assert_eq!(
            backend.calls().last(),
            Some(&Call::AssignUsers { role_id: 1, user_ids: vec![5, 6, 8] })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn categories_apply_independently() {
        let backend = opened_backend();
        backend.set_delay("assign_users", Duration::from_secs(2));
        backend.set_delay("assign_permissions", Duration::from_secs(1));
        let editor = editor(&backend);
        editor.open(1).await.unwrap();

        let users = editor.apply(ApplyCategory::Users);
        let menus = editor.apply(ApplyCategory::Menus);
        let same_again = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            assert!(editor.is_applying(ApplyCategory::Users));
            editor.apply(ApplyCategory::Users).await
        };
        let (users, menus, again) = tokio::join!(users, menus, same_again);
        users.unwrap();
        menus.unwrap();
        assert!(matches!(again, Err(RbacError::Busy(ApplyCategory::Users))));
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_bundle_applies_keep_each_other() {
        let backend = opened_backend();
        backend.set_delay("assign_permissions", Duration::from_secs(1));
        let editor = editor(&backend);
        editor.open(1).await.unwrap();
        editor.add(Menus, 11).unwrap();
        editor.add(DataResourceInterfaces, 901).unwrap();

        let (menus, interfaces) = tokio::join!(
            editor.apply(ApplyCategory::Menus),
            editor.apply(ApplyCategory::DataResourceInterfaces),
        );
        menus.unwrap();
        interfaces.unwrap();

        let server = backend.bindings(1);
        assert_eq!(server.menu_ids.into_iter().collect::<Vec<_>>(), vec![10, 11]);
        assert_eq!(server.menu_operation_ids.into_iter().collect::<Vec<_>>(), vec![100]);
        assert_eq!(
            server.data_resource_interface_ids.into_iter().collect::<Vec<_>>(),
            vec![900, 901]
        );
        assert!(!editor.has_unapplied_changes(Menus).unwrap());
        assert!(!editor.has_unapplied_changes(DataResourceInterfaces).unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn bundle_applies_queue_while_users_run_alongside() {
        let backend = opened_backend();
        backend.set_delay("assign_permissions", Duration::from_secs(1));
        backend.set_delay("assign_users", Duration::from_secs(1));
        let editor = editor(&backend);
        editor.open(1).await.unwrap();

        let started = tokio::time::Instant::now();
        let (users, menus, interfaces) = tokio::join!(
            editor.apply(ApplyCategory::Users),
            editor.apply(ApplyCategory::Menus),
            editor.apply(ApplyCategory::DataResourceInterfaces),
        );
        users.unwrap();
        menus.unwrap();
        interfaces.unwrap();
        // Users overlap the first bundle call; the second bundle call waits.
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(2) && elapsed < Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_apply_releases_category() {
        let backend = opened_backend();
        backend.set_delay("assign_users", Duration::from_secs(5));
        let editor = editor(&backend);
        editor.open(1).await.unwrap();
        editor.add(Users, 8).unwrap();

        let apply = editor.apply(ApplyCategory::Users);
        assert!(tokio::time::timeout(Duration::from_millis(10), apply).await.is_err());
        assert!(!editor.is_applying(ApplyCategory::Users));
        assert!(editor.has_unapplied_changes(Users).unwrap());

        editor.apply(ApplyCategory::Users).await.unwrap();
        assert_eq!(
            backend.calls(),
            vec![Call::AssignUsers { role_id: 1, user_ids: vec![5, 6, 8] }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn late_apply_does_not_touch_new_session() {
        let backend = opened_backend();
        backend.set_delay("assign_users", Duration::from_secs(1));
        let editor = editor(&backend);
        editor.open(1).await.unwrap();
        editor.add(Users, 8).unwrap();

        let apply = editor.apply(ApplyCategory::Users);
        let reopen = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            editor.close();
            editor.open(1).await
        };
        let (applied, reopened) = tokio::join!(apply, reopen);
        applied.unwrap();
        reopened.unwrap();
        assert!(!editor.is_applying(ApplyCategory::Users));
        assert!(!editor.has_unapplied_changes(Users).unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn user_search_excludes_granted_and_confirms_into_selection() {
        let backend = opened_backend();
        let editor = editor(&backend);
        editor.open(1).await.unwrap();

        let page = editor.search_users("li", 1).await.unwrap().fresh().unwrap();
        let ids: Vec<Id> = page.items.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![7, 8]);

        let mut pending = PendingSelection::new();
        pending.select(page.items[1].clone());
        assert_eq!(editor.confirm_pending(Users, &mut pending).unwrap(), 1);
        assert!(editor.contains(Users, 8).unwrap());
        let names: Vec<String> = editor.granted_users().unwrap().into_iter().map(|c| c.display_name).collect();
        assert_eq!(names, vec!["Li Lei", "Zhang San", "Lily"]);

        // Newly granted users stop showing up as candidates.
        let page = editor.search_users("li", 1).await.unwrap().fresh().unwrap();
        assert_eq!(page.items.iter().map(|c| c.id).collect::<Vec<_>>(), vec![7]);
    }

    #[tokio::test(start_paused = true)]
    async fn search_result_dropped_when_session_closes() {
        let backend = opened_backend();
        backend.set_delay("search_candidate_users", Duration::from_secs(1));
        let editor = editor(&backend);
        editor.open(1).await.unwrap();

        let search = editor.search_users("li", 1);
        let close = async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            editor.close();
        };
        let (outcome, _) = tokio::join!(search, close);
        assert_eq!(outcome.unwrap(), SearchOutcome::Superseded);
    }

    #[tokio::test(start_paused = true)]
    async fn interface_search_excludes_granted() {
        let backend = Arc::new(
            MemoryBackend::new()
                .with_bindings(1, bindings())
                .with_interfaces(4, vec![
                    Candidate::new(900, "GET /orders"),
                    Candidate::new(901, "POST /orders"),
                ]),
        );
        let editor = editor(&backend);
        editor.open(1).await.unwrap();
        let page = editor.search_interfaces(4, "orders", 1).await.unwrap().fresh().unwrap();
        assert_eq!(page.items, vec![Candidate::new(901, "POST /orders")]);
    }
}
