use tracing::{debug, warn};

use openerp_tree::TreeView;

use crate::backend::RbacBackend;
use crate::context::ConsoleContext;
use crate::model::{Menu, Team};
use crate::service::RbacError;

/// Fetch the menus of the context's system and build a fresh tree view
/// (fully expanded, no keyword).
pub async fn load_menu_view(
    backend: &dyn RbacBackend,
    ctx: &ConsoleContext,
) -> Result<TreeView<Menu>, RbacError> {
    let scope = ctx.menu_scope();
    let menus = backend.list_menus(&scope).await.map_err(|e| {
        warn!(system_id = ?scope.system_id, error = %e, "loading menus failed");
        RbacError::Load(e)
    })?;
    debug!(system_id = ?scope.system_id, count = menus.len(), "menus loaded");
    Ok(TreeView::new(menus))
}

/// Fetch the teams of the context's organization and build a fresh tree
/// view.
pub async fn load_team_view(
    backend: &dyn RbacBackend,
    ctx: &ConsoleContext,
) -> Result<TreeView<Team>, RbacError> {
    let scope = ctx.team_scope();
    let teams = backend.list_teams(&scope).await.map_err(|e| {
        warn!(organization_id = ?scope.organization_id, error = %e, "loading teams failed");
        RbacError::Load(e)
    })?;
    debug!(organization_id = ?scope.organization_id, count = teams.len(), "teams loaded");
    Ok(TreeView::new(teams))
}
