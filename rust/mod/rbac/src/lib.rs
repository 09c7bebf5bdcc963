//! RBAC module: the permission engine behind the role management console.
//!
//! # Pieces
//!
//! - **Records**: menus (with their operations) and teams, loaded flat and
//!   assembled into trees by `openerp-tree`
//! - **Selection**: the role's four granted id sets, edited in memory
//! - **Apply**: pushes one category at a time as a full replacement
//! - **Candidate search**: debounced lookup of users and data-resource
//!   interfaces not yet granted
//!
//! The platform backend is reached through [`backend::RbacBackend`];
//! [`client::HttpBackend`] talks to the REST API.
//!
//! # Usage
//!
//! ```ignore
//! use openerp_core::ConsoleConfig;
//! use openerp_rbac::{RbacConsole, ConsoleContext, ApplyCategory, PermissionCategory};
//!
//! let console = RbacConsole::from_config(&ConsoleConfig::from_args(&args))?;
//! let menus = console.menu_view(&ConsoleContext::new().with_system(Some(1))).await?;
//! let editor = console.role_editor();
//! editor.open(42).await?;
//! editor.add(PermissionCategory::Menus, 7)?;
//! editor.apply(ApplyCategory::Menus).await?;
//! ```

pub mod backend;
pub mod client;
pub mod context;
pub mod model;
pub mod service;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use tracing::info;

use openerp_core::{ConsoleConfig, ServiceError};
use openerp_tree::TreeView;

pub use backend::{RbacBackend, Scope};
pub use client::{HttpBackend, NoAuth, StaticToken, TokenSource};
pub use context::ConsoleContext;
pub use model::{Candidate, Id, Menu, MenuOperation, OperationStatus, PermissionBundle, RoleBindings, Team};
pub use service::{
    ApplyCategory, CandidateSearch, EditorConfig, PendingSelection, PermissionCategory,
    PermissionSelection, RbacError, RoleEditor, SearchOutcome, SessionPhase,
};

/// Entry point for one console: a backend plus the editor settings.
pub struct RbacConsole {
    backend: Arc<dyn RbacBackend>,
    config: EditorConfig,
}

impl RbacConsole {
    pub fn new(backend: Arc<dyn RbacBackend>, config: EditorConfig) -> Self {
        Self { backend, config }
    }

    /// Console talking to the REST API described by `config`.
    pub fn from_config(config: &ConsoleConfig) -> Result<Self, ServiceError> {
        let backend = HttpBackend::from_config(config)?;
        info!(api = %config.api_base, "rbac console ready");
        Ok(Self::new(Arc::new(backend), EditorConfig::from(config)))
    }

    pub fn backend(&self) -> &Arc<dyn RbacBackend> {
        &self.backend
    }

    /// A fresh, closed editing session sharing this console's backend.
    pub fn role_editor(&self) -> RoleEditor {
        RoleEditor::new(self.backend.clone(), self.config.clone())
    }

    pub async fn menu_view(&self, ctx: &ConsoleContext) -> Result<TreeView<Menu>, RbacError> {
        service::load_menu_view(self.backend.as_ref(), ctx).await
    }

    pub async fn team_view(&self, ctx: &ConsoleContext) -> Result<TreeView<Team>, RbacError> {
        service::load_team_view(self.backend.as_ref(), ctx).await
    }
}
