pub mod apply;
pub mod editor;
pub mod records;
pub mod search;
pub mod selection;

use std::time::Duration;

use thiserror::Error;

use openerp_core::{ConsoleConfig, ServiceError};

pub use apply::{apply, build_payload, send_payload, ApplyCategory, AssignmentPayload};
pub use editor::{RoleEditor, SessionPhase};
pub use records::{load_menu_view, load_team_view};
pub use search::{CandidateSearch, PendingSelection, SearchOutcome};
pub use selection::{CategorySets, IdSet, PermissionCategory, PermissionSelection};

/// Permission engine error type.
#[derive(Debug, Error)]
pub enum RbacError {
    /// Fetching records or role bindings failed.
    #[error("load failed: {0}")]
    Load(ServiceError),

    /// One category's replace command failed. Other categories and the
    /// in-memory selection are untouched.
    #[error("applying {category} failed: {source}")]
    Apply {
        category: ApplyCategory,
        source: ServiceError,
    },

    #[error("candidate search failed: {0}")]
    Search(ServiceError),

    #[error("no role is open for editing")]
    NotEditing,

    /// The same category is already being applied.
    #[error("{0} assignment is already in progress")]
    Busy(ApplyCategory),

    /// The session was closed or reopened while the call was in flight.
    #[error("role editing session was closed")]
    SessionClosed,
}

impl From<RbacError> for ServiceError {
    fn from(e: RbacError) -> Self {
        let message = e.to_string();
        match e {
            RbacError::Load(inner) | RbacError::Search(inner) => inner,
            RbacError::Apply { source, .. } => source,
            RbacError::NotEditing => ServiceError::Validation(message),
            RbacError::Busy(_) | RbacError::SessionClosed => ServiceError::Conflict(message),
        }
    }
}

/// Configuration for role editing sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorConfig {
    /// Quiet period before a candidate search is sent.
    pub search_debounce: Duration,
    /// Candidates per page.
    pub search_page_size: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            search_debounce: Duration::from_millis(300),
            search_page_size: 20,
        }
    }
}

impl From<&ConsoleConfig> for EditorConfig {
    fn from(c: &ConsoleConfig) -> Self {
        Self {
            search_debounce: c.search_debounce(),
            search_page_size: c.search_page_size,
        }
    }
}
