use serde::{Deserialize, Serialize};

use super::Id;

/// Lightweight projection of an entity that can be granted to a role
/// (a user, a data-resource interface). Carries no permission state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: Id,

    pub display_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl Candidate {
    pub fn new(id: Id, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            code: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Placeholder for an id we hold no display data for.
    pub fn unknown(id: Id) -> Self {
        Self::new(id, id.to_string())
    }
}
