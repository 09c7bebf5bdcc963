use crate::backend::Scope;
use crate::model::Id;

/// What the operator currently has selected across console screens.
///
/// Passed explicitly to every operation that depends on it. Selecting a
/// different system or organization clears the selections that only make
/// sense inside the previous one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsoleContext {
    pub system_id: Option<Id>,
    pub organization_id: Option<Id>,
    pub team_id: Option<Id>,
    pub role_id: Option<Id>,
}

impl ConsoleContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch system. Roles belong to a system, so the role is cleared.
    pub fn with_system(self, system_id: Option<Id>) -> Self {
        if self.system_id == system_id {
            return self;
        }
        Self {
            system_id,
            role_id: None,
            ..self
        }
    }

    /// Switch organization. Teams and roles are cleared.
    pub fn with_organization(self, organization_id: Option<Id>) -> Self {
        if self.organization_id == organization_id {
            return self;
        }
        Self {
            organization_id,
            team_id: None,
            role_id: None,
            ..self
        }
    }

    pub fn with_team(self, team_id: Option<Id>) -> Self {
        Self { team_id, ..self }
    }

    pub fn with_role(self, role_id: Option<Id>) -> Self {
        Self { role_id, ..self }
    }

    /// Scope for loading the menu tree.
    pub fn menu_scope(&self) -> Scope {
        Scope {
            system_id: self.system_id,
            organization_id: None,
        }
    }

    /// Scope for loading the team tree.
    pub fn team_scope(&self) -> Scope {
        Scope {
            system_id: None,
            organization_id: self.organization_id,
        }
    }
}
