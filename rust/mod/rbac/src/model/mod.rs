pub mod candidate;
pub mod menu;
pub mod role;
pub mod team;
pub mod wire;

pub use candidate::Candidate;
pub use menu::{Menu, MenuOperation, OperationStatus};
pub use role::{PermissionBundle, RoleBindings, UserAssignment};
pub use team::Team;

/// Numeric identifier used by every platform resource.
pub type Id = u64;
