//! Role-based capability checks for project actions.
//!
//! # Responsibility
//! - Map `(role, action)` pairs to allow/deny in one place.
//!
//! # Invariants
//! - Viewers never mutate.
//! - History, membership and project deletion are owner-only.

use crate::model::project::ProjectMemberRole;

/// Project action guarded by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    CreateRecord,
    UpdateRecord,
    DeleteRecord,
    ViewHistory,
    ManageMembers,
    DeleteProject,
}

impl Action {
    /// Stable string id used in logs and error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreateRecord => "create_record",
            Self::UpdateRecord => "update_record",
            Self::DeleteRecord => "delete_record",
            Self::ViewHistory => "view_history",
            Self::ManageMembers => "manage_members",
            Self::DeleteProject => "delete_project",
        }
    }
}

/// Returns whether `role` may perform `action`.
pub fn can_mutate(role: ProjectMemberRole, action: Action) -> bool {
    match action {
        Action::CreateRecord | Action::UpdateRecord | Action::DeleteRecord => matches!(
            role,
            ProjectMemberRole::Owner | ProjectMemberRole::Editor
        ),
        Action::ViewHistory | Action::ManageMembers | Action::DeleteProject => {
            role == ProjectMemberRole::Owner
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{can_mutate, Action};
    use crate::model::project::ProjectMemberRole;

    const RECORD_ACTIONS: [Action; 3] = [
        Action::CreateRecord,
        Action::UpdateRecord,
        Action::DeleteRecord,
    ];
    const OWNER_ACTIONS: [Action; 3] = [
        Action::ViewHistory,
        Action::ManageMembers,
        Action::DeleteProject,
    ];

    #[test]
    fn owner_can_do_everything() {
        for action in RECORD_ACTIONS.into_iter().chain(OWNER_ACTIONS) {
            assert!(can_mutate(ProjectMemberRole::Owner, action), "{}", action.as_str());
        }
    }

    #[test]
    fn editor_mutates_records_only() {
        for action in RECORD_ACTIONS {
            assert!(can_mutate(ProjectMemberRole::Editor, action));
        }
        for action in OWNER_ACTIONS {
            assert!(!can_mutate(ProjectMemberRole::Editor, action));
        }
    }

    #[test]
    fn viewer_is_read_only() {
        for action in RECORD_ACTIONS.into_iter().chain(OWNER_ACTIONS) {
            assert!(!can_mutate(ProjectMemberRole::Viewer, action));
        }
    }
}
