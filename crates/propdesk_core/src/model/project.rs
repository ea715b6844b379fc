//! Project (tenancy boundary), membership and user models.
//!
//! # Invariants
//! - The project owner is always a member with role `Owner`.
//! - A user appears at most once in `members`.
//! - User email is unique per store, compared case-insensitively.

use crate::model::record::{ProjectId, Timestamp, UserId};
use crate::model::validation::{require_email, require_text, ValidationResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-project capability tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectMemberRole {
    Owner,
    Editor,
    Viewer,
}

impl ProjectMemberRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Editor => "editor",
            Self::Viewer => "viewer",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "owner" => Some(Self::Owner),
            "editor" => Some(Self::Editor),
            "viewer" => Some(Self::Viewer),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMember {
    pub user_id: UserId,
    pub role: ProjectMemberRole,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub owner_id: UserId,
    pub members: Vec<ProjectMember>,
    /// Epoch milliseconds.
    pub created_at: Timestamp,
}

impl Project {
    /// New project whose only member is its owner.
    pub fn new(name: impl Into<String>, owner_id: UserId, created_at: Timestamp) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            owner_id,
            members: vec![ProjectMember {
                user_id: owner_id,
                role: ProjectMemberRole::Owner,
            }],
            created_at,
        }
    }

    /// Role of `user_id` in this project, `None` for non-members.
    pub fn role_of(&self, user_id: UserId) -> Option<ProjectMemberRole> {
        self.members
            .iter()
            .find(|member| member.user_id == user_id)
            .map(|member| member.role)
    }

    pub fn validate(&self) -> ValidationResult {
        require_text("project.name", &self.name)
    }
}

/// Application user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    /// Stored as provided; never serialized.
    #[serde(skip_serializing, default)]
    pub password: Option<String>,
}

impl User {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            password: None,
        }
    }

    pub fn validate(&self) -> ValidationResult {
        require_text("user.name", &self.name)?;
        require_email("user.email", &self.email)
    }
}
