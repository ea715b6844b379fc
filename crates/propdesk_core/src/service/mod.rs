//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Resolve actor roles and apply `can_mutate` before every write.
//! - Keep callers decoupled from storage details.

pub mod history_service;
pub mod project_service;
pub mod record_service;

use crate::access::{can_mutate, Action};
use crate::model::project::{Project, ProjectMemberRole};
use crate::model::record::{ProjectId, RecordId, RecordKind, UserId};
use crate::model::validation::ValidationError;
use crate::repo::project_repo::ProjectRepository;
use crate::repo::record_repo::RepoError;
use log::warn;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors surfaced to form and command callers.
#[derive(Debug)]
pub enum ServiceError {
    /// Input failed synchronous validation; nothing was written.
    Validation(ValidationError),
    /// Target project, record, user or member does not exist.
    NotFound { entity: &'static str, id: Uuid },
    /// A referenced record is missing from the project.
    MissingReference { kind: RecordKind, id: RecordId },
    /// Actor's role (or lack of membership) does not allow the action.
    Forbidden {
        role: Option<ProjectMemberRole>,
        action: Action,
    },
    /// Request conflicts with existing state.
    Conflict(String),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::MissingReference { kind, id } => {
                write!(f, "referenced {} not found: {id}", kind.as_str())
            }
            Self::Forbidden { role, action } => match role {
                Some(role) => write!(
                    f,
                    "role `{}` may not perform `{}`",
                    role.as_str(),
                    action.as_str()
                ),
                None => write!(f, "non-members may not perform `{}`", action.as_str()),
            },
            Self::Conflict(message) => write!(f, "{message}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::NotFound { entity, id } => Self::NotFound { entity, id },
            RepoError::Conflict(message) => Self::Conflict(message),
            other => Self::Repo(other),
        }
    }
}

/// Loads the project and checks `actor` may perform `action` in it.
pub(crate) fn authorize<P: ProjectRepository>(
    projects: &P,
    project_id: ProjectId,
    actor: UserId,
    action: Action,
) -> ServiceResult<Project> {
    let project = projects
        .get_project(project_id)?
        .ok_or(ServiceError::NotFound {
            entity: "project",
            id: project_id,
        })?;

    let role = project.role_of(actor);
    if !role.is_some_and(|role| can_mutate(role, action)) {
        warn!(
            "event=access_denied module=service status=error action={} project={} user={}",
            action.as_str(),
            project_id,
            actor
        );
        return Err(ServiceError::Forbidden { role, action });
    }
    Ok(project)
}
