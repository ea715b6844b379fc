//! User registration, project lifecycle and membership service.
//!
//! # Invariants
//! - Every project has exactly one owner, fixed at creation.
//! - The owner can be neither removed nor demoted.
//! - Membership changes and project deletion are owner-only.

use crate::access::Action;
use crate::clock::{Clock, SystemClock};
use crate::model::project::{Project, ProjectMember, ProjectMemberRole, User};
use crate::model::record::{ProjectId, UserId};
use crate::model::validation::require_text;
use crate::repo::project_repo::ProjectRepository;
use crate::service::{authorize, ServiceError, ServiceResult};
use log::info;

/// Use-case service for users, projects and members.
pub struct ProjectService<P: ProjectRepository> {
    projects: P,
    clock: Box<dyn Clock>,
}

impl<P: ProjectRepository> ProjectService<P> {
    pub fn new(projects: P) -> Self {
        Self {
            projects,
            clock: Box::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Registers a user; emails are unique case-insensitively.
    pub fn register_user(
        &self,
        name: &str,
        email: &str,
        password: Option<String>,
    ) -> ServiceResult<User> {
        let mut user = User::new(name.trim(), email.trim());
        user.password = password;
        user.validate()?;

        if self.projects.find_user_by_email(&user.email)?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "email `{}` is already registered",
                user.email
            )));
        }
        self.projects.create_user(&user)?;
        info!(
            "event=user_register module=service status=ok user={}",
            user.id
        );
        Ok(user)
    }

    pub fn get_user(&self, id: UserId) -> ServiceResult<Option<User>> {
        Ok(self.projects.get_user(id)?)
    }

    /// Creates a project owned by `owner_id`.
    pub fn create_project(&self, name: &str, owner_id: UserId) -> ServiceResult<Project> {
        self.require_user(owner_id)?;
        let project = Project::new(name.trim(), owner_id, self.clock.now_ms());
        project.validate()?;
        self.projects.create_project(&project)?;
        info!(
            "event=project_create module=service status=ok project={} owner={}",
            project.id, owner_id
        );
        Ok(project)
    }

    pub fn get_project(&self, id: ProjectId) -> ServiceResult<Option<Project>> {
        Ok(self.projects.get_project(id)?)
    }

    /// Projects where the user holds any role.
    pub fn list_projects_for_user(&self, user_id: UserId) -> ServiceResult<Vec<Project>> {
        Ok(self.projects.list_projects_for_user(user_id)?)
    }

    /// Renames a project. Owner-only, like other project settings.
    pub fn rename_project(
        &self,
        project_id: ProjectId,
        name: &str,
        actor: UserId,
    ) -> ServiceResult<Project> {
        let mut project = authorize(&self.projects, project_id, actor, Action::ManageMembers)?;
        require_text("project.name", name)?;
        project.name = name.trim().to_string();
        self.projects.rename_project(project_id, &project.name)?;
        Ok(project)
    }

    /// Adds `user_id` with a non-owner role.
    pub fn add_member(
        &self,
        project_id: ProjectId,
        user_id: UserId,
        role: ProjectMemberRole,
        actor: UserId,
    ) -> ServiceResult<Project> {
        let mut project = authorize(&self.projects, project_id, actor, Action::ManageMembers)?;
        reject_owner_role(role)?;
        self.require_user(user_id)?;
        if project.role_of(user_id).is_some() {
            return Err(ServiceError::Conflict(format!(
                "user {user_id} is already a member of project {project_id}"
            )));
        }

        let member = ProjectMember { user_id, role };
        self.projects.upsert_member(project_id, &member)?;
        project.members.push(member);
        info!(
            "event=member_add module=service status=ok project={} user={} role={}",
            project_id,
            user_id,
            role.as_str()
        );
        Ok(project)
    }

    /// Switches a member between editor and viewer.
    pub fn change_member_role(
        &self,
        project_id: ProjectId,
        user_id: UserId,
        role: ProjectMemberRole,
        actor: UserId,
    ) -> ServiceResult<Project> {
        let mut project = authorize(&self.projects, project_id, actor, Action::ManageMembers)?;
        reject_owner_role(role)?;
        ensure_not_owner(&project, user_id, "demoted")?;

        let member = project
            .members
            .iter_mut()
            .find(|member| member.user_id == user_id)
            .ok_or(ServiceError::NotFound {
                entity: "project member",
                id: user_id,
            })?;
        member.role = role;
        let member = member.clone();
        self.projects.upsert_member(project_id, &member)?;
        info!(
            "event=member_role module=service status=ok project={} user={} role={}",
            project_id,
            user_id,
            role.as_str()
        );
        Ok(project)
    }

    pub fn remove_member(
        &self,
        project_id: ProjectId,
        user_id: UserId,
        actor: UserId,
    ) -> ServiceResult<Project> {
        let mut project = authorize(&self.projects, project_id, actor, Action::ManageMembers)?;
        ensure_not_owner(&project, user_id, "removed")?;
        self.projects.remove_member(project_id, user_id)?;
        project.members.retain(|member| member.user_id != user_id);
        info!(
            "event=member_remove module=service status=ok project={} user={}",
            project_id, user_id
        );
        Ok(project)
    }

    /// Deletes the project and every record scoped to it.
    pub fn delete_project(&self, project_id: ProjectId, actor: UserId) -> ServiceResult<()> {
        authorize(&self.projects, project_id, actor, Action::DeleteProject)?;
        self.projects.delete_project(project_id)?;
        info!(
            "event=project_delete module=service status=ok project={}",
            project_id
        );
        Ok(())
    }

    fn require_user(&self, id: UserId) -> ServiceResult<User> {
        self.projects
            .get_user(id)?
            .ok_or(ServiceError::NotFound { entity: "user", id })
    }
}

fn reject_owner_role(role: ProjectMemberRole) -> ServiceResult<()> {
    if role == ProjectMemberRole::Owner {
        return Err(ServiceError::Conflict(
            "a project has exactly one owner".to_string(),
        ));
    }
    Ok(())
}

fn ensure_not_owner(project: &Project, user_id: UserId, verb: &str) -> ServiceResult<()> {
    if project.owner_id == user_id {
        return Err(ServiceError::Conflict(format!(
            "the project owner cannot be {verb}"
        )));
    }
    Ok(())
}
