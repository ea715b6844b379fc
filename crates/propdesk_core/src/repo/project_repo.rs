//! Project, membership and user repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist users, projects and role-tagged project members.
//! - Delete projects with a cascade over every project-scoped table.
//!
//! # Invariants
//! - Creating a project also stores its owner as an `owner` member.
//! - Project deletion never touches `history_logs`.

use crate::model::project::{Project, ProjectMember, ProjectMemberRole, User};
use crate::model::record::{ProjectId, UserId};
use crate::repo::record_repo::{ensure_connection_ready, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row, Transaction, TransactionBehavior};

/// Repository interface for users, projects and members.
pub trait ProjectRepository {
    fn create_user(&self, user: &User) -> RepoResult<()>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    /// Case-insensitive email lookup.
    fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    /// Inserts a user or refreshes name/email by id. Keeps a stored
    /// password when `user.password` is `None`.
    fn upsert_user(&self, user: &User) -> RepoResult<()>;
    fn create_project(&self, project: &Project) -> RepoResult<()>;
    /// Inserts or renames a project and upserts its members, without
    /// opening a transaction of its own. Only `owner_id` may hold the
    /// Owner role; any other Owner member is a conflict.
    fn upsert_project(&self, project: &Project) -> RepoResult<()>;
    fn get_project(&self, id: ProjectId) -> RepoResult<Option<Project>>;
    fn rename_project(&self, id: ProjectId, name: &str) -> RepoResult<()>;
    /// Projects where `user_id` is a member, oldest first.
    fn list_projects_for_user(&self, user_id: UserId) -> RepoResult<Vec<Project>>;
    /// Inserts a member or changes the role of an existing one.
    fn upsert_member(&self, project_id: ProjectId, member: &ProjectMember) -> RepoResult<()>;
    fn remove_member(&self, project_id: ProjectId, user_id: UserId) -> RepoResult<()>;
    /// Deletes a project and every record scoped to it.
    fn delete_project(&self, id: ProjectId) -> RepoResult<()>;
}

/// SQLite-backed project repository.
pub struct SqliteProjectRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProjectRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ProjectRepository for SqliteProjectRepository<'_> {
    fn create_user(&self, user: &User) -> RepoResult<()> {
        user.validate()?;

        let result = self.conn.execute(
            "INSERT INTO users (id, name, email, password) VALUES (?1, ?2, ?3, ?4);",
            params![
                user.id.to_string(),
                user.name.as_str(),
                user.email.trim(),
                user.password.as_deref(),
            ],
        );
        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Err(RepoError::Conflict(format!(
                    "email `{}` is already registered",
                    user.email.trim()
                )))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        self.conn
            .query_row(
                "SELECT id, name, email, password FROM users WHERE id = ?1;",
                [id.to_string()],
                |row| Ok(parse_user_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        self.conn
            .query_row(
                "SELECT id, name, email, password FROM users WHERE email = ?1;",
                [email.trim()],
                |row| Ok(parse_user_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn upsert_user(&self, user: &User) -> RepoResult<()> {
        user.validate()?;
        let result = self.conn.execute(
            "INSERT INTO users (id, name, email, password) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE
             SET name = excluded.name,
                 email = excluded.email,
                 password = COALESCE(excluded.password, users.password);",
            params![
                user.id.to_string(),
                user.name.as_str(),
                user.email.trim(),
                user.password.as_deref(),
            ],
        );
        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Err(RepoError::Conflict(format!(
                    "email `{}` belongs to another user",
                    user.email.trim()
                )))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn create_project(&self, project: &Project) -> RepoResult<()> {
        project.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO projects (id, name, owner_id, created_at) VALUES (?1, ?2, ?3, ?4);",
            params![
                project.id.to_string(),
                project.name.as_str(),
                project.owner_id.to_string(),
                project.created_at,
            ],
        )?;
        write_members(&tx, project)?;
        tx.commit()?;
        Ok(())
    }

    fn upsert_project(&self, project: &Project) -> RepoResult<()> {
        project.validate()?;
        if let Some(member) = project.members.iter().find(|member| {
            member.role == ProjectMemberRole::Owner && member.user_id != project.owner_id
        }) {
            return Err(RepoError::Conflict(format!(
                "user {} cannot be an owner of project {}",
                member.user_id, project.id
            )));
        }
        let changed = self.conn.execute(
            "INSERT INTO projects (id, name, owner_id, created_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET name = excluded.name
             WHERE projects.owner_id = excluded.owner_id;",
            params![
                project.id.to_string(),
                project.name.as_str(),
                project.owner_id.to_string(),
                project.created_at,
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::Conflict(format!(
                "project {} already exists with another owner",
                project.id
            )));
        }
        write_members(self.conn, project)?;
        Ok(())
    }

    fn get_project(&self, id: ProjectId) -> RepoResult<Option<Project>> {
        let project = self
            .conn
            .query_row(
                "SELECT id, name, owner_id, created_at FROM projects WHERE id = ?1;",
                [id.to_string()],
                |row| Ok(parse_project_row(row)),
            )
            .optional()?
            .transpose()?;

        match project {
            Some(mut project) => {
                project.members = list_members(self.conn, project.id)?;
                Ok(Some(project))
            }
            None => Ok(None),
        }
    }

    fn rename_project(&self, id: ProjectId, name: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE projects SET name = ?2 WHERE id = ?1;",
            params![id.to_string(), name],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "project",
                id,
            });
        }
        Ok(())
    }

    fn list_projects_for_user(&self, user_id: UserId) -> RepoResult<Vec<Project>> {
        let mut stmt = self.conn.prepare(
            "SELECT p.id, p.name, p.owner_id, p.created_at
             FROM projects p
             JOIN project_members m ON m.project_id = p.id
             WHERE m.user_id = ?1
             ORDER BY p.created_at ASC, p.id ASC;",
        )?;
        let mut rows = stmt.query([user_id.to_string()])?;
        let mut projects = Vec::new();
        while let Some(row) = rows.next()? {
            projects.push(parse_project_row(row)?);
        }
        for project in &mut projects {
            project.members = list_members(self.conn, project.id)?;
        }
        Ok(projects)
    }

    fn upsert_member(&self, project_id: ProjectId, member: &ProjectMember) -> RepoResult<()> {
        insert_or_replace_member(self.conn, project_id, member)
    }

    fn remove_member(&self, project_id: ProjectId, user_id: UserId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM project_members WHERE project_id = ?1 AND user_id = ?2;",
            params![project_id.to_string(), user_id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "project member",
                id: user_id,
            });
        }
        Ok(())
    }

    fn delete_project(&self, id: ProjectId) -> RepoResult<()> {
        // Scoped tables and custom fields cascade through `ON DELETE CASCADE`.
        let changed = self
            .conn
            .execute("DELETE FROM projects WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "project",
                id,
            });
        }
        Ok(())
    }
}

fn write_members(conn: &Connection, project: &Project) -> RepoResult<()> {
    for member in &project.members {
        insert_or_replace_member(conn, project.id, member)?;
    }
    if project.role_of(project.owner_id) != Some(ProjectMemberRole::Owner) {
        insert_or_replace_member(
            conn,
            project.id,
            &ProjectMember {
                user_id: project.owner_id,
                role: ProjectMemberRole::Owner,
            },
        )?;
    }
    Ok(())
}

fn insert_or_replace_member(
    conn: &Connection,
    project_id: ProjectId,
    member: &ProjectMember,
) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO project_members (project_id, user_id, role)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(project_id, user_id) DO UPDATE SET role = excluded.role;",
        params![
            project_id.to_string(),
            member.user_id.to_string(),
            member.role.as_str(),
        ],
    )?;
    Ok(())
}

fn list_members(conn: &Connection, project_id: ProjectId) -> RepoResult<Vec<ProjectMember>> {
    let mut stmt = conn.prepare(
        "SELECT user_id, role
         FROM project_members
         WHERE project_id = ?1
         ORDER BY CASE role WHEN 'owner' THEN 0 WHEN 'editor' THEN 1 ELSE 2 END, user_id ASC;",
    )?;
    let mut rows = stmt.query([project_id.to_string()])?;
    let mut members = Vec::new();
    while let Some(row) = rows.next()? {
        let user_id: String = row.get("user_id")?;
        let role_text: String = row.get("role")?;
        let role = ProjectMemberRole::parse(&role_text).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid role `{role_text}` in project_members.role"
            ))
        })?;
        members.push(ProjectMember {
            user_id: parse_uuid(&user_id, "project_members.user_id")?,
            role,
        });
    }
    Ok(members)
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let id: String = row.get("id")?;
    Ok(User {
        id: parse_uuid(&id, "users.id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        password: row.get("password")?,
    })
}

fn parse_project_row(row: &Row<'_>) -> RepoResult<Project> {
    let id: String = row.get("id")?;
    let owner_id: String = row.get("owner_id")?;
    Ok(Project {
        id: parse_uuid(&id, "projects.id")?,
        name: row.get("name")?,
        owner_id: parse_uuid(&owner_id, "projects.owner_id")?,
        members: Vec::new(),
        created_at: row.get("created_at")?,
    })
}
