//! Explicit store handle owning the SQLite connection.
//!
//! # Responsibility
//! - Open a migrated database and hand out services bound to it.
//! - Load a whole project as a serializable snapshot and save one back.
//!
//! # Invariants
//! - `save` runs in a single transaction; a failure persists nothing.
//! - `save` never rewrites stored history; it appends missing entries.
//! - Every record change made through `save` is audited and role-checked.
//! - Records absent from a saved snapshot are left in place.

use crate::access::Action;
use crate::clock::{Clock, SystemClock};
use crate::db::{open_db, open_db_in_memory};
use crate::model::contract::Contract;
use crate::model::deadline::Deadline;
use crate::model::document::Document;
use crate::model::expense::Expense;
use crate::model::maintenance::Maintenance;
use crate::model::project::{Project, User};
use crate::model::property::Property;
use crate::model::record::{HistoryLog, ProjectId, Timestamp, UserId, HISTORY_CREATED};
use crate::model::tenant::Tenant;
use crate::repo::project_repo::{ProjectRepository, SqliteProjectRepository};
use crate::repo::record_repo::{
    RecordQuery, RecordRepository, RecordTable, RepoError, RepoResult, SqliteRecordRepository,
};
use crate::service::history_service::HistoryService;
use crate::service::project_service::ProjectService;
use crate::service::record_service::RecordService;
use crate::service::{authorize, ServiceError, ServiceResult};
use log::{error, info, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::rc::Rc;
use uuid::Uuid;

/// Record service bound to a store connection.
pub type StoreRecordService<'conn> =
    RecordService<SqliteRecordRepository<'conn>, SqliteProjectRepository<'conn>>;
/// History service bound to a store connection.
pub type StoreHistoryService<'conn> =
    HistoryService<SqliteRecordRepository<'conn>, SqliteProjectRepository<'conn>>;
/// Project service bound to a store connection.
pub type StoreProjectService<'conn> = ProjectService<SqliteProjectRepository<'conn>>;

/// Everything one project owns, in creation order per kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    pub project: Project,
    /// Users referenced by `project.members`.
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub properties: Vec<Property>,
    #[serde(default)]
    pub tenants: Vec<Tenant>,
    #[serde(default)]
    pub contracts: Vec<Contract>,
    #[serde(default)]
    pub expenses: Vec<Expense>,
    #[serde(default)]
    pub maintenance: Vec<Maintenance>,
    #[serde(default)]
    pub deadlines: Vec<Deadline>,
    #[serde(default)]
    pub documents: Vec<Document>,
}

impl ProjectSnapshot {
    /// Total number of records across every kind.
    pub fn record_count(&self) -> usize {
        self.properties.len()
            + self.tenants.len()
            + self.contracts.len()
            + self.expenses.len()
            + self.maintenance.len()
            + self.deadlines.len()
            + self.documents.len()
    }
}

/// Owner of the database connection for one process.
pub struct EstateStore {
    conn: Connection,
    clock: Rc<dyn Clock>,
}

impl EstateStore {
    /// Opens (or creates) a database file and applies migrations.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        Ok(Self::from_connection(open_db(path)?))
    }

    pub fn open_in_memory() -> RepoResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn,
            clock: Rc::new(SystemClock),
        }
    }

    /// Replaces the time source shared by every service this store hands out.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Rc::new(clock);
        self
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn records(&self) -> RepoResult<StoreRecordService<'_>> {
        Ok(RecordService::new(
            SqliteRecordRepository::try_new(&self.conn)?,
            SqliteProjectRepository::try_new(&self.conn)?,
        )
        .with_clock(Rc::clone(&self.clock)))
    }

    pub fn projects(&self) -> RepoResult<StoreProjectService<'_>> {
        Ok(ProjectService::new(SqliteProjectRepository::try_new(&self.conn)?)
            .with_clock(Rc::clone(&self.clock)))
    }

    pub fn history(&self) -> RepoResult<StoreHistoryService<'_>> {
        Ok(HistoryService::new(
            SqliteRecordRepository::try_new(&self.conn)?,
            SqliteProjectRepository::try_new(&self.conn)?,
        ))
    }

    /// Reads a project, its member users and all of its records.
    pub fn load(&self, project_id: ProjectId) -> ServiceResult<ProjectSnapshot> {
        let projects = SqliteProjectRepository::try_new(&self.conn)?;
        let records = SqliteRecordRepository::try_new(&self.conn)?;

        let project = projects
            .get_project(project_id)?
            .ok_or(ServiceError::NotFound {
                entity: "project",
                id: project_id,
            })?;
        let mut users = Vec::with_capacity(project.members.len());
        for member in &project.members {
            if let Some(user) = projects.get_user(member.user_id)? {
                users.push(user);
            }
        }

        let query = RecordQuery::project(project_id);
        let snapshot = ProjectSnapshot {
            project,
            users,
            properties: records.list_records(&query)?,
            tenants: records.list_records(&query)?,
            contracts: records.list_records(&query)?,
            expenses: records.list_records(&query)?,
            maintenance: records.list_records(&query)?,
            deadlines: records.list_records(&query)?,
            documents: records.list_records(&query)?,
        };
        info!(
            "event=store_load module=store status=ok project={} records={}",
            project_id,
            snapshot.record_count()
        );
        Ok(snapshot)
    }

    /// Persists a snapshot atomically on behalf of `actor`.
    ///
    /// # Contract
    /// - A stored project needs `UpdateRecord` from `actor`, plus
    ///   `ManageMembers` when the name or a member role changes. A project
    ///   not stored yet can only be imported by its owner.
    /// - Users, project, members and records are upserted by id.
    /// - Stored history is kept. A new record without history gets a
    ///   `created` entry by `actor`. A changed record that brings no new
    ///   entry gets an `updated` entry listing its changed fields.
    /// - Unchanged records are not rewritten.
    /// - Every record must belong to `snapshot.project`.
    pub fn save(&self, snapshot: &ProjectSnapshot, actor: UserId) -> ServiceResult<()> {
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)
            .map_err(RepoError::from)?;
        let mut writer =
            SnapshotWriter::new(&tx, snapshot.project.id, actor, self.clock.now_ms())?;
        if let Err(err) = writer.write(snapshot) {
            error!(
                "event=store_save module=store status=error project={} user={} error={}",
                snapshot.project.id, actor, err
            );
            return Err(err);
        }
        let (written, audited) = (writer.written, writer.audited);
        drop(writer);
        tx.commit().map_err(RepoError::from)?;
        info!(
            "event=store_save module=store status=ok project={} user={} records={} written={} audited={}",
            snapshot.project.id,
            actor,
            snapshot.record_count(),
            written,
            audited
        );
        Ok(())
    }
}

/// Applies one snapshot inside the caller's transaction.
struct SnapshotWriter<'conn> {
    projects: SqliteProjectRepository<'conn>,
    records: SqliteRecordRepository<'conn>,
    project_id: ProjectId,
    actor: UserId,
    now: Timestamp,
    written: usize,
    audited: usize,
}

impl<'conn> SnapshotWriter<'conn> {
    fn new(
        conn: &'conn Connection,
        project_id: ProjectId,
        actor: UserId,
        now: Timestamp,
    ) -> RepoResult<Self> {
        Ok(Self {
            projects: SqliteProjectRepository::try_new(conn)?,
            records: SqliteRecordRepository::try_new(conn)?,
            project_id,
            actor,
            now,
            written: 0,
            audited: 0,
        })
    }

    fn write(&mut self, snapshot: &ProjectSnapshot) -> ServiceResult<()> {
        self.check_access(&snapshot.project)?;

        for user in &snapshot.users {
            self.projects.upsert_user(user)?;
        }
        self.projects.upsert_project(&snapshot.project)?;

        self.write_all(&snapshot.properties)?;
        self.write_all(&snapshot.tenants)?;
        self.write_all(&snapshot.contracts)?;
        self.write_all(&snapshot.expenses)?;
        self.write_all(&snapshot.maintenance)?;
        self.write_all(&snapshot.deadlines)?;
        self.write_all(&snapshot.documents)?;
        Ok(())
    }

    fn check_access(&self, project: &Project) -> ServiceResult<()> {
        let Some(stored) = self.projects.get_project(project.id)? else {
            if project.owner_id == self.actor {
                return Ok(());
            }
            warn!(
                "event=access_denied module=store status=error action=import project={} user={}",
                project.id, self.actor
            );
            return Err(ServiceError::Forbidden {
                role: None,
                action: Action::UpdateRecord,
            });
        };

        authorize(&self.projects, project.id, self.actor, Action::UpdateRecord)?;
        let settings_changed = stored.name != project.name
            || project
                .members
                .iter()
                .any(|member| stored.role_of(member.user_id) != Some(member.role));
        if settings_changed {
            authorize(&self.projects, project.id, self.actor, Action::ManageMembers)?;
        }
        Ok(())
    }

    fn write_all<T: RecordTable>(&mut self, items: &[T]) -> ServiceResult<()> {
        for item in items {
            if item.project_id() != self.project_id {
                return Err(ServiceError::Conflict(format!(
                    "{} {} belongs to project {}, not {}",
                    T::KIND.as_str(),
                    item.id(),
                    item.project_id(),
                    self.project_id
                )));
            }
            let stored: Option<T> = self.records.get_record(self.project_id, item.id())?;
            if let Some(record) = self.audit(item, stored)? {
                self.records.upsert_record(&record)?;
                self.written += 1;
            }
        }
        Ok(())
    }

    /// Returns the record to write with its audit entry added, or `None`
    /// when nothing changed.
    fn audit<T: RecordTable>(&mut self, item: &T, stored: Option<T>) -> ServiceResult<Option<T>> {
        let mut record = item.clone();
        match stored {
            None if record.history().is_empty() => {
                let meta = record.meta_mut();
                meta.created_at = self.now;
                meta.history = vec![HistoryLog::created(self.actor, self.now)];
                self.audited += 1;
            }
            None => {
                if record.history()[0].description != HISTORY_CREATED {
                    return Err(ServiceError::Conflict(format!(
                        "{} {} history must start with a `{HISTORY_CREATED}` entry",
                        T::KIND.as_str(),
                        record.id()
                    )));
                }
            }
            Some(stored) => {
                let known: HashSet<Uuid> = stored.history().iter().map(|entry| entry.id).collect();
                let appended = record
                    .history()
                    .iter()
                    .any(|entry| !known.contains(&entry.id));
                let changed = record.changed_fields(&stored);
                if changed.is_empty() && !appended {
                    return Ok(None);
                }
                if !appended {
                    let entry = HistoryLog::updated(self.actor, &changed, self.now);
                    record.meta_mut().history.push(entry);
                    self.audited += 1;
                }
            }
        }
        Ok(Some(record))
    }
}
