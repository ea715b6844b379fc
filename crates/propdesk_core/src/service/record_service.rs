//! Record lifecycle use-case service.
//!
//! # Responsibility
//! - Provide list/get/create/update/delete for every record kind.
//! - Gate every write on the actor's project role.
//! - Stamp ids, creation metadata and history entries.
//!
//! # Invariants
//! - A created record has exactly one history entry (`created`).
//! - An update appends exactly one entry; stored entries are kept as-is,
//!   whatever history the caller passes in.
//! - Referenced records must exist in the same project before any write.
//!   An update only re-checks references it changes, so orphaned links stay
//!   editable.
//! - Validation and role failures leave storage untouched.

use crate::access::Action;
use crate::clock::{Clock, SystemClock};
use crate::model::record::{HistoryLog, ProjectId, RecordId, RecordKind, UserId};
use crate::repo::project_repo::ProjectRepository;
use crate::repo::record_repo::{RecordQuery, RecordRepository, RecordTable};
use crate::service::{authorize, ServiceError, ServiceResult};
use log::info;
use uuid::Uuid;

/// Use-case service for project-scoped record CRUD.
pub struct RecordService<R: RecordRepository, P: ProjectRepository> {
    records: R,
    projects: P,
    clock: Box<dyn Clock>,
}

impl<R: RecordRepository, P: ProjectRepository> RecordService<R, P> {
    /// Creates a service on the given repositories using the wall clock.
    pub fn new(records: R, projects: P) -> Self {
        Self {
            records,
            projects,
            clock: Box::new(SystemClock),
        }
    }

    /// Replaces the time source used for history timestamps.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// All records of kind `T` in the project, creation order.
    pub fn list<T: RecordTable>(&self, project_id: ProjectId) -> ServiceResult<Vec<T>> {
        Ok(self.records.list_records(&RecordQuery::project(project_id))?)
    }

    /// Records of kind `T` attached to one property.
    pub fn list_for_property<T: RecordTable>(
        &self,
        project_id: ProjectId,
        property_id: RecordId,
    ) -> ServiceResult<Vec<T>> {
        Ok(self
            .records
            .list_records(&RecordQuery::property(project_id, property_id))?)
    }

    pub fn get<T: RecordTable>(
        &self,
        project_id: ProjectId,
        id: RecordId,
    ) -> ServiceResult<Option<T>> {
        Ok(self.records.get_record(project_id, id)?)
    }

    /// Like `get`, but a missing record is an error.
    pub fn require<T: RecordTable>(&self, project_id: ProjectId, id: RecordId) -> ServiceResult<T> {
        self.get(project_id, id)?.ok_or(ServiceError::NotFound {
            entity: T::KIND.as_str(),
            id,
        })
    }

    /// Persists `draft` as a new record of `project_id`.
    ///
    /// # Contract
    /// - Assigns a fresh id and `created_at`, whatever the draft holds.
    /// - Custom fields get fresh ids too, so one draft can be created twice.
    /// - Initializes history to a single `created` entry by `actor`.
    pub fn create<T: RecordTable>(
        &self,
        project_id: ProjectId,
        mut draft: T,
        actor: UserId,
    ) -> ServiceResult<T> {
        authorize(&self.projects, project_id, actor, Action::CreateRecord)?;

        let now = self.clock.now_ms();
        {
            let meta = draft.meta_mut();
            meta.id = Uuid::new_v4();
            meta.project_id = project_id;
            meta.created_at = now;
            meta.history = vec![HistoryLog::created(actor, now)];
        }
        if let Some(fields) = draft.custom_fields_mut() {
            for field in fields.iter_mut() {
                field.id = Uuid::new_v4();
            }
        }
        draft.validate()?;
        self.ensure_references(&draft, &[])?;

        self.records.insert_record(&draft)?;
        info!(
            "event=record_create module=service status=ok kind={} id={} project={}",
            T::KIND.as_str(),
            draft.id(),
            project_id
        );
        Ok(draft)
    }

    /// Replaces a stored record and appends an `updated` history entry.
    ///
    /// # Contract
    /// - `created_at` and prior history come from storage.
    /// - The entry lists changed field names (`updated: name, surface`).
    pub fn update<T: RecordTable>(&self, mut entity: T, actor: UserId) -> ServiceResult<T> {
        let project_id = entity.project_id();
        authorize(&self.projects, project_id, actor, Action::UpdateRecord)?;

        let previous: T = self.require(project_id, entity.id())?;
        entity.validate()?;
        self.ensure_references(&entity, &previous.references())?;

        let changed = entity.changed_fields(&previous);
        let entry = HistoryLog::updated(actor, &changed, self.clock.now_ms());
        {
            let meta = entity.meta_mut();
            meta.created_at = previous.meta().created_at;
            meta.history = previous.meta().history.clone();
        }

        self.records.update_record(&entity, &entry)?;
        entity.meta_mut().history.push(entry);
        info!(
            "event=record_update module=service status=ok kind={} id={} changed_fields={}",
            T::KIND.as_str(),
            entity.id(),
            changed.len()
        );
        Ok(entity)
    }

    /// Removes a record. Its history rows stay in storage.
    pub fn delete<T: RecordTable>(
        &self,
        project_id: ProjectId,
        id: RecordId,
        actor: UserId,
    ) -> ServiceResult<()> {
        authorize(&self.projects, project_id, actor, Action::DeleteRecord)?;
        self.records.delete_record::<T>(project_id, id)?;
        info!(
            "event=record_delete module=service status=ok kind={} id={} project={}",
            T::KIND.as_str(),
            id,
            project_id
        );
        Ok(())
    }

    /// Checks every reference of `record` that is not already in `known`.
    fn ensure_references<T: RecordTable>(
        &self,
        record: &T,
        known: &[(RecordKind, RecordId)],
    ) -> ServiceResult<()> {
        for (kind, id) in record.references() {
            if known.contains(&(kind, id)) {
                continue;
            }
            if !self.records.record_exists(kind, record.project_id(), id)? {
                return Err(ServiceError::MissingReference { kind, id });
            }
        }
        Ok(())
    }
}
