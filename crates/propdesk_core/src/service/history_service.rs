//! Aggregated history reads.
//!
//! # Responsibility
//! - Build the per-property feed from the property and every record
//!   attached to it.
//! - Expose single-record history, newest first.
//!
//! # Invariants
//! - Feed order is timestamp descending; entries of one record with equal
//!   timestamps come latest-appended first.
//! - Entries are never deduplicated or rewritten.
//! - Reading history requires `Action::ViewHistory`.

use crate::access::Action;
use crate::model::contract::Contract;
use crate::model::deadline::Deadline;
use crate::model::document::Document;
use crate::model::expense::Expense;
use crate::model::maintenance::Maintenance;
use crate::model::property::Property;
use crate::model::record::{HistoryLog, ProjectId, Record, RecordId, RecordKind, UserId};
use crate::model::tenant::Tenant;
use crate::repo::project_repo::ProjectRepository;
use crate::repo::record_repo::{RecordQuery, RecordRepository, RecordTable};
use crate::service::{authorize, ServiceError, ServiceResult};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One history entry tagged with the record it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryFeedEntry {
    pub source: RecordKind,
    pub record_id: RecordId,
    pub label: String,
    pub log: HistoryLog,
}

/// Read-only service over record histories.
pub struct HistoryService<R: RecordRepository, P: ProjectRepository> {
    records: R,
    projects: P,
}

impl<R: RecordRepository, P: ProjectRepository> HistoryService<R, P> {
    pub fn new(records: R, projects: P) -> Self {
        Self { records, projects }
    }

    /// Merged history of a property and everything attached to it.
    ///
    /// Sources: the property, its expenses, maintenance, deadlines,
    /// documents and contracts, plus tenants named on those contracts.
    pub fn property_feed(
        &self,
        project_id: ProjectId,
        property_id: RecordId,
        viewer: UserId,
    ) -> ServiceResult<Vec<HistoryFeedEntry>> {
        authorize(&self.projects, project_id, viewer, Action::ViewHistory)?;

        let property: Property = self.records.get_record(project_id, property_id)?.ok_or(
            ServiceError::NotFound {
                entity: RecordKind::Property.as_str(),
                id: property_id,
            },
        )?;

        let mut entries = Vec::new();
        push_entries(&mut entries, &property);
        self.push_attached::<Expense>(&mut entries, project_id, property_id)?;
        self.push_attached::<Maintenance>(&mut entries, project_id, property_id)?;
        self.push_attached::<Deadline>(&mut entries, project_id, property_id)?;
        self.push_attached::<Document>(&mut entries, project_id, property_id)?;

        let contracts: Vec<Contract> = self
            .records
            .list_records(&RecordQuery::property(project_id, property_id))?;
        let tenant_ids: BTreeSet<RecordId> =
            contracts.iter().map(|contract| contract.tenant_id).collect();
        for contract in &contracts {
            push_entries(&mut entries, contract);
        }
        for tenant_id in tenant_ids {
            // Tenants deleted after signing leave a dangling contract link.
            if let Some(tenant) = self.records.get_record::<Tenant>(project_id, tenant_id)? {
                push_entries(&mut entries, &tenant);
            }
        }

        entries.reverse();
        entries.sort_by(|left, right| right.log.timestamp.cmp(&left.log.timestamp));
        debug!(
            "event=property_feed module=service status=ok property={} entries={}",
            property_id,
            entries.len()
        );
        Ok(entries)
    }

    /// History of one record, newest first.
    pub fn record_history<T: RecordTable>(
        &self,
        project_id: ProjectId,
        id: RecordId,
        viewer: UserId,
    ) -> ServiceResult<Vec<HistoryLog>> {
        authorize(&self.projects, project_id, viewer, Action::ViewHistory)?;
        let record: T = self
            .records
            .get_record(project_id, id)?
            .ok_or(ServiceError::NotFound {
                entity: T::KIND.as_str(),
                id,
            })?;
        Ok(record.meta().history_newest_first())
    }

    fn push_attached<T: RecordTable>(
        &self,
        entries: &mut Vec<HistoryFeedEntry>,
        project_id: ProjectId,
        property_id: RecordId,
    ) -> ServiceResult<()> {
        let records: Vec<T> = self
            .records
            .list_records(&RecordQuery::property(project_id, property_id))?;
        for record in &records {
            push_entries(entries, record);
        }
        Ok(())
    }
}

fn push_entries<T: Record>(entries: &mut Vec<HistoryFeedEntry>, record: &T) {
    let label = record.label();
    entries.extend(record.history().iter().map(|log| HistoryFeedEntry {
        source: T::KIND,
        record_id: record.id(),
        label: label.clone(),
        log: log.clone(),
    }));
}
