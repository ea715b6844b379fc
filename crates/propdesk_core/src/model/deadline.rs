//! Deadline (due date) model.

use crate::model::record::{
    ChangeSet, ProjectId, Record, RecordId, RecordKind, RecordMeta, Timestamp,
};
use crate::model::validation::{require_other_detail, require_text, ValidationResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "other", rename_all = "snake_case")]
pub enum DeadlineKind {
    RentPayment,
    ContractRenewal,
    Tax,
    Insurance,
    Inspection,
    Other(String),
}

/// Dated obligation attached to a property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deadline {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub property_id: RecordId,
    pub title: String,
    /// Epoch milliseconds.
    pub due_date: Timestamp,
    pub kind: DeadlineKind,
    pub is_completed: bool,
}

impl Deadline {
    pub fn new(
        project_id: ProjectId,
        property_id: RecordId,
        title: impl Into<String>,
        due_date: Timestamp,
        kind: DeadlineKind,
    ) -> Self {
        Self {
            meta: RecordMeta::draft(project_id),
            property_id,
            title: title.into(),
            due_date,
            kind,
            is_completed: false,
        }
    }

    /// Open and already past due at `now`.
    pub fn is_overdue(&self, now: Timestamp) -> bool {
        !self.is_completed && self.due_date < now
    }
}

impl Record for Deadline {
    const KIND: RecordKind = RecordKind::Deadline;

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn validate(&self) -> ValidationResult {
        require_text("title", &self.title)?;
        if let DeadlineKind::Other(detail) = &self.kind {
            require_other_detail("kind_other", detail)?;
        }
        Ok(())
    }

    fn changed_fields(&self, previous: &Self) -> Vec<&'static str> {
        let mut changes = ChangeSet::new();
        changes.check("property_id", &self.property_id, &previous.property_id);
        changes.check("title", &self.title, &previous.title);
        changes.check("due_date", &self.due_date, &previous.due_date);
        changes.check("kind", &self.kind, &previous.kind);
        changes.check("is_completed", &self.is_completed, &previous.is_completed);
        changes.finish()
    }

    fn label(&self) -> String {
        self.title.clone()
    }

    fn references(&self) -> Vec<(RecordKind, RecordId)> {
        vec![(RecordKind::Property, self.property_id)]
    }

    fn property_id(&self) -> Option<RecordId> {
        Some(self.property_id)
    }
}
