//! Maintenance ticket model.

use crate::model::record::{
    ChangeSet, ProjectId, Record, RecordId, RecordKind, RecordMeta, Timestamp,
};
use crate::model::validation::{require_non_negative, require_text, ValidationResult};
use serde::{Deserialize, Serialize};

/// Ticket lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl MaintenanceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Whether the ticket still needs work.
    pub fn is_open(self) -> bool {
        matches!(self, Self::Pending | Self::InProgress)
    }
}

/// Repair or upkeep request raised for a property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Maintenance {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub property_id: RecordId,
    pub description: String,
    /// Epoch milliseconds.
    pub request_date: Timestamp,
    pub status: MaintenanceStatus,
    pub cost: Option<f64>,
}

impl Maintenance {
    pub fn new(
        project_id: ProjectId,
        property_id: RecordId,
        description: impl Into<String>,
        request_date: Timestamp,
    ) -> Self {
        Self {
            meta: RecordMeta::draft(project_id),
            property_id,
            description: description.into(),
            request_date,
            status: MaintenanceStatus::Pending,
            cost: None,
        }
    }
}

impl Record for Maintenance {
    const KIND: RecordKind = RecordKind::Maintenance;

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn validate(&self) -> ValidationResult {
        require_text("description", &self.description)?;
        if let Some(cost) = self.cost {
            require_non_negative("cost", cost)?;
        }
        Ok(())
    }

    fn changed_fields(&self, previous: &Self) -> Vec<&'static str> {
        let mut changes = ChangeSet::new();
        changes.check("property_id", &self.property_id, &previous.property_id);
        changes.check("description", &self.description, &previous.description);
        changes.check("request_date", &self.request_date, &previous.request_date);
        changes.check("status", &self.status, &previous.status);
        changes.check("cost", &self.cost, &previous.cost);
        changes.finish()
    }

    fn label(&self) -> String {
        self.description.clone()
    }

    fn references(&self) -> Vec<(RecordKind, RecordId)> {
        vec![(RecordKind::Property, self.property_id)]
    }

    fn property_id(&self) -> Option<RecordId> {
        Some(self.property_id)
    }
}

#[cfg(test)]
mod tests {
    use super::{Maintenance, MaintenanceStatus};
    use crate::model::record::Record;
    use uuid::Uuid;

    #[test]
    fn new_ticket_starts_pending_and_open() {
        let ticket = Maintenance::new(Uuid::new_v4(), Uuid::new_v4(), "Leaking tap", 1);
        assert_eq!(ticket.status, MaintenanceStatus::Pending);
        assert!(ticket.status.is_open());
        assert!(!MaintenanceStatus::Completed.is_open());
    }

    #[test]
    fn negative_cost_is_rejected() {
        let mut ticket = Maintenance::new(Uuid::new_v4(), Uuid::new_v4(), "Boiler", 1);
        ticket.cost = Some(-1.0);
        assert!(ticket.validate().is_err());
        ticket.cost = Some(0.0);
        assert!(ticket.validate().is_ok());
    }
}
