//! Lease contract model linking a property and a tenant.

use crate::model::record::{
    ChangeSet, ProjectId, Record, RecordId, RecordKind, RecordMeta, Timestamp,
};
use crate::model::validation::{
    require_non_negative, require_positive, ValidationError, ValidationResult,
};
use serde::{Deserialize, Serialize};

/// Lease between one property and one tenant over a date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub property_id: RecordId,
    pub tenant_id: RecordId,
    /// Epoch milliseconds.
    pub start_date: Timestamp,
    /// Epoch milliseconds, strictly after `start_date`.
    pub end_date: Timestamp,
    pub rent_amount: f64,
    pub deposit: Option<f64>,
}

impl Contract {
    pub fn new(
        project_id: ProjectId,
        property_id: RecordId,
        tenant_id: RecordId,
        start_date: Timestamp,
        end_date: Timestamp,
        rent_amount: f64,
    ) -> Self {
        Self {
            meta: RecordMeta::draft(project_id),
            property_id,
            tenant_id,
            start_date,
            end_date,
            rent_amount,
            deposit: None,
        }
    }

    /// Whether `at` falls inside the contract period (end exclusive).
    pub fn is_active_at(&self, at: Timestamp) -> bool {
        self.start_date <= at && at < self.end_date
    }
}

impl Record for Contract {
    const KIND: RecordKind = RecordKind::Contract;

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn validate(&self) -> ValidationResult {
        if self.end_date <= self.start_date {
            return Err(ValidationError::InvalidRange {
                field: "contract_period",
                start: self.start_date,
                end: self.end_date,
            });
        }
        require_positive("rent_amount", self.rent_amount)?;
        if let Some(deposit) = self.deposit {
            require_non_negative("deposit", deposit)?;
        }
        Ok(())
    }

    fn changed_fields(&self, previous: &Self) -> Vec<&'static str> {
        let mut changes = ChangeSet::new();
        changes.check("property_id", &self.property_id, &previous.property_id);
        changes.check("tenant_id", &self.tenant_id, &previous.tenant_id);
        changes.check("start_date", &self.start_date, &previous.start_date);
        changes.check("end_date", &self.end_date, &previous.end_date);
        changes.check("rent_amount", &self.rent_amount, &previous.rent_amount);
        changes.check("deposit", &self.deposit, &previous.deposit);
        changes.finish()
    }

    fn label(&self) -> String {
        format!("contract {}..{}", self.start_date, self.end_date)
    }

    fn references(&self) -> Vec<(RecordKind, RecordId)> {
        vec![
            (RecordKind::Property, self.property_id),
            (RecordKind::Tenant, self.tenant_id),
        ]
    }

    fn property_id(&self) -> Option<RecordId> {
        Some(self.property_id)
    }
}

#[cfg(test)]
mod tests {
    use super::Contract;
    use crate::model::record::Record;
    use crate::model::validation::ValidationError;
    use uuid::Uuid;

    fn sample(start: i64, end: i64) -> Contract {
        Contract::new(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), start, end, 900.0)
    }

    #[test]
    fn end_must_follow_start() {
        assert!(matches!(
            sample(200, 200).validate().expect_err("empty period"),
            ValidationError::InvalidRange { .. }
        ));
        assert!(sample(100, 200).validate().is_ok());
    }

    #[test]
    fn active_window_is_end_exclusive() {
        let contract = sample(100, 200);
        assert!(contract.is_active_at(100));
        assert!(contract.is_active_at(199));
        assert!(!contract.is_active_at(200));
    }
}
