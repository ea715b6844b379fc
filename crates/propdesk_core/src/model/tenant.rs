//! Tenant domain model.

use crate::model::custom_field::{validate_fields, CustomField};
use crate::model::record::{ChangeSet, ProjectId, Record, RecordId, RecordKind, RecordMeta};
use crate::model::validation::{require_email, require_text, ValidationResult};
use serde::{Deserialize, Serialize};

/// Person renting one of the project's properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenant {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub name: String,
    pub email: String,
    pub phone: String,
    /// Active contract, when one is linked.
    pub contract_id: Option<RecordId>,
    #[serde(default)]
    pub custom_fields: Vec<CustomField>,
}

impl Tenant {
    pub fn new(
        project_id: ProjectId,
        name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            meta: RecordMeta::draft(project_id),
            name: name.into(),
            email: email.into(),
            phone: phone.into(),
            contract_id: None,
            custom_fields: Vec::new(),
        }
    }
}

impl Record for Tenant {
    const KIND: RecordKind = RecordKind::Tenant;

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn validate(&self) -> ValidationResult {
        require_text("name", &self.name)?;
        require_email("email", &self.email)?;
        require_text("phone", &self.phone)?;
        validate_fields(&self.custom_fields)
    }

    fn changed_fields(&self, previous: &Self) -> Vec<&'static str> {
        let mut changes = ChangeSet::new();
        changes.check("name", &self.name, &previous.name);
        changes.check("email", &self.email, &previous.email);
        changes.check("phone", &self.phone, &previous.phone);
        changes.check("contract_id", &self.contract_id, &previous.contract_id);
        changes.check("custom_fields", &self.custom_fields, &previous.custom_fields);
        changes.finish()
    }

    fn label(&self) -> String {
        self.name.clone()
    }

    fn references(&self) -> Vec<(RecordKind, RecordId)> {
        self.contract_id
            .map(|id| vec![(RecordKind::Contract, id)])
            .unwrap_or_default()
    }

    fn custom_fields(&self) -> &[CustomField] {
        &self.custom_fields
    }

    fn custom_fields_mut(&mut self) -> Option<&mut Vec<CustomField>> {
        Some(&mut self.custom_fields)
    }
}

#[cfg(test)]
mod tests {
    use super::Tenant;
    use crate::model::record::{Record, RecordKind};
    use crate::model::validation::ValidationError;
    use uuid::Uuid;

    #[test]
    fn email_must_be_well_formed() {
        let mut tenant = Tenant::new(Uuid::new_v4(), "Ana Lima", "ana-at-example", "+351 900");
        assert!(matches!(
            tenant.validate().expect_err("bad email"),
            ValidationError::InvalidFormat { field: "email", .. }
        ));
        tenant.email = "ana@example.com".to_string();
        assert!(tenant.validate().is_ok());
    }

    #[test]
    fn linked_contract_is_reported_as_reference() {
        let mut tenant = Tenant::new(Uuid::new_v4(), "Ana", "ana@example.com", "1");
        assert!(tenant.references().is_empty());
        let contract_id = Uuid::new_v4();
        tenant.contract_id = Some(contract_id);
        assert_eq!(
            tenant.references(),
            vec![(RecordKind::Contract, contract_id)]
        );
    }
}
