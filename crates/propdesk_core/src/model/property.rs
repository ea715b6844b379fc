//! Property domain model.
//!
//! # Invariants
//! - `surface` is strictly positive.
//! - `PropertyKind::Other` carries non-blank free text.
//! - Code, name and address are never blank.

use crate::model::custom_field::{validate_fields, CustomField};
use crate::model::record::{ChangeSet, ProjectId, Record, RecordKind, RecordMeta};
use crate::model::validation::{
    require_non_negative, require_other_detail, require_positive, require_text, require_url,
    ValidationResult,
};
use serde::{Deserialize, Serialize};

/// Property category. `Other` carries the user's own description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "other", rename_all = "snake_case")]
pub enum PropertyKind {
    Apartment,
    House,
    Commercial,
    Land,
    Parking,
    Other(String),
}

/// Managed real-estate unit; the anchor of most other records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    #[serde(flatten)]
    pub meta: RecordMeta,
    /// Short user-facing reference code (e.g. `APT-12`).
    pub code: String,
    pub name: String,
    pub address: String,
    pub kind: PropertyKind,
    /// Square meters.
    pub surface: f64,
    pub rooms: Option<u32>,
    pub rent_amount: Option<f64>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub custom_fields: Vec<CustomField>,
}

impl Property {
    /// Builds an unsaved property draft for `project_id`.
    pub fn new(
        project_id: ProjectId,
        code: impl Into<String>,
        name: impl Into<String>,
        address: impl Into<String>,
        kind: PropertyKind,
        surface: f64,
    ) -> Self {
        Self {
            meta: RecordMeta::draft(project_id),
            code: code.into(),
            name: name.into(),
            address: address.into(),
            kind,
            surface,
            rooms: None,
            rent_amount: None,
            image_url: None,
            custom_fields: Vec::new(),
        }
    }
}

impl Record for Property {
    const KIND: RecordKind = RecordKind::Property;

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn validate(&self) -> ValidationResult {
        require_text("code", &self.code)?;
        require_text("name", &self.name)?;
        require_text("address", &self.address)?;
        if let PropertyKind::Other(detail) = &self.kind {
            require_other_detail("kind_other", detail)?;
        }
        require_positive("surface", self.surface)?;
        if let Some(rent) = self.rent_amount {
            require_non_negative("rent_amount", rent)?;
        }
        if let Some(url) = &self.image_url {
            require_url("image_url", url)?;
        }
        validate_fields(&self.custom_fields)
    }

    fn changed_fields(&self, previous: &Self) -> Vec<&'static str> {
        let mut changes = ChangeSet::new();
        changes.check("code", &self.code, &previous.code);
        changes.check("name", &self.name, &previous.name);
        changes.check("address", &self.address, &previous.address);
        changes.check("kind", &self.kind, &previous.kind);
        changes.check("surface", &self.surface, &previous.surface);
        changes.check("rooms", &self.rooms, &previous.rooms);
        changes.check("rent_amount", &self.rent_amount, &previous.rent_amount);
        changes.check("image_url", &self.image_url, &previous.image_url);
        changes.check("custom_fields", &self.custom_fields, &previous.custom_fields);
        changes.finish()
    }

    fn label(&self) -> String {
        format!("{} {}", self.code, self.name)
    }

    fn custom_fields(&self) -> &[CustomField] {
        &self.custom_fields
    }

    fn custom_fields_mut(&mut self) -> Option<&mut Vec<CustomField>> {
        Some(&mut self.custom_fields)
    }
}
