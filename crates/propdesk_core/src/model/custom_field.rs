//! User-defined typed attributes owned by a single record.
//!
//! # Responsibility
//! - Keep custom field type and value consistent at all times.
//! - Provide add/edit/remove/set-type operations on a record's field list.
//!
//! # Invariants
//! - The declared type is derived from the value variant, so a TEXT field
//!   can never hold a boolean and vice versa.
//! - Changing a field's type discards its value and stores the new type's
//!   zero value (`""` or `false`).
//! - Field ids are stable across edits.

use crate::model::validation::{require_text, ValidationError, ValidationResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

pub type CustomFieldId = Uuid;

/// Declared type of a custom field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomFieldType {
    Text,
    Boolean,
}

impl CustomFieldType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Boolean => "boolean",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "text" => Some(Self::Text),
            "boolean" => Some(Self::Boolean),
            _ => None,
        }
    }

    /// Value a field holds right after creation or a type change.
    pub fn zero_value(self) -> CustomFieldValue {
        match self {
            Self::Text => CustomFieldValue::Text(String::new()),
            Self::Boolean => CustomFieldValue::Boolean(false),
        }
    }
}

/// Typed custom field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CustomFieldValue {
    Text(String),
    Boolean(bool),
}

impl CustomFieldValue {
    pub fn field_type(&self) -> CustomFieldType {
        match self {
            Self::Text(_) => CustomFieldType::Text,
            Self::Boolean(_) => CustomFieldType::Boolean,
        }
    }

    /// Parses raw form input against a declared type.
    ///
    /// Text accepts any string. Boolean accepts `true`/`false` only.
    pub fn parse(
        field_type: CustomFieldType,
        label: &str,
        raw: &str,
    ) -> Result<Self, ValidationError> {
        match field_type {
            CustomFieldType::Text => Ok(Self::Text(raw.to_string())),
            CustomFieldType::Boolean => match raw.trim() {
                "true" => Ok(Self::Boolean(true)),
                "false" => Ok(Self::Boolean(false)),
                _ => Err(ValidationError::CustomFieldValue {
                    label: label.to_string(),
                    expected: CustomFieldType::Boolean.as_str(),
                }),
            },
        }
    }
}

/// One user-defined attribute on a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomField {
    pub id: CustomFieldId,
    pub label: String,
    pub value: CustomFieldValue,
}

impl CustomField {
    /// Creates a field with a generated id and the type's zero value.
    pub fn new(label: impl Into<String>, field_type: CustomFieldType) -> Self {
        Self {
            id: Uuid::new_v4(),
            label: label.into(),
            value: field_type.zero_value(),
        }
    }

    pub fn field_type(&self) -> CustomFieldType {
        self.value.field_type()
    }

    /// Switches the declared type.
    ///
    /// A real type change resets the value; the same type is a no-op.
    pub fn set_type(&mut self, field_type: CustomFieldType) {
        if self.field_type() != field_type {
            self.value = field_type.zero_value();
        }
    }

    pub fn validate(&self) -> ValidationResult {
        require_text("custom_field.label", &self.label)
    }
}

/// Field-list operations used by records that own custom fields.
pub trait CustomFieldsExt {
    /// Appends a new field and returns its id.
    fn add_field(&mut self, label: &str, field_type: CustomFieldType) -> CustomFieldId;
    /// Replaces label and value of an existing field, keeping its id.
    ///
    /// Returns `false` when the id is unknown.
    fn edit_field(&mut self, id: CustomFieldId, label: &str, value: CustomFieldValue) -> bool;
    /// Changes the declared type of an existing field.
    fn set_field_type(&mut self, id: CustomFieldId, field_type: CustomFieldType) -> bool;
    /// Removes a field by id. Returns `false` when the id is unknown.
    fn remove_field(&mut self, id: CustomFieldId) -> bool;
    fn field(&self, id: CustomFieldId) -> Option<&CustomField>;
}

impl CustomFieldsExt for Vec<CustomField> {
    fn add_field(&mut self, label: &str, field_type: CustomFieldType) -> CustomFieldId {
        let field = CustomField::new(label, field_type);
        let id = field.id;
        self.push(field);
        id
    }

    fn edit_field(&mut self, id: CustomFieldId, label: &str, value: CustomFieldValue) -> bool {
        match self.iter_mut().find(|field| field.id == id) {
            Some(field) => {
                field.label = label.to_string();
                field.value = value;
                true
            }
            None => false,
        }
    }

    fn set_field_type(&mut self, id: CustomFieldId, field_type: CustomFieldType) -> bool {
        match self.iter_mut().find(|field| field.id == id) {
            Some(field) => {
                field.set_type(field_type);
                true
            }
            None => false,
        }
    }

    fn remove_field(&mut self, id: CustomFieldId) -> bool {
        let before = self.len();
        self.retain(|field| field.id != id);
        self.len() != before
    }

    fn field(&self, id: CustomFieldId) -> Option<&CustomField> {
        self.iter().find(|field| field.id == id)
    }
}

/// Validates every field of a record; ids must be unique within it.
pub(crate) fn validate_fields(fields: &[CustomField]) -> ValidationResult {
    let mut seen = HashSet::with_capacity(fields.len());
    for field in fields {
        field.validate()?;
        if !seen.insert(field.id) {
            return Err(ValidationError::DuplicateCustomField(field.id));
        }
    }
    Ok(())
}
