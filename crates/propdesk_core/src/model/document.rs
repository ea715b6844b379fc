//! Property document model.

use crate::model::file_ref::FileRef;
use crate::model::record::{
    ChangeSet, ProjectId, Record, RecordId, RecordKind, RecordMeta, Timestamp,
};
use crate::model::validation::{require_other_detail, require_text, ValidationResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "other", rename_all = "snake_case")]
pub enum DocumentKind {
    Contract,
    Invoice,
    Receipt,
    Insurance,
    Certificate,
    Plan,
    Photo,
    Other(String),
}

/// File kept on record for a property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub property_id: RecordId,
    pub name: String,
    pub kind: DocumentKind,
    /// Epoch milliseconds.
    pub upload_date: Timestamp,
    pub file: Option<FileRef>,
}

impl Document {
    pub fn new(
        project_id: ProjectId,
        property_id: RecordId,
        name: impl Into<String>,
        kind: DocumentKind,
        upload_date: Timestamp,
    ) -> Self {
        Self {
            meta: RecordMeta::draft(project_id),
            property_id,
            name: name.into(),
            kind,
            upload_date,
            file: None,
        }
    }
}

impl Record for Document {
    const KIND: RecordKind = RecordKind::Document;

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn validate(&self) -> ValidationResult {
        require_text("name", &self.name)?;
        if let DocumentKind::Other(detail) = &self.kind {
            require_other_detail("kind_other", detail)?;
        }
        if let Some(file) = &self.file {
            file.validate("file")?;
        }
        Ok(())
    }

    fn changed_fields(&self, previous: &Self) -> Vec<&'static str> {
        let mut changes = ChangeSet::new();
        changes.check("property_id", &self.property_id, &previous.property_id);
        changes.check("name", &self.name, &previous.name);
        changes.check("kind", &self.kind, &previous.kind);
        changes.check("upload_date", &self.upload_date, &previous.upload_date);
        changes.check("file", &self.file, &previous.file);
        changes.finish()
    }

    fn label(&self) -> String {
        self.name.clone()
    }

    fn references(&self) -> Vec<(RecordKind, RecordId)> {
        vec![(RecordKind::Property, self.property_id)]
    }

    fn property_id(&self) -> Option<RecordId> {
        Some(self.property_id)
    }
}
