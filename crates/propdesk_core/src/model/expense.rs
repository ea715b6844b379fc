//! Expense domain model.
//!
//! # Responsibility
//! - Represent category-specific expense payloads as one sum type.
//!
//! # Invariants
//! - `amount` is strictly positive.
//! - Every `Other` selection (category, utility, tax) carries non-blank text.
//! - Switching category replaces the whole payload, so no stale
//!   utility/tax sub-fields survive a category change.

use crate::model::file_ref::FileRef;
use crate::model::record::{
    ChangeSet, ProjectId, Record, RecordId, RecordKind, RecordMeta, Timestamp,
};
use crate::model::validation::{
    require_other_detail, require_positive, require_text, ValidationError, ValidationResult,
};
use serde::{Deserialize, Serialize};

const MIN_REFERENCE_YEAR: i32 = 1900;
const MAX_REFERENCE_YEAR: i32 = 2200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "other", rename_all = "snake_case")]
pub enum UtilityType {
    Electricity,
    Water,
    Gas,
    Internet,
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "other", rename_all = "snake_case")]
pub enum TaxType {
    PropertyTax,
    IncomeTax,
    WasteTax,
    Other(String),
}

/// Expense category with its category-specific payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum ExpenseCategory {
    Utilities {
        utility: UtilityType,
        provider: Option<String>,
        details: Option<String>,
    },
    Taxes {
        tax: TaxType,
        reference_year: i32,
        details: Option<String>,
    },
    Maintenance,
    Insurance,
    Management,
    Other {
        label: String,
    },
}

impl ExpenseCategory {
    /// Stable category id used in storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Utilities { .. } => "utilities",
            Self::Taxes { .. } => "taxes",
            Self::Maintenance => "maintenance",
            Self::Insurance => "insurance",
            Self::Management => "management",
            Self::Other { .. } => "other",
        }
    }

    fn validate(&self) -> ValidationResult {
        match self {
            Self::Utilities { utility, .. } => {
                if let UtilityType::Other(detail) = utility {
                    require_other_detail("utility_other", detail)?;
                }
                Ok(())
            }
            Self::Taxes {
                tax,
                reference_year,
                ..
            } => {
                if let TaxType::Other(detail) = tax {
                    require_other_detail("tax_other", detail)?;
                }
                if !(MIN_REFERENCE_YEAR..=MAX_REFERENCE_YEAR).contains(reference_year) {
                    return Err(ValidationError::OutOfRange {
                        field: "reference_year",
                        value: i64::from(*reference_year),
                    });
                }
                Ok(())
            }
            Self::Other { label } => require_other_detail("category_other", label),
            Self::Maintenance | Self::Insurance | Self::Management => Ok(()),
        }
    }
}

/// Money spent on a property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub property_id: RecordId,
    pub description: String,
    pub amount: f64,
    pub category: ExpenseCategory,
    /// Epoch milliseconds.
    pub date: Timestamp,
    pub invoice: Option<FileRef>,
}

impl Expense {
    pub fn new(
        project_id: ProjectId,
        property_id: RecordId,
        description: impl Into<String>,
        amount: f64,
        category: ExpenseCategory,
        date: Timestamp,
    ) -> Self {
        Self {
            meta: RecordMeta::draft(project_id),
            property_id,
            description: description.into(),
            amount,
            category,
            date,
            invoice: None,
        }
    }
}

impl Record for Expense {
    const KIND: RecordKind = RecordKind::Expense;

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn validate(&self) -> ValidationResult {
        require_text("description", &self.description)?;
        require_positive("amount", self.amount)?;
        self.category.validate()?;
        if let Some(invoice) = &self.invoice {
            invoice.validate("invoice")?;
        }
        Ok(())
    }

    fn changed_fields(&self, previous: &Self) -> Vec<&'static str> {
        let mut changes = ChangeSet::new();
        changes.check("property_id", &self.property_id, &previous.property_id);
        changes.check("description", &self.description, &previous.description);
        changes.check("amount", &self.amount, &previous.amount);
        changes.check("category", &self.category, &previous.category);
        changes.check("date", &self.date, &previous.date);
        changes.check("invoice", &self.invoice, &previous.invoice);
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
