//! Column mappings between record types and their SQLite tables.
//!
//! # Invariants
//! - Enum values are stored as stable snake_case strings.
//! - `Other` variants store their free text in a sibling `*_other` column.
//! - Unknown enum strings or inconsistent variant columns are rejected as
//!   `RepoError::InvalidData`.

use crate::model::contract::Contract;
use crate::model::deadline::{Deadline, DeadlineKind};
use crate::model::document::{Document, DocumentKind};
use crate::model::expense::{Expense, ExpenseCategory, TaxType, UtilityType};
use crate::model::file_ref::FileRef;
use crate::model::maintenance::{Maintenance, MaintenanceStatus};
use crate::model::property::{Property, PropertyKind};
use crate::model::record::{RecordKind, RecordMeta};
use crate::model::tenant::Tenant;
use crate::repo::record_repo::{parse_uuid, RecordTable, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::Row;

/// Table holding records of `kind`.
pub(crate) fn table_name(kind: RecordKind) -> &'static str {
    match kind {
        RecordKind::Property => "properties",
        RecordKind::Tenant => "tenants",
        RecordKind::Contract => "contracts",
        RecordKind::Expense => "expenses",
        RecordKind::Maintenance => "maintenance",
        RecordKind::Deadline => "deadlines",
        RecordKind::Document => "documents",
    }
}

impl RecordTable for Property {
    const COLUMNS: &'static [&'static str] = &[
        "code",
        "name",
        "address",
        "kind",
        "kind_other",
        "surface",
        "rooms",
        "rent_amount",
        "image_url",
    ];
    const HAS_CUSTOM_FIELDS: bool = true;

    fn column_values(&self) -> Vec<Value> {
        let (kind, kind_other) = match &self.kind {
            PropertyKind::Apartment => ("apartment", None),
            PropertyKind::House => ("house", None),
            PropertyKind::Commercial => ("commercial", None),
            PropertyKind::Land => ("land", None),
            PropertyKind::Parking => ("parking", None),
            PropertyKind::Other(text) => ("other", Some(text.as_str())),
        };
        vec![
            text(&self.code),
            text(&self.name),
            text(&self.address),
            text(kind),
            opt_text(kind_other),
            Value::Real(self.surface),
            opt_int(self.rooms.map(i64::from)),
            opt_real(self.rent_amount),
            opt_text(self.image_url.as_deref()),
        ]
    }

    fn from_row(meta: RecordMeta, row: &Row<'_>) -> RepoResult<Self> {
        let kind_text: String = row.get("kind")?;
        let kind = match kind_text.as_str() {
            "apartment" => PropertyKind::Apartment,
            "house" => PropertyKind::House,
            "commercial" => PropertyKind::Commercial,
            "land" => PropertyKind::Land,
            "parking" => PropertyKind::Parking,
            "other" => PropertyKind::Other(required_other(row, "kind_other", "properties")?),
            other => return Err(invalid_enum(other, "properties.kind")),
        };
        let rooms = match row.get::<_, Option<i64>>("rooms")? {
            Some(value) => Some(u32::try_from(value).map_err(|_| {
                RepoError::InvalidData(format!("invalid rooms `{value}` in properties.rooms"))
            })?),
            None => None,
        };

        Ok(Self {
            meta,
            code: row.get("code")?,
            name: row.get("name")?,
            address: row.get("address")?,
            kind,
            surface: row.get("surface")?,
            rooms,
            rent_amount: row.get("rent_amount")?,
            image_url: row.get("image_url")?,
            custom_fields: Vec::new(),
        })
    }
}

impl RecordTable for Tenant {
    const COLUMNS: &'static [&'static str] = &["name", "email", "phone", "contract_id"];
    const HAS_CUSTOM_FIELDS: bool = true;

    fn column_values(&self) -> Vec<Value> {
        vec![
            text(&self.name),
            text(&self.email),
            text(&self.phone),
            opt_text(self.contract_id.map(|id| id.to_string()).as_deref()),
        ]
    }

    fn from_row(meta: RecordMeta, row: &Row<'_>) -> RepoResult<Self> {
        let contract_id = match row.get::<_, Option<String>>("contract_id")? {
            Some(value) => Some(parse_uuid(&value, "tenants.contract_id")?),
            None => None,
        };
        Ok(Self {
            meta,
            name: row.get("name")?,
            email: row.get("email")?,
            phone: row.get("phone")?,
            contract_id,
            custom_fields: Vec::new(),
        })
    }
}

impl RecordTable for Contract {
    const COLUMNS: &'static [&'static str] = &[
        "property_id",
        "tenant_id",
        "start_date",
        "end_date",
        "rent_amount",
        "deposit",
    ];
    const PROPERTY_COLUMN: Option<&'static str> = Some("property_id");

    fn column_values(&self) -> Vec<Value> {
        vec![
            text(&self.property_id.to_string()),
            text(&self.tenant_id.to_string()),
            Value::Integer(self.start_date),
            Value::Integer(self.end_date),
            Value::Real(self.rent_amount),
            opt_real(self.deposit),
        ]
    }

    fn from_row(meta: RecordMeta, row: &Row<'_>) -> RepoResult<Self> {
        let property_id: String = row.get("property_id")?;
        let tenant_id: String = row.get("tenant_id")?;
        Ok(Self {
            meta,
            property_id: parse_uuid(&property_id, "contracts.property_id")?,
            tenant_id: parse_uuid(&tenant_id, "contracts.tenant_id")?,
            start_date: row.get("start_date")?,
            end_date: row.get("end_date")?,
            rent_amount: row.get("rent_amount")?,
            deposit: row.get("deposit")?,
        })
    }
}

impl RecordTable for Expense {
    const COLUMNS: &'static [&'static str] = &[
        "property_id",
        "description",
        "amount",
        "category",
        "category_other",
        "utility_type",
        "utility_other",
        "provider",
        "tax_type",
        "tax_other",
        "reference_year",
        "category_details",
        "date",
        "invoice_source",
        "invoice_url",
        "invoice_file_name",
        "invoice_data",
    ];
    const PROPERTY_COLUMN: Option<&'static str> = Some("property_id");

    fn column_values(&self) -> Vec<Value> {
        let mut category_other = None;
        let mut utility_type = None;
        let mut utility_other = None;
        let mut provider = None;
        let mut tax_type = None;
        let mut tax_other = None;
        let mut reference_year = None;
        let mut details = None;

        match &self.category {
            ExpenseCategory::Utilities {
                utility,
                provider: utility_provider,
                details: utility_details,
            } => {
                let (name, other) = match utility {
                    UtilityType::Electricity => ("electricity", None),
                    UtilityType::Water => ("water", None),
                    UtilityType::Gas => ("gas", None),
                    UtilityType::Internet => ("internet", None),
                    UtilityType::Other(text) => ("other", Some(text.as_str())),
                };
                utility_type = Some(name);
                utility_other = other;
                provider = utility_provider.as_deref();
                details = utility_details.as_deref();
            }
            ExpenseCategory::Taxes {
                tax,
                reference_year: year,
                details: tax_details,
            } => {
                let (name, other) = match tax {
                    TaxType::PropertyTax => ("property_tax", None),
                    TaxType::IncomeTax => ("income_tax", None),
                    TaxType::WasteTax => ("waste_tax", None),
                    TaxType::Other(text) => ("other", Some(text.as_str())),
                };
                tax_type = Some(name);
                tax_other = other;
                reference_year = Some(i64::from(*year));
                details = tax_details.as_deref();
            }
            ExpenseCategory::Other { label } => category_other = Some(label.as_str()),
            ExpenseCategory::Maintenance
            | ExpenseCategory::Insurance
            | ExpenseCategory::Management => {}
        }

        let mut values = vec![
            text(&self.property_id.to_string()),
            text(&self.description),
            Value::Real(self.amount),
            text(self.category.as_str()),
            opt_text(category_other),
            opt_text(utility_type),
            opt_text(utility_other),
            opt_text(provider),
            opt_text(tax_type),
            opt_text(tax_other),
            opt_int(reference_year),
            opt_text(details),
            Value::Integer(self.date),
        ];
        values.extend(file_ref_values(self.invoice.as_ref()));
        values
    }

    fn from_row(meta: RecordMeta, row: &Row<'_>) -> RepoResult<Self> {
        let property_id: String = row.get("property_id")?;
        let category_text: String = row.get("category")?;
        let details: Option<String> = row.get("category_details")?;

        let category = match category_text.as_str() {
            "utilities" => {
                let utility_text: Option<String> = row.get("utility_type")?;
                let utility = match utility_text.as_deref() {
                    Some("electricity") => UtilityType::Electricity,
                    Some("water") => UtilityType::Water,
                    Some("gas") => UtilityType::Gas,
                    Some("internet") => UtilityType::Internet,
                    Some("other") => {
                        UtilityType::Other(required_other(row, "utility_other", "expenses")?)
                    }
                    other => {
                        return Err(invalid_enum(
                            other.unwrap_or("NULL"),
                            "expenses.utility_type",
                        ))
                    }
                };
                ExpenseCategory::Utilities {
                    utility,
                    provider: row.get("provider")?,
                    details,
                }
            }
            "taxes" => {
                let tax_text: Option<String> = row.get("tax_type")?;
                let tax = match tax_text.as_deref() {
                    Some("property_tax") => TaxType::PropertyTax,
                    Some("income_tax") => TaxType::IncomeTax,
                    Some("waste_tax") => TaxType::WasteTax,
                    Some("other") => TaxType::Other(required_other(row, "tax_other", "expenses")?),
                    other => {
                        return Err(invalid_enum(other.unwrap_or("NULL"), "expenses.tax_type"))
                    }
                };
                let reference_year: Option<i64> = row.get("reference_year")?;
                let reference_year = reference_year
                    .and_then(|year| i32::try_from(year).ok())
                    .ok_or_else(|| {
                        RepoError::InvalidData(
                            "missing or invalid expenses.reference_year for taxes".to_string(),
                        )
                    })?;
                ExpenseCategory::Taxes {
                    tax,
                    reference_year,
                    details,
                }
            }
            "maintenance" => ExpenseCategory::Maintenance,
            "insurance" => ExpenseCategory::Insurance,
            "management" => ExpenseCategory::Management,
            "other" => ExpenseCategory::Other {
                label: required_other(row, "category_other", "expenses")?,
            },
            other => return Err(invalid_enum(other, "expenses.category")),
        };

        Ok(Self {
            meta,
            property_id: parse_uuid(&property_id, "expenses.property_id")?,
            description: row.get("description")?,
            amount: row.get("amount")?,
            category,
            date: row.get("date")?,
            invoice: parse_file_ref(
                row,
                ["invoice_source", "invoice_url", "invoice_file_name", "invoice_data"],
            )?,
        })
    }
}

impl RecordTable for Maintenance {
    const COLUMNS: &'static [&'static str] = &[
        "property_id",
        "description",
        "request_date",
        "status",
        "cost",
    ];
    const PROPERTY_COLUMN: Option<&'static str> = Some("property_id");

    fn column_values(&self) -> Vec<Value> {
        vec![
            text(&self.property_id.to_string()),
            text(&self.description),
            Value::Integer(self.request_date),
            text(self.status.as_str()),
            opt_real(self.cost),
        ]
    }

    fn from_row(meta: RecordMeta, row: &Row<'_>) -> RepoResult<Self> {
        let property_id: String = row.get("property_id")?;
        let status_text: String = row.get("status")?;
        let status = MaintenanceStatus::parse(&status_text)
            .ok_or_else(|| invalid_enum(&status_text, "maintenance.status"))?;
        Ok(Self {
            meta,
            property_id: parse_uuid(&property_id, "maintenance.property_id")?,
            description: row.get("description")?,
            request_date: row.get("request_date")?,
            status,
            cost: row.get("cost")?,
        })
    }
}

impl RecordTable for Deadline {
    const COLUMNS: &'static [&'static str] = &[
        "property_id",
        "title",
        "due_date",
        "kind",
        "kind_other",
        "is_completed",
    ];
    const PROPERTY_COLUMN: Option<&'static str> = Some("property_id");

    fn column_values(&self) -> Vec<Value> {
        let (kind, kind_other) = match &self.kind {
            DeadlineKind::RentPayment => ("rent_payment", None),
            DeadlineKind::ContractRenewal => ("contract_renewal", None),
            DeadlineKind::Tax => ("tax", None),
            DeadlineKind::Insurance => ("insurance", None),
            DeadlineKind::Inspection => ("inspection", None),
            DeadlineKind::Other(text) => ("other", Some(text.as_str())),
        };
        vec![
            text(&self.property_id.to_string()),
            text(&self.title),
            Value::Integer(self.due_date),
            text(kind),
            opt_text(kind_other),
            Value::Integer(i64::from(self.is_completed)),
        ]
    }

    fn from_row(meta: RecordMeta, row: &Row<'_>) -> RepoResult<Self> {
        let property_id: String = row.get("property_id")?;
        let kind_text: String = row.get("kind")?;
        let kind = match kind_text.as_str() {
            "rent_payment" => DeadlineKind::RentPayment,
            "contract_renewal" => DeadlineKind::ContractRenewal,
            "tax" => DeadlineKind::Tax,
            "insurance" => DeadlineKind::Insurance,
            "inspection" => DeadlineKind::Inspection,
            "other" => DeadlineKind::Other(required_other(row, "kind_other", "deadlines")?),
            other => return Err(invalid_enum(other, "deadlines.kind")),
        };
        let is_completed = match row.get::<_, i64>("is_completed")? {
            0 => false,
            1 => true,
            other => {
                return Err(RepoError::InvalidData(format!(
                    "invalid is_completed value `{other}` in deadlines.is_completed"
                )));
            }
        };
        Ok(Self {
            meta,
            property_id: parse_uuid(&property_id, "deadlines.property_id")?,
            title: row.get("title")?,
            due_date: row.get("due_date")?,
            kind,
            is_completed,
        })
    }
}

impl RecordTable for Document {
    const COLUMNS: &'static [&'static str] = &[
        "property_id",
        "name",
        "kind",
        "kind_other",
        "upload_date",
        "file_source",
        "file_url",
        "file_name",
        "file_data",
    ];
    const PROPERTY_COLUMN: Option<&'static str> = Some("property_id");

    fn column_values(&self) -> Vec<Value> {
        let (kind, kind_other) = match &self.kind {
            DocumentKind::Contract => ("contract", None),
            DocumentKind::Invoice => ("invoice", None),
            DocumentKind::Receipt => ("receipt", None),
            DocumentKind::Insurance => ("insurance", None),
            DocumentKind::Certificate => ("certificate", None),
            DocumentKind::Plan => ("plan", None),
            DocumentKind::Photo => ("photo", None),
            DocumentKind::Other(text) => ("other", Some(text.as_str())),
        };
        let mut values = vec![
            text(&self.property_id.to_string()),
            text(&self.name),
            text(kind),
            opt_text(kind_other),
            Value::Integer(self.upload_date),
        ];
        values.extend(file_ref_values(self.file.as_ref()));
        values
    }

    fn from_row(meta: RecordMeta, row: &Row<'_>) -> RepoResult<Self> {
        let property_id: String = row.get("property_id")?;
        let kind_text: String = row.get("kind")?;
        let kind = match kind_text.as_str() {
            "contract" => DocumentKind::Contract,
            "invoice" => DocumentKind::Invoice,
            "receipt" => DocumentKind::Receipt,
            "insurance" => DocumentKind::Insurance,
            "certificate" => DocumentKind::Certificate,
            "plan" => DocumentKind::Plan,
            "photo" => DocumentKind::Photo,
            "other" => DocumentKind::Other(required_other(row, "kind_other", "documents")?),
            other => return Err(invalid_enum(other, "documents.kind")),
        };
        Ok(Self {
            meta,
            property_id: parse_uuid(&property_id, "documents.property_id")?,
            name: row.get("name")?,
            kind,
            upload_date: row.get("upload_date")?,
            file: parse_file_ref(row, ["file_source", "file_url", "file_name", "file_data"])?,
        })
    }
}

/// `[source, url, file_name, data]` column values for an optional file.
fn file_ref_values(file: Option<&FileRef>) -> [Value; 4] {
    match file {
        None => [Value::Null, Value::Null, Value::Null, Value::Null],
        Some(FileRef::Link { url }) => [text("link"), text(url), Value::Null, Value::Null],
        Some(FileRef::Embedded {
            file_name,
            data_url,
        }) => [text("embedded"), Value::Null, text(file_name), text(data_url)],
    }
}

fn parse_file_ref(row: &Row<'_>, columns: [&'static str; 4]) -> RepoResult<Option<FileRef>> {
    let [source_column, url_column, name_column, data_column] = columns;
    let source: Option<String> = row.get(source_column)?;
    let url: Option<String> = row.get(url_column)?;
    let file_name: Option<String> = row.get(name_column)?;
    let data_url: Option<String> = row.get(data_column)?;

    match (source.as_deref(), url, file_name, data_url) {
        (None, _, _, _) => Ok(None),
        (Some("link"), Some(url), _, _) => Ok(Some(FileRef::Link { url })),
        (Some("embedded"), _, Some(file_name), Some(data_url)) => Ok(Some(FileRef::Embedded {
            file_name,
            data_url,
        })),
        (Some(other), _, _, _) => Err(RepoError::InvalidData(format!(
            "incomplete file reference `{other}` in {source_column}"
        ))),
    }
}

fn required_other(row: &Row<'_>, column: &'static str, table: &str) -> RepoResult<String> {
    row.get::<_, Option<String>>(column)?.ok_or_else(|| {
        RepoError::InvalidData(format!("missing {table}.{column} for `other` selection"))
    })
}

fn invalid_enum(value: &str, column: &str) -> RepoError {
    RepoError::InvalidData(format!("invalid value `{value}` in {column}"))
}

fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}

fn opt_text(value: Option<&str>) -> Value {
    value.map_or(Value::Null, text)
}

fn opt_real(value: Option<f64>) -> Value {
    value.map_or(Value::Null, Value::Real)
}

fn opt_int(value: Option<i64>) -> Value {
    value.map_or(Value::Null, Value::Integer)
}
