//! Custom field persistence for records that own them.
//!
//! # Invariants
//! - A record's field set is always replaced as a whole, keeping field ids.
//! - Stored `field_type` always matches the populated value column
//!   (enforced by a table CHECK and re-checked on read).

use crate::model::custom_field::{CustomField, CustomFieldType, CustomFieldValue};
use crate::model::record::{ProjectId, RecordId, RecordKind};
use crate::repo::record_repo::{parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};
use std::collections::HashMap;

const FIELD_SELECT_SQL: &str = "SELECT
    id,
    owner_id,
    label,
    field_type,
    text_value,
    bool_value
FROM custom_fields";

/// Replaces every field owned by `owner_id` with `fields`, in order.
pub(crate) fn replace_for_owner(
    conn: &Connection,
    kind: RecordKind,
    project_id: ProjectId,
    owner_id: RecordId,
    fields: &[CustomField],
) -> RepoResult<()> {
    delete_for_owner(conn, kind, owner_id)?;

    for (position, field) in fields.iter().enumerate() {
        let (text_value, bool_value) = match &field.value {
            CustomFieldValue::Text(value) => (Some(value.as_str()), None),
            CustomFieldValue::Boolean(value) => (None, Some(i64::from(*value))),
        };
        conn.execute(
            "INSERT INTO custom_fields (
                id,
                project_id,
                owner_kind,
                owner_id,
                position,
                label,
                field_type,
                text_value,
                bool_value
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                field.id.to_string(),
                project_id.to_string(),
                kind.as_str(),
                owner_id.to_string(),
                position as i64,
                field.label.as_str(),
                field.field_type().as_str(),
                text_value,
                bool_value,
            ],
        )?;
    }
    Ok(())
}

pub(crate) fn delete_for_owner(
    conn: &Connection,
    kind: RecordKind,
    owner_id: RecordId,
) -> RepoResult<()> {
    conn.execute(
        "DELETE FROM custom_fields WHERE owner_kind = ?1 AND owner_id = ?2;",
        params![kind.as_str(), owner_id.to_string()],
    )?;
    Ok(())
}

pub(crate) fn list_for_owner(
    conn: &Connection,
    kind: RecordKind,
    owner_id: RecordId,
) -> RepoResult<Vec<CustomField>> {
    let mut stmt = conn.prepare(&format!(
        "{FIELD_SELECT_SQL}
         WHERE owner_kind = ?1
           AND owner_id = ?2
         ORDER BY position ASC;"
    ))?;
    let mut rows = stmt.query(params![kind.as_str(), owner_id.to_string()])?;
    let mut fields = Vec::new();
    while let Some(row) = rows.next()? {
        let (_, field) = parse_field_row(row)?;
        fields.push(field);
    }
    Ok(fields)
}

/// Lists fields of every `kind` record in a project, grouped by owner.
pub(crate) fn list_for_kind(
    conn: &Connection,
    kind: RecordKind,
    project_id: ProjectId,
) -> RepoResult<HashMap<RecordId, Vec<CustomField>>> {
    let mut stmt = conn.prepare(&format!(
        "{FIELD_SELECT_SQL}
         WHERE project_id = ?1
           AND owner_kind = ?2
         ORDER BY owner_id ASC, position ASC;"
    ))?;
    let mut rows = stmt.query(params![project_id.to_string(), kind.as_str()])?;
    let mut grouped: HashMap<RecordId, Vec<CustomField>> = HashMap::new();
    while let Some(row) = rows.next()? {
        let (owner_id, field) = parse_field_row(row)?;
        grouped.entry(owner_id).or_default().push(field);
    }
    Ok(grouped)
}

fn parse_field_row(row: &Row<'_>) -> RepoResult<(RecordId, CustomField)> {
    let id: String = row.get("id")?;
    let owner_id: String = row.get("owner_id")?;
    let type_text: String = row.get("field_type")?;
    let field_type = CustomFieldType::parse(&type_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid field type `{type_text}` in custom_fields.field_type"
        ))
    })?;

    let text_value: Option<String> = row.get("text_value")?;
    let bool_value: Option<i64> = row.get("bool_value")?;
    let value = match (field_type, text_value, bool_value) {
        (CustomFieldType::Text, Some(text), None) => CustomFieldValue::Text(text),
        (CustomFieldType::Boolean, None, Some(0)) => CustomFieldValue::Boolean(false),
        (CustomFieldType::Boolean, None, Some(1)) => CustomFieldValue::Boolean(true),
        _ => {
            return Err(RepoError::InvalidData(format!(
                "custom field `{id}` value does not match type `{type_text}`"
            )));
        }
    };

    Ok((
        parse_uuid(&owner_id, "custom_fields.owner_id")?,
        CustomField {
            id: parse_uuid(&id, "custom_fields.id")?,
            label: row.get("label")?,
            value,
        },
    ))
}
