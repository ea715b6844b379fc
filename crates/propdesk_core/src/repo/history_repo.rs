//! Append-only history persistence.
//!
//! # Responsibility
//! - Append audit entries for any record kind.
//! - Read entries back per owner or per project/kind in append order.
//!
//! # Invariants
//! - Rows are only ever inserted; SQL triggers abort UPDATE and DELETE.
//! - Read order is insertion order (`seq ASC`).

use crate::model::record::{HistoryLog, ProjectId, RecordId, RecordKind};
use crate::repo::record_repo::{parse_uuid, RepoResult};
use rusqlite::{params, Connection, Row};
use std::collections::HashMap;

const HISTORY_SELECT_SQL: &str = "SELECT
    id,
    owner_id,
    user_id,
    description,
    timestamp
FROM history_logs";

/// Appends one entry for `owner_id`.
pub(crate) fn append_entry(
    conn: &Connection,
    kind: RecordKind,
    project_id: ProjectId,
    owner_id: RecordId,
    entry: &HistoryLog,
) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO history_logs (
            id,
            project_id,
            owner_kind,
            owner_id,
            user_id,
            description,
            timestamp
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
        params![
            entry.id.to_string(),
            project_id.to_string(),
            kind.as_str(),
            owner_id.to_string(),
            entry.user_id.to_string(),
            entry.description.as_str(),
            entry.timestamp,
        ],
    )?;
    Ok(())
}

/// Appends an entry unless an entry with the same id is already stored.
///
/// Returns whether a row was written. Used when saving snapshots that carry
/// history the store has already seen.
pub(crate) fn append_entry_if_absent(
    conn: &Connection,
    kind: RecordKind,
    project_id: ProjectId,
    owner_id: RecordId,
    entry: &HistoryLog,
) -> RepoResult<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO history_logs (
            id,
            project_id,
            owner_kind,
            owner_id,
            user_id,
            description,
            timestamp
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
        params![
            entry.id.to_string(),
            project_id.to_string(),
            kind.as_str(),
            owner_id.to_string(),
            entry.user_id.to_string(),
            entry.description.as_str(),
            entry.timestamp,
        ],
    )?;
    Ok(changed == 1)
}

/// Lists one record's entries in append order.
pub(crate) fn list_for_owner(
    conn: &Connection,
    kind: RecordKind,
    owner_id: RecordId,
) -> RepoResult<Vec<HistoryLog>> {
    let mut stmt = conn.prepare(&format!(
        "{HISTORY_SELECT_SQL}
         WHERE owner_kind = ?1
           AND owner_id = ?2
         ORDER BY seq ASC;"
    ))?;
    let mut rows = stmt.query(params![kind.as_str(), owner_id.to_string()])?;
    let mut entries = Vec::new();
    while let Some(row) = rows.next()? {
        let (_, entry) = parse_history_row(row)?;
        entries.push(entry);
    }
    Ok(entries)
}

/// Lists entries of every `kind` record in a project, grouped by owner.
pub(crate) fn list_for_kind(
    conn: &Connection,
    kind: RecordKind,
    project_id: ProjectId,
) -> RepoResult<HashMap<RecordId, Vec<HistoryLog>>> {
    let mut stmt = conn.prepare(&format!(
        "{HISTORY_SELECT_SQL}
         WHERE project_id = ?1
           AND owner_kind = ?2
         ORDER BY seq ASC;"
    ))?;
    let mut rows = stmt.query(params![project_id.to_string(), kind.as_str()])?;
    let mut grouped: HashMap<RecordId, Vec<HistoryLog>> = HashMap::new();
    while let Some(row) = rows.next()? {
        let (owner_id, entry) = parse_history_row(row)?;
        grouped.entry(owner_id).or_default().push(entry);
    }
    Ok(grouped)
}

fn parse_history_row(row: &Row<'_>) -> RepoResult<(RecordId, HistoryLog)> {
    let id: String = row.get("id")?;
    let owner_id: String = row.get("owner_id")?;
    let user_id: String = row.get("user_id")?;
    Ok((
        parse_uuid(&owner_id, "history_logs.owner_id")?,
        HistoryLog {
            id: parse_uuid(&id, "history_logs.id")?,
            user_id: parse_uuid(&user_id, "history_logs.user_id")?,
            description: row.get("description")?,
            timestamp: row.get("timestamp")?,
        },
    ))
}
