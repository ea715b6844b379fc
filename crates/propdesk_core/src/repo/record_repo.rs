//! Generic record repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD over every project-scoped record table.
//! - Persist a record, its custom fields and its history atomically.
//!
//! # Invariants
//! - Write paths call `Record::validate()` before any SQL mutation.
//! - Every query is scoped by `project_id`.
//! - History rows are appended, never rewritten; stored history is the
//!   source of truth on read.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::record::{
    HistoryLog, ProjectId, Record, RecordId, RecordKind, RecordMeta, Timestamp,
};
use crate::model::validation::ValidationError;
use crate::repo::tables::table_name;
use crate::repo::{custom_field_repo, history_repo};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for record, project and user persistence.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    NotFound { entity: &'static str, id: Uuid },
    /// Unique constraint hit (e.g. duplicate user email).
    Conflict(String),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Conflict(message) => write!(f, "conflict: {message}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Storage mapping for one record type.
///
/// Shared columns (`id`, `project_id`, `created_at`, `updated_at`) are
/// handled by the repository; implementors map the type-specific ones.
pub trait RecordTable: Record + Sized {
    /// Type-specific column names, in `column_values` order.
    const COLUMNS: &'static [&'static str];
    /// Column holding the owning property id, for property-scoped kinds.
    const PROPERTY_COLUMN: Option<&'static str> = None;
    /// Whether the type owns custom fields.
    const HAS_CUSTOM_FIELDS: bool = false;

    fn column_values(&self) -> Vec<Value>;

    /// Rebuilds the record from a row selected with `COLUMNS`.
    ///
    /// History and custom fields are attached by the repository afterwards.
    fn from_row(meta: RecordMeta, row: &Row<'_>) -> RepoResult<Self>;
}

/// Query options for listing records of one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordQuery {
    pub project_id: ProjectId,
    /// Restrict to one property; ignored for kinds without a property column.
    pub property_id: Option<RecordId>,
}

impl RecordQuery {
    pub fn project(project_id: ProjectId) -> Self {
        Self {
            project_id,
            property_id: None,
        }
    }

    pub fn property(project_id: ProjectId, property_id: RecordId) -> Self {
        Self {
            project_id,
            property_id: Some(property_id),
        }
    }
}

/// Repository interface for record CRUD operations.
pub trait RecordRepository {
    /// Inserts a new record with its custom fields and full history.
    fn insert_record<T: RecordTable>(&self, record: &T) -> RepoResult<()>;
    /// Replaces the stored row and custom fields, then appends `entry`.
    fn update_record<T: RecordTable>(&self, record: &T, entry: &HistoryLog) -> RepoResult<()>;
    fn get_record<T: RecordTable>(
        &self,
        project_id: ProjectId,
        id: RecordId,
    ) -> RepoResult<Option<T>>;
    fn list_records<T: RecordTable>(&self, query: &RecordQuery) -> RepoResult<Vec<T>>;
    /// Removes the row and owned custom fields. History is left untouched.
    fn delete_record<T: RecordTable>(&self, project_id: ProjectId, id: RecordId)
        -> RepoResult<()>;
    fn record_exists(
        &self,
        kind: RecordKind,
        project_id: ProjectId,
        id: RecordId,
    ) -> RepoResult<bool>;
    /// Inserts or replaces a record and appends history entries not yet
    /// stored. Runs inside the caller's transaction.
    fn upsert_record<T: RecordTable>(&self, record: &T) -> RepoResult<()>;
}

/// SQLite-backed record repository.
pub struct SqliteRecordRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRecordRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn begin(&self) -> RepoResult<Transaction<'conn>> {
        Ok(Transaction::new_unchecked(
            self.conn,
            TransactionBehavior::Immediate,
        )?)
    }
}

impl RecordRepository for SqliteRecordRepository<'_> {
    fn insert_record<T: RecordTable>(&self, record: &T) -> RepoResult<()> {
        record.validate()?;

        let tx = self.begin()?;
        insert_row(&tx, record)?;
        write_custom_fields(&tx, record)?;
        for entry in record.history() {
            history_repo::append_entry(&tx, T::KIND, record.project_id(), record.id(), entry)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn update_record<T: RecordTable>(&self, record: &T, entry: &HistoryLog) -> RepoResult<()> {
        record.validate()?;

        let tx = self.begin()?;
        let assignments = T::COLUMNS
            .iter()
            .enumerate()
            .map(|(index, column)| format!("{column} = ?{}", index + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let base = T::COLUMNS.len();
        let sql = format!(
            "UPDATE {table}
             SET {assignments}, updated_at = ?{updated}
             WHERE id = ?{id} AND project_id = ?{project};",
            table = table_name(T::KIND),
            updated = base + 1,
            id = base + 2,
            project = base + 3,
        );

        let mut values = record.column_values();
        values.push(Value::Integer(entry.timestamp));
        values.push(Value::Text(record.id().to_string()));
        values.push(Value::Text(record.project_id().to_string()));

        let changed = tx.execute(&sql, params_from_iter(values))?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: T::KIND.as_str(),
                id: record.id(),
            });
        }

        write_custom_fields(&tx, record)?;
        history_repo::append_entry(&tx, T::KIND, record.project_id(), record.id(), entry)?;
        tx.commit()?;
        Ok(())
    }

    fn get_record<T: RecordTable>(
        &self,
        project_id: ProjectId,
        id: RecordId,
    ) -> RepoResult<Option<T>> {
        let mut stmt = self.conn.prepare(&format!(
            "{}
             WHERE id = ?1
               AND project_id = ?2;",
            select_sql::<T>()
        ))?;
        let mut rows = stmt.query(params![id.to_string(), project_id.to_string()])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };

        let mut record = parse_record_row::<T>(row)?;
        record.meta_mut().history = history_repo::list_for_owner(self.conn, T::KIND, id)?;
        if let Some(fields) = record.custom_fields_mut() {
            *fields = custom_field_repo::list_for_owner(self.conn, T::KIND, id)?;
        }
        Ok(Some(record))
    }

    fn list_records<T: RecordTable>(&self, query: &RecordQuery) -> RepoResult<Vec<T>> {
        let mut sql = format!("{} WHERE project_id = ?", select_sql::<T>());
        let mut bind_values = vec![Value::Text(query.project_id.to_string())];

        if let (Some(column), Some(property_id)) = (T::PROPERTY_COLUMN, query.property_id) {
            sql.push_str(&format!(" AND {column} = ?"));
            bind_values.push(Value::Text(property_id.to_string()));
        }
        sql.push_str(" ORDER BY created_at ASC, id ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_record_row::<T>(row)?);
        }

        if records.is_empty() {
            return Ok(records);
        }

        let mut histories = history_repo::list_for_kind(self.conn, T::KIND, query.project_id)?;
        let mut fields = custom_field_repo::list_for_kind(self.conn, T::KIND, query.project_id)?;
        for record in &mut records {
            let id = record.id();
            record.meta_mut().history = histories.remove(&id).unwrap_or_default();
            if let Some(slot) = record.custom_fields_mut() {
                *slot = fields.remove(&id).unwrap_or_default();
            }
        }
        Ok(records)
    }

    fn delete_record<T: RecordTable>(
        &self,
        project_id: ProjectId,
        id: RecordId,
    ) -> RepoResult<()> {
        let tx = self.begin()?;
        let changed = tx.execute(
            &format!(
                "DELETE FROM {} WHERE id = ?1 AND project_id = ?2;",
                table_name(T::KIND)
            ),
            params![id.to_string(), project_id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: T::KIND.as_str(),
                id,
            });
        }
        custom_field_repo::delete_for_owner(&tx, T::KIND, id)?;
        tx.commit()?;
        Ok(())
    }

    fn record_exists(
        &self,
        kind: RecordKind,
        project_id: ProjectId,
        id: RecordId,
    ) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            &format!(
                "SELECT EXISTS(
                    SELECT 1 FROM {} WHERE id = ?1 AND project_id = ?2
                );",
                table_name(kind)
            ),
            params![id.to_string(), project_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn upsert_record<T: RecordTable>(&self, record: &T) -> RepoResult<()> {
        record.validate()?;

        let columns = T::COLUMNS.join(", ");
        let placeholders = (1..=T::COLUMNS.len() + 4)
            .map(|index| format!("?{index}"))
            .collect::<Vec<_>>()
            .join(", ");
        let assignments = T::COLUMNS
            .iter()
            .map(|column| format!("{column} = excluded.{column}"))
            .collect::<Vec<_>>()
            .join(", ");
        let table = table_name(T::KIND);
        let sql = format!(
            "INSERT INTO {table} (id, project_id, created_at, updated_at, {columns})
             VALUES ({placeholders})
             ON CONFLICT(id) DO UPDATE
             SET {assignments}, updated_at = excluded.updated_at
             WHERE {table}.project_id = excluded.project_id;"
        );

        let changed = self
            .conn
            .execute(&sql, params_from_iter(row_values(record, last_touch(record))))?;
        if changed == 0 {
            return Err(RepoError::InvalidData(format!(
                "{} `{}` belongs to another project",
                T::KIND.as_str(),
                record.id()
            )));
        }

        write_custom_fields(self.conn, record)?;
        for entry in record.history() {
            history_repo::append_entry_if_absent(
                self.conn,
                T::KIND,
                record.project_id(),
                record.id(),
                entry,
            )?;
        }
        Ok(())
    }
}

fn select_sql<T: RecordTable>() -> String {
    format!(
        "SELECT id, project_id, created_at, {} FROM {}",
        T::COLUMNS.join(", "),
        table_name(T::KIND)
    )
}

fn insert_row<T: RecordTable>(conn: &Connection, record: &T) -> RepoResult<()> {
    let columns = T::COLUMNS.join(", ");
    let placeholders = (1..=T::COLUMNS.len() + 4)
        .map(|index| format!("?{index}"))
        .collect::<Vec<_>>()
        .join(", ");
    conn.execute(
        &format!(
            "INSERT INTO {} (id, project_id, created_at, updated_at, {columns})
             VALUES ({placeholders});",
            table_name(T::KIND)
        ),
        params_from_iter(row_values(record, record.meta().created_at)),
    )?;
    Ok(())
}

fn row_values<T: RecordTable>(record: &T, updated_at: Timestamp) -> Vec<Value> {
    let mut values = vec![
        Value::Text(record.id().to_string()),
        Value::Text(record.project_id().to_string()),
        Value::Integer(record.meta().created_at),
        Value::Integer(updated_at),
    ];
    values.extend(record.column_values());
    values
}

fn last_touch<T: Record>(record: &T) -> Timestamp {
    record
        .history()
        .iter()
        .map(|entry| entry.timestamp)
        .max()
        .unwrap_or(record.meta().created_at)
}

fn write_custom_fields<T: RecordTable>(conn: &Connection, record: &T) -> RepoResult<()> {
    if !T::HAS_CUSTOM_FIELDS {
        return Ok(());
    }
    custom_field_repo::replace_for_owner(
        conn,
        T::KIND,
        record.project_id(),
        record.id(),
        record.custom_fields(),
    )
}

fn parse_record_row<T: RecordTable>(row: &Row<'_>) -> RepoResult<T> {
    let id: String = row.get("id")?;
    let project_id: String = row.get("project_id")?;
    let meta = RecordMeta {
        id: parse_uuid(&id, "id")?,
        project_id: parse_uuid(&project_id, "project_id")?,
        created_at: row.get("created_at")?,
        history: Vec::new(),
    };
    let record = T::from_row(meta, row)?;
    Ok(record)
}

pub(crate) fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

pub(crate) fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    Ok(())
}
