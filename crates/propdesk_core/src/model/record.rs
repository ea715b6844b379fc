//! Shared record identity, metadata and audit history.
//!
//! # Responsibility
//! - Define the metadata every project-scoped record carries.
//! - Define the append-only `HistoryLog` entry.
//! - Expose the `Record` trait used by generic CRUD paths.
//!
//! # Invariants
//! - `RecordMeta::id` is stable and never reused for another record.
//! - `history` is append-only; existing entries are never rewritten.
//! - A freshly created record holds exactly one `created` entry.

use crate::model::custom_field::CustomField;
use crate::model::validation::ValidationResult;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for every project-scoped record.
pub type RecordId = Uuid;
/// Stable identifier for a project.
pub type ProjectId = Uuid;
/// Stable identifier for a user.
pub type UserId = Uuid;
/// Unix epoch milliseconds.
pub type Timestamp = i64;

/// Description stored on the first history entry of every record.
pub const HISTORY_CREATED: &str = "created";
/// Prefix of every history entry appended by an update.
pub const HISTORY_UPDATED: &str = "updated";

/// Discriminates record tables, history owners and feed sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Property,
    Tenant,
    Contract,
    Expense,
    Maintenance,
    Deadline,
    Document,
}

impl RecordKind {
    /// Stable string id used in storage and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Property => "property",
            Self::Tenant => "tenant",
            Self::Contract => "contract",
            Self::Expense => "expense",
            Self::Maintenance => "maintenance",
            Self::Deadline => "deadline",
            Self::Document => "document",
        }
    }

    /// Parses a stable string id back into a kind.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "property" => Some(Self::Property),
            "tenant" => Some(Self::Tenant),
            "contract" => Some(Self::Contract),
            "expense" => Some(Self::Expense),
            "maintenance" => Some(Self::Maintenance),
            "deadline" => Some(Self::Deadline),
            "document" => Some(Self::Document),
            _ => None,
        }
    }
}

/// One audit entry attributed to a user at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryLog {
    pub id: Uuid,
    pub user_id: UserId,
    pub description: String,
    pub timestamp: Timestamp,
}

impl HistoryLog {
    /// Creates a new entry with a generated id.
    pub fn new(user_id: UserId, description: impl Into<String>, timestamp: Timestamp) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            description: description.into(),
            timestamp,
        }
    }

    /// Entry appended on record creation.
    pub fn created(user_id: UserId, timestamp: Timestamp) -> Self {
        Self::new(user_id, HISTORY_CREATED, timestamp)
    }

    /// Entry appended on record update, with an optional changed-field summary.
    pub fn updated(user_id: UserId, changed_fields: &[&str], timestamp: Timestamp) -> Self {
        let description = if changed_fields.is_empty() {
            HISTORY_UPDATED.to_string()
        } else {
            format!("{HISTORY_UPDATED}: {}", changed_fields.join(", "))
        };
        Self::new(user_id, description, timestamp)
    }
}

/// Identity and audit metadata shared by every project-scoped record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMeta {
    pub id: RecordId,
    pub project_id: ProjectId,
    /// Epoch milliseconds, set once on create.
    pub created_at: Timestamp,
    /// Append order (oldest first). Display sorts newest first.
    #[serde(default)]
    pub history: Vec<HistoryLog>,
}

impl RecordMeta {
    /// Metadata for a draft that has not been persisted yet.
    ///
    /// Create paths overwrite id, timestamps and history.
    pub fn draft(project_id: ProjectId) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id,
            created_at: 0,
            history: Vec::new(),
        }
    }

    /// History entries, newest first.
    pub fn history_newest_first(&self) -> Vec<HistoryLog> {
        let mut entries = self.history.clone();
        entries.reverse();
        entries.sort_by(|left, right| right.timestamp.cmp(&left.timestamp));
        entries
    }
}

/// Behavior shared by every project-scoped record type.
pub trait Record: Clone {
    /// Table and history discriminator for this type.
    const KIND: RecordKind;

    fn meta(&self) -> &RecordMeta;
    fn meta_mut(&mut self) -> &mut RecordMeta;

    /// Synchronous field validation run before every write.
    fn validate(&self) -> ValidationResult;

    /// Names of the fields that differ from `previous`.
    ///
    /// Metadata and history are never reported.
    fn changed_fields(&self, previous: &Self) -> Vec<&'static str>;

    /// Short human label used by aggregated history feeds.
    fn label(&self) -> String;

    /// Other records this one points at, checked before writes.
    fn references(&self) -> Vec<(RecordKind, RecordId)> {
        Vec::new()
    }

    /// Property this record hangs off, when it is property-scoped.
    fn property_id(&self) -> Option<RecordId> {
        None
    }

    /// Custom fields owned by this record.
    fn custom_fields(&self) -> &[CustomField] {
        &[]
    }

    /// Mutable access to owned custom fields, when the type carries them.
    fn custom_fields_mut(&mut self) -> Option<&mut Vec<CustomField>> {
        None
    }

    fn id(&self) -> RecordId {
        self.meta().id
    }

    fn project_id(&self) -> ProjectId {
        self.meta().project_id
    }

    fn history(&self) -> &[HistoryLog] {
        &self.meta().history
    }
}

/// Collects changed field names for `Record::changed_fields`.
#[derive(Debug, Default)]
pub(crate) struct ChangeSet {
    fields: Vec<&'static str>,
}

impl ChangeSet {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn check<T: PartialEq>(&mut self, field: &'static str, current: &T, previous: &T) {
        if current != previous {
            self.fields.push(field);
        }
    }

    pub(crate) fn finish(self) -> Vec<&'static str> {
        self.fields
    }
}

#[cfg(test)]
mod tests {
    use super::{HistoryLog, RecordKind, RecordMeta, HISTORY_CREATED};
    use uuid::Uuid;

    #[test]
    fn updated_entry_lists_changed_fields() {
        let user = Uuid::new_v4();
        assert_eq!(HistoryLog::updated(user, &[], 10).description, "updated");
        assert_eq!(
            HistoryLog::updated(user, &["name", "surface"], 10).description,
            "updated: name, surface"
        );
        assert_eq!(HistoryLog::created(user, 5).description, HISTORY_CREATED);
    }

    #[test]
    fn record_kind_string_ids_roundtrip() {
        for kind in [
            RecordKind::Property,
            RecordKind::Tenant,
            RecordKind::Contract,
            RecordKind::Expense,
            RecordKind::Maintenance,
            RecordKind::Deadline,
            RecordKind::Document,
        ] {
            assert_eq!(RecordKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(RecordKind::parse("project"), None);
    }

    #[test]
    fn history_newest_first_puts_later_appends_first_on_ties() {
        let user = Uuid::new_v4();
        let mut meta = RecordMeta::draft(Uuid::new_v4());
        meta.history.push(HistoryLog::created(user, 100));
        meta.history.push(HistoryLog::updated(user, &["name"], 100));
        meta.history.push(HistoryLog::updated(user, &["code"], 200));

        let ordered = meta.history_newest_first();
        let descriptions: Vec<&str> = ordered.iter().map(|e| e.description.as_str()).collect();
        assert_eq!(
            descriptions,
            vec!["updated: code", "updated: name", "created"]
        );
    }
}
