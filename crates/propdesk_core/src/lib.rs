//! Core domain logic for PropDesk, a project-scoped property management store.
//! This crate is the single source of truth for record invariants.

pub mod access;
pub mod attachment;
pub mod clock;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;

pub use access::{can_mutate, Action};
pub use attachment::{read_as_data_url, AttachmentError, EmbeddedFile};
pub use clock::{Clock, SteppingClock, SystemClock};
pub use logging::{default_log_level, init_logging, logging_status, LogSettings};
pub use model::contract::Contract;
pub use model::custom_field::{CustomField, CustomFieldType, CustomFieldValue, CustomFieldsExt};
pub use model::deadline::{Deadline, DeadlineKind};
pub use model::document::{Document, DocumentKind};
pub use model::expense::{Expense, ExpenseCategory, TaxType, UtilityType};
pub use model::file_ref::FileRef;
pub use model::maintenance::{Maintenance, MaintenanceStatus};
pub use model::project::{Project, ProjectMember, ProjectMemberRole, User};
pub use model::property::{Property, PropertyKind};
pub use model::record::{
    HistoryLog, ProjectId, Record, RecordId, RecordKind, RecordMeta, Timestamp, UserId,
};
pub use model::tenant::Tenant;
pub use model::validation::ValidationError;
pub use repo::record_repo::{RepoError, RepoResult};
pub use service::history_service::HistoryFeedEntry;
pub use service::{ServiceError, ServiceResult};
pub use store::{EstateStore, ProjectSnapshot};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
