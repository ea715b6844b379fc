//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Record writes enforce `Record::validate()` before persistence.
//! - Repository APIs return semantic errors (`NotFound`, `Conflict`) in
//!   addition to DB transport errors.

pub(crate) mod custom_field_repo;
pub(crate) mod history_repo;
pub mod project_repo;
pub mod record_repo;
pub(crate) mod tables;
