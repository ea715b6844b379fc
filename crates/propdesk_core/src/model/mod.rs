//! Domain model for project-scoped property management records.
//!
//! # Responsibility
//! - Define canonical record shapes used by repositories and services.
//! - Own synchronous validation for every record type.
//!
//! # Invariants
//! - Every scoped record carries `RecordMeta` (id, project, history).
//! - Category-specific payloads are sum types, never flat optional fields.

pub mod contract;
pub mod custom_field;
pub mod deadline;
pub mod document;
pub mod expense;
pub mod file_ref;
pub mod maintenance;
pub mod project;
pub mod property;
pub mod record;
pub mod tenant;
pub mod validation;
