//! Schema reconciliation engine
//!
//! Given a declared schema and the observed remote schema, computes the
//! minimal set of create/update/delete actions needed to converge the
//! backend to the declaration, and either reports the plan (dry run) or
//! applies it through the [`SchemaRemote`] contract.

pub mod action;
pub mod diff;
pub mod engine;
pub mod remote;
pub mod report;

pub use action::{SyncAction, SyncOptions, SyncOutcome, SyncSummary};
pub use diff::{diff_content_type, AttributeChange, DiffReason, FieldDiff};
pub use engine::{SchemaRemote, SyncEngine};
pub use remote::{
    resolve_content_type, resolve_field, resolve_references, FieldChanges, ReferenceLookups,
    RemoteContentType, RemoteField, ResolvedContentType, ResolvedField,
};
