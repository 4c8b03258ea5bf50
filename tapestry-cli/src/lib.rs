//! Client library for the Tapestry content backend
//!
//! Provides the declared-schema model, the HTTP API client, and the
//! reconciliation engine that converges a remote Tapestry environment to a
//! locally declared content schema. The `tapestry-cli` binary is a thin
//! command-line surface over this library.

pub mod api;
pub mod config;
pub mod schema;
pub mod sync;

pub use api::TapestryClient;
pub use config::{Config, Environment};
pub use schema::{ContentTypeDef, FieldDef, FieldType, ReferenceTarget};
pub use sync::{SchemaRemote, SyncAction, SyncEngine, SyncOptions, SyncOutcome};
