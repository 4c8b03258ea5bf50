//! Tapestry content API boundary
//!
//! Wire models for the backend's JSON shapes and the HTTP client that
//! implements the sync engine's remote contract.

pub mod client;
pub mod models;

pub use client::TapestryClient;
pub use models::{ContentTypePayload, FieldMeta, FieldPayload, InspectResponse};
