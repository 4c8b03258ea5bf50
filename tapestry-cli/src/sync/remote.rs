//! Observed remote schema and reference resolution
//!
//! The sync engine compares declared content types against the remote state
//! fetched by a single inspection call. This module holds the engine-facing
//! observed model, the identifier lookup tables built from it, and the
//! resolution step that turns declared reference targets into backend
//! identifiers before anything is sent remotely.

use std::collections::HashMap;

use serde::Serialize;

use crate::schema::{to_snake_case, ContentTypeDef, FieldDef, FieldType, ReferenceTarget};

/// A field as observed on the backend
#[derive(Debug, Clone, Serialize)]
pub struct RemoteField {
    pub id: String,
    /// Canonical field name
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub required: bool,
    pub is_label: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    /// Identifiers of the content types this field may reference
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reference_type_ids: Vec<String>,
}

/// A content type as observed on the backend
///
/// Produced fresh on every inspection call and never cached across runs;
/// fields are keyed by canonical name.
#[derive(Debug, Clone, Serialize)]
pub struct RemoteContentType {
    pub id: String,
    /// Canonical content-type name
    pub name: String,
    pub fields: HashMap<String, RemoteField>,
}

/// Identifier lookup tables derived from an inspection result
///
/// Rebuilt from scratch whenever the remote state is re-fetched; the tables
/// are never patched incrementally.
#[derive(Debug, Clone, Default)]
pub struct ReferenceLookups {
    id_to_name: HashMap<String, String>,
    name_to_id: HashMap<String, String>,
}

impl ReferenceLookups {
    /// Build both tables from the observed content types
    pub fn build(observed: &[RemoteContentType]) -> Self {
        let mut id_to_name = HashMap::with_capacity(observed.len());
        let mut name_to_id = HashMap::with_capacity(observed.len());
        for content_type in observed {
            id_to_name.insert(content_type.id.clone(), content_type.name.clone());
            name_to_id.insert(content_type.name.clone(), content_type.id.clone());
        }
        Self { id_to_name, name_to_id }
    }

    pub fn name_of(&self, id: &str) -> Option<&str> {
        self.id_to_name.get(id).map(String::as_str)
    }

    pub fn id_of(&self, name: &str) -> Option<&str> {
        self.name_to_id.get(name).map(String::as_str)
    }
}

/// Resolve declared reference targets to backend content-type identifiers.
///
/// Unknown targets fall back to the canonical name string rather than being
/// dropped; the backend rejects names it does not know, which surfaces as a
/// per-field error instead of a silent omission here.
pub fn resolve_references(targets: &[ReferenceTarget], lookups: &ReferenceLookups) -> Vec<String> {
    targets
        .iter()
        .map(|target| {
            let name = target.canonical_name();
            lookups.id_of(&name).map(str::to_string).unwrap_or(name)
        })
        .collect()
}

/// A field definition with reference targets resolved to identifiers, ready
/// to be sent to the backend
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedField {
    /// Canonical field name
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub required: bool,
    pub is_label: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reference_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A content-type definition ready to be sent to the backend, fields
/// included
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedContentType {
    /// Canonical content-type name
    pub name: String,
    /// Display name shown in the backend UI
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub fields: Vec<ResolvedField>,
}

/// Resolve a declared field for remote submission
pub fn resolve_field(name: &str, def: &FieldDef, lookups: &ReferenceLookups) -> ResolvedField {
    ResolvedField {
        name: to_snake_case(name),
        field_type: def.field_type.clone(),
        required: def.required,
        is_label: def.is_label,
        options: def.options.clone(),
        reference_ids: def
            .references
            .as_deref()
            .map(|targets| resolve_references(targets, lookups))
            .unwrap_or_default(),
        description: def.description.clone(),
    }
}

/// Resolve a declared content type for remote submission
pub fn resolve_content_type(def: &ContentTypeDef, lookups: &ReferenceLookups) -> ResolvedContentType {
    ResolvedContentType {
        name: def.name.clone(),
        display_name: def.display_label().to_string(),
        description: def.description.clone(),
        fields: def
            .fields
            .iter()
            .map(|(name, field)| resolve_field(name, field, lookups))
            .collect(),
    }
}

/// Changes to apply to an existing remote field
#[derive(Debug, Clone, Default, Serialize)]
pub struct FieldChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_label: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    /// Resolved content-type identifiers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub references: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FieldChanges {
    pub fn is_empty(&self) -> bool {
        self.required.is_none()
            && self.is_label.is_none()
            && self.options.is_none()
            && self.references.is_none()
            && self.description.is_none()
    }
}
