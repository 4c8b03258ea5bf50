//! Wire models for the Tapestry content API
//!
//! These mirror the backend's JSON shapes verbatim and convert into the
//! engine-facing observed model. Canonical names come from the backend
//! `slug`; the canonicalization is re-applied defensively on ingest.

use serde::{Deserialize, Serialize};

use crate::schema::{to_snake_case, FieldType};
use crate::sync::{RemoteContentType, RemoteField};

/// Response of the inspection call: every content type with its fields
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InspectResponse {
    #[serde(default)]
    pub content_types: Vec<ContentTypePayload>,
}

/// One content type on the wire
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentTypePayload {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldPayload>,
}

/// One field on the wire
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldPayload {
    pub id: String,
    pub slug: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub is_label: bool,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<FieldMeta>,
}

/// Field metadata envelope
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldMeta {
    /// Identifiers of the content types a reference field may point at
    #[serde(default)]
    pub reference_types: Vec<String>,
}

impl From<FieldPayload> for RemoteField {
    fn from(payload: FieldPayload) -> Self {
        RemoteField {
            name: to_snake_case(&payload.slug),
            id: payload.id,
            field_type: payload.field_type,
            required: payload.required,
            is_label: payload.is_label,
            options: payload.options,
            reference_type_ids: payload.meta.map(|m| m.reference_types).unwrap_or_default(),
        }
    }
}

impl From<ContentTypePayload> for RemoteContentType {
    fn from(payload: ContentTypePayload) -> Self {
        let name = to_snake_case(payload.slug.as_deref().unwrap_or(&payload.id));
        RemoteContentType {
            id: payload.id,
            name,
            fields: payload
                .fields
                .into_iter()
                .map(RemoteField::from)
                .map(|field| (field.name.clone(), field))
                .collect(),
        }
    }
}

impl InspectResponse {
    /// Convert the wire response into the engine-facing observed model
    pub fn into_observed(self) -> Vec<RemoteContentType> {
        self.content_types.into_iter().map(RemoteContentType::from).collect()
    }
}
