//! Declared content-schema model
//!
//! These types describe the desired state of the remote content schema: a
//! set of content types, each with a set of typed fields. Definitions are
//! authored by the caller (or loaded from a manifest) and never mutated by
//! the sync engine.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::naming::to_snake_case;

/// Field data types supported by the Tapestry backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Text,
    Integer,
    Decimal,
    Boolean,
    DateTime,
    Reference,
    /// Backend type this client does not model; carried through verbatim
    Other(String),
}

impl FieldType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Decimal => "decimal",
            Self::Boolean => "boolean",
            Self::DateTime => "datetime",
            Self::Reference => "reference",
            Self::Other(s) => s,
        }
    }
}

impl From<&str> for FieldType {
    fn from(s: &str) -> Self {
        match s {
            "text" => Self::Text,
            "integer" => Self::Integer,
            "decimal" => Self::Decimal,
            "boolean" => Self::Boolean,
            "datetime" => Self::DateTime,
            "reference" => Self::Reference,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FieldType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FieldType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(FieldType::from(s.as_str()))
    }
}

/// Target of a reference field: another content type, by canonical name or
/// by handle to its in-memory definition.
///
/// Targets are resolved to backend identifiers at sync time; see
/// [`crate::sync::resolve_references`].
#[derive(Debug, Clone)]
pub enum ReferenceTarget {
    /// A content-type name (canonicalized on comparison)
    Name(String),
    /// A handle to another declared content type
    Type(Arc<ContentTypeDef>),
}

impl ReferenceTarget {
    /// The canonical name of the referenced content type
    pub fn canonical_name(&self) -> String {
        match self {
            Self::Name(name) => to_snake_case(name),
            Self::Type(def) => def.name.clone(),
        }
    }
}

impl From<&str> for ReferenceTarget {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for ReferenceTarget {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<&Arc<ContentTypeDef>> for ReferenceTarget {
    fn from(def: &Arc<ContentTypeDef>) -> Self {
        Self::Type(Arc::clone(def))
    }
}

impl Serialize for ReferenceTarget {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.canonical_name())
    }
}

impl<'de> Deserialize<'de> for ReferenceTarget {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(ReferenceTarget::Name(s))
    }
}

/// A declared field on a content type
#[derive(Debug, Clone, Serialize)]
pub struct FieldDef {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub required: bool,
    pub is_label: bool,
    /// Allowed values, text fields only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    /// Target content types, reference fields only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub references: Option<Vec<ReferenceTarget>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FieldDef {
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            required: false,
            is_label: false,
            options: None,
            references: None,
            description: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn label(mut self) -> Self {
        self.is_label = true;
        self
    }

    pub fn options(mut self, options: Vec<String>) -> Self {
        self.options = Some(options);
        self
    }

    pub fn references(mut self, targets: Vec<ReferenceTarget>) -> Self {
        self.references = Some(targets);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A declared content type
///
/// The type name is canonicalized on construction; field keys keep their
/// authored casing and are canonicalized when compared against the remote
/// schema.
#[derive(Debug, Clone, Serialize)]
pub struct ContentTypeDef {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub fields: BTreeMap<String, FieldDef>,
}

impl ContentTypeDef {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: to_snake_case(name.as_ref()),
            display_name: None,
            description: None,
            fields: BTreeMap::new(),
        }
    }

    pub fn display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, def: FieldDef) -> Self {
        self.fields.insert(name.into(), def);
        self
    }

    /// Display name sent to the backend on creation, falling back to the
    /// canonical name when none was declared.
    pub fn display_label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}
