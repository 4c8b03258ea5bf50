//! Schema manifest loading
//!
//! The CLI declares the desired content schema in a TOML manifest:
//!
//! ```toml
//! [content_type.blog_post]
//! display_name = "Blog Post"
//!
//! [content_type.blog_post.fields.title]
//! type = "text"
//! required = true
//! is_label = true
//!
//! [content_type.blog_post.fields.author]
//! type = "reference"
//! references = ["author"]
//! ```
//!
//! Validation happens here, before the sync engine ever runs: a content type
//! whose name canonicalizes to nothing, or that declares no fields, is
//! rejected outright.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::naming::to_snake_case;
use super::types::{ContentTypeDef, FieldDef, FieldType, ReferenceTarget};

/// Top-level manifest file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub content_type: BTreeMap<String, ManifestContentType>,
}

/// One declared content type in the manifest
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManifestContentType {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: BTreeMap<String, ManifestField>,
}

/// One declared field in the manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestField {
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub is_label: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Load and validate a schema manifest from disk
pub fn load_manifest(path: &Path) -> Result<Vec<ContentTypeDef>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read schema manifest '{}'", path.display()))?;
    parse_manifest(&text)
        .with_context(|| format!("invalid schema manifest '{}'", path.display()))
}

/// Parse and validate manifest text into content-type definitions
pub fn parse_manifest(text: &str) -> Result<Vec<ContentTypeDef>> {
    let manifest: Manifest = toml::from_str(text).context("failed to parse manifest TOML")?;

    let mut seen = BTreeMap::new();
    let mut types = Vec::with_capacity(manifest.content_type.len());

    for (raw_name, entry) in &manifest.content_type {
        let canonical = to_snake_case(raw_name);
        if canonical.is_empty() {
            anyhow::bail!("content type '{}' has no usable name after canonicalization", raw_name);
        }
        if let Some(previous) = seen.insert(canonical.clone(), raw_name.clone()) {
            anyhow::bail!(
                "content types '{}' and '{}' both canonicalize to '{}'",
                previous,
                raw_name,
                canonical
            );
        }
        if entry.fields.is_empty() {
            anyhow::bail!("content type '{}' declares no fields", raw_name);
        }

        let mut def = ContentTypeDef::new(raw_name);
        if let Some(display_name) = &entry.display_name {
            def = def.display_name(display_name.clone());
        }
        if let Some(description) = &entry.description {
            def = def.description(description.clone());
        }
        for (field_name, field) in &entry.fields {
            def = def.field(field_name.clone(), convert_field(field));
        }
        types.push(def);
    }

    Ok(types)
}

fn convert_field(field: &ManifestField) -> FieldDef {
    let mut def = FieldDef::new(FieldType::from(field.field_type.as_str()));
    if field.required {
        def = def.required();
    }
    if field.is_label {
        def = def.label();
    }
    if let Some(options) = &field.options {
        def = def.options(options.clone());
    }
    if let Some(references) = &field.references {
        def = def.references(references.iter().map(|r| ReferenceTarget::from(r.clone())).collect());
    }
    if let Some(description) = &field.description {
        def = def.description(description.clone());
    }
    def
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [content_type.blog_post]
        display_name = "Blog Post"

        [content_type.blog_post.fields.title]
        type = "text"
        required = true
        is_label = true

        [content_type.blog_post.fields.status]
        type = "text"
        options = ["draft", "published"]

        [content_type.blog_post.fields.author]
        type = "reference"
        references = ["author"]

        [content_type.author.fields.name]
        type = "text"
        required = true
    "#;

    #[test]
    fn test_parse_sample_manifest() {
        let types = parse_manifest(SAMPLE).unwrap();
        assert_eq!(types.len(), 2);

        let post = types.iter().find(|t| t.name == "blog_post").unwrap();
        assert_eq!(post.display_label(), "Blog Post");
        assert_eq!(post.fields.len(), 3);

        let title = &post.fields["title"];
        assert_eq!(title.field_type, FieldType::Text);
        assert!(title.required);
        assert!(title.is_label);

        let author = &post.fields["author"];
        assert_eq!(author.field_type, FieldType::Reference);
        let refs = author.references.as_ref().unwrap();
        assert_eq!(refs[0].canonical_name(), "author");
    }

    #[test]
    fn test_empty_fields_rejected() {
        let text = r#"
            [content_type.orphan]
            display_name = "Orphan"
        "#;
        let err = parse_manifest(text).unwrap_err();
        assert!(err.to_string().contains("declares no fields"));
    }

    #[test]
    fn test_unusable_name_rejected() {
        let text = r#"
            [content_type."!!!".fields.title]
            type = "text"
        "#;
        let err = parse_manifest(text).unwrap_err();
        assert!(err.to_string().contains("no usable name"));
    }

    #[test]
    fn test_colliding_names_rejected() {
        let text = r#"
            [content_type.BlogPost.fields.title]
            type = "text"

            [content_type.blog_post.fields.title]
            type = "text"
        "#;
        let err = parse_manifest(text).unwrap_err();
        assert!(err.to_string().contains("canonicalize to 'blog_post'"));
    }

    #[test]
    fn test_unknown_field_type_carried_through() {
        let text = r#"
            [content_type.map.fields.location]
            type = "geo_point"
        "#;
        let types = parse_manifest(text).unwrap();
        assert_eq!(
            types[0].fields["location"].field_type,
            FieldType::Other("geo_point".to_string())
        );
    }
}
