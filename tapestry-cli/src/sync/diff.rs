//! Field-level schema diffing
//!
//! Compares a declared content type against its observed remote counterpart
//! and produces one entry per divergent field: missing remotely, changed, or
//! present remotely with no declared counterpart.
//!
//! A field whose declared type differs from its remote type is not a diff
//! entry at all: backend field types are immutable once created, so the
//! comparison fails outright rather than letting any other change be applied
//! on top of a corrupted schema.

use std::collections::{BTreeMap, HashSet};

use anyhow::Result;
use serde::Serialize;
use serde_json::json;

use crate::schema::{to_snake_case, ContentTypeDef, FieldDef};

use super::remote::{ReferenceLookups, RemoteContentType, RemoteField};

/// Why a field appears in the diff
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffReason {
    /// Declared but absent remotely
    MissingField,
    /// Present on both sides with divergent attributes
    FieldChanges,
    /// Present remotely with no declared counterpart
    ExtraFieldRemote,
}

impl DiffReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingField => "missing_field",
            Self::FieldChanges => "field_changes",
            Self::ExtraFieldRemote => "extra_field_remote",
        }
    }
}

/// An attribute that differs between the remote field and the declaration
#[derive(Debug, Clone, Serialize)]
pub struct AttributeChange {
    pub existing: serde_json::Value,
    pub desired: serde_json::Value,
}

/// One divergent field
#[derive(Debug, Clone, Serialize)]
pub struct FieldDiff {
    /// Canonical field name
    pub field: String,
    pub reason: DiffReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desired: Option<FieldDef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing: Option<RemoteField>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub changes: BTreeMap<&'static str, AttributeChange>,
}

impl FieldDiff {
    fn missing(field: String, desired: &FieldDef) -> Self {
        Self {
            field,
            reason: DiffReason::MissingField,
            desired: Some(desired.clone()),
            existing: None,
            changes: BTreeMap::new(),
        }
    }

    fn extra(existing: &RemoteField) -> Self {
        Self {
            field: existing.name.clone(),
            reason: DiffReason::ExtraFieldRemote,
            desired: None,
            existing: Some(existing.clone()),
            changes: BTreeMap::new(),
        }
    }
}

/// Diff a declared content type against its observed remote counterpart.
///
/// A missing content type produces an empty diff: creating the type creates
/// all of its fields with it, so there is no field-level work to plan.
/// Reference targets are compared by canonical target name, order
/// insensitively, which needs the identifier `lookups` to translate the
/// remote side's identifiers back to names.
pub fn diff_content_type(
    desired: &ContentTypeDef,
    remote: Option<&RemoteContentType>,
    lookups: &ReferenceLookups,
) -> Result<Vec<FieldDiff>> {
    let Some(remote) = remote else {
        return Ok(Vec::new());
    };

    let mut diffs = Vec::new();
    let mut declared: HashSet<String> = HashSet::with_capacity(desired.fields.len());

    for (raw_name, field) in &desired.fields {
        let name = to_snake_case(raw_name);
        declared.insert(name.clone());

        let Some(existing) = remote.fields.get(&name) else {
            diffs.push(FieldDiff::missing(name, field));
            continue;
        };

        if field.field_type != existing.field_type {
            anyhow::bail!(
                "field '{}' on content type '{}' is '{}' remotely but declared as '{}'; \
                 field types cannot be changed in place",
                name,
                desired.name,
                existing.field_type,
                field.field_type,
            );
        }

        let changes = compare_attributes(field, existing, lookups);
        if !changes.is_empty() {
            diffs.push(FieldDiff {
                field: name,
                reason: DiffReason::FieldChanges,
                desired: Some(field.clone()),
                existing: Some(existing.clone()),
                changes,
            });
        }
    }

    // Remote fields with no declared counterpart, sorted for stable output
    let mut extra: Vec<&RemoteField> = remote
        .fields
        .values()
        .filter(|field| !declared.contains(&field.name))
        .collect();
    extra.sort_by(|a, b| a.name.cmp(&b.name));
    diffs.extend(extra.into_iter().map(FieldDiff::extra));

    Ok(diffs)
}

fn compare_attributes(
    desired: &FieldDef,
    existing: &RemoteField,
    lookups: &ReferenceLookups,
) -> BTreeMap<&'static str, AttributeChange> {
    let mut changes = BTreeMap::new();

    if desired.required != existing.required {
        changes.insert(
            "required",
            AttributeChange {
                existing: json!(existing.required),
                desired: json!(desired.required),
            },
        );
    }

    if desired.is_label != existing.is_label {
        changes.insert(
            "is_label",
            AttributeChange {
                existing: json!(existing.is_label),
                desired: json!(desired.is_label),
            },
        );
    }

    if !options_equal(desired.options.as_deref(), existing.options.as_deref()) {
        changes.insert(
            "options",
            AttributeChange {
                existing: json!(existing.options),
                desired: json!(desired.options),
            },
        );
    }

    let desired_targets = desired_reference_names(desired);
    let existing_targets = existing_reference_names(existing, lookups);
    if desired_targets != existing_targets {
        changes.insert(
            "references",
            AttributeChange {
                existing: json!(existing_targets),
                desired: json!(desired_targets),
            },
        );
    }

    changes
}

/// Set equality on count and membership; ordering never counts as a change
fn options_equal(desired: Option<&[String]>, existing: Option<&[String]>) -> bool {
    let desired = desired.unwrap_or_default();
    let existing = existing.unwrap_or_default();
    if desired.len() != existing.len() {
        return false;
    }
    let existing: HashSet<&str> = existing.iter().map(String::as_str).collect();
    desired.iter().all(|value| existing.contains(value.as_str()))
}

fn desired_reference_names(desired: &FieldDef) -> Vec<String> {
    let mut names: Vec<String> = desired
        .references
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(|target| target.canonical_name())
        .collect();
    names.sort();
    names
}

/// Remote reference targets, translated back to canonical names so the two
/// sides compare in the same namespace. Unknown identifiers stay as-is.
fn existing_reference_names(existing: &RemoteField, lookups: &ReferenceLookups) -> Vec<String> {
    let mut names: Vec<String> = existing
        .reference_type_ids
        .iter()
        .map(|id| lookups.name_of(id).unwrap_or(id).to_string())
        .collect();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldType, ReferenceTarget};
    use std::collections::HashMap;

    fn make_remote_field(name: &str, field_type: FieldType) -> RemoteField {
        RemoteField {
            id: format!("fld_{name}"),
            name: name.to_string(),
            field_type,
            required: false,
            is_label: false,
            options: None,
            reference_type_ids: Vec::new(),
        }
    }

    fn make_remote(name: &str, fields: Vec<RemoteField>) -> RemoteContentType {
        RemoteContentType {
            id: format!("ct_{name}"),
            name: name.to_string(),
            fields: fields.into_iter().map(|f| (f.name.clone(), f)).collect(),
        }
    }

    #[test]
    fn test_missing_content_type_yields_no_field_diffs() {
        let desired = ContentTypeDef::new("post").field("title", FieldDef::new(FieldType::Text));
        let lookups = ReferenceLookups::default();

        let diffs = diff_content_type(&desired, None, &lookups).unwrap();
        assert!(diffs.is_empty());
    }

    #[test]
    fn test_identical_schemas_yield_no_diffs() {
        let desired = ContentTypeDef::new("post")
            .field("title", FieldDef::new(FieldType::Text).required())
            .field("views", FieldDef::new(FieldType::Integer));
        let remote = make_remote(
            "post",
            vec![
                {
                    let mut f = make_remote_field("title", FieldType::Text);
                    f.required = true;
                    f
                },
                make_remote_field("views", FieldType::Integer),
            ],
        );
        let lookups = ReferenceLookups::default();

        let diffs = diff_content_type(&desired, Some(&remote), &lookups).unwrap();
        assert!(diffs.is_empty());
    }

    #[test]
    fn test_missing_field_detected() {
        let desired = ContentTypeDef::new("post")
            .field("title", FieldDef::new(FieldType::Text))
            .field("summary", FieldDef::new(FieldType::Text));
        let remote = make_remote("post", vec![make_remote_field("title", FieldType::Text)]);
        let lookups = ReferenceLookups::default();

        let diffs = diff_content_type(&desired, Some(&remote), &lookups).unwrap();
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].field, "summary");
        assert_eq!(diffs[0].reason, DiffReason::MissingField);
        assert!(diffs[0].desired.is_some());
        assert!(diffs[0].existing.is_none());
    }

    #[test]
    fn test_declared_field_name_is_canonicalized() {
        let desired =
            ContentTypeDef::new("post").field("coverImageUrl", FieldDef::new(FieldType::Text));
        let remote = make_remote(
            "post",
            vec![make_remote_field("cover_image_url", FieldType::Text)],
        );
        let lookups = ReferenceLookups::default();

        let diffs = diff_content_type(&desired, Some(&remote), &lookups).unwrap();
        assert!(diffs.is_empty());
    }

    #[test]
    fn test_required_change_detected() {
        let desired = ContentTypeDef::new("post").field("title", FieldDef::new(FieldType::Text));
        let remote = make_remote("post", vec![{
            let mut f = make_remote_field("title", FieldType::Text);
            f.required = true;
            f
        }]);
        let lookups = ReferenceLookups::default();

        let diffs = diff_content_type(&desired, Some(&remote), &lookups).unwrap();
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].reason, DiffReason::FieldChanges);
        let change = &diffs[0].changes["required"];
        assert_eq!(change.existing, json!(true));
        assert_eq!(change.desired, json!(false));
    }

    #[test]
    fn test_options_compare_as_sets() {
        let desired = ContentTypeDef::new("post").field(
            "status",
            FieldDef::new(FieldType::Text).options(vec!["draft".into(), "published".into()]),
        );
        let remote = make_remote("post", vec![{
            let mut f = make_remote_field("status", FieldType::Text);
            f.options = Some(vec!["published".into(), "draft".into()]);
            f
        }]);
        let lookups = ReferenceLookups::default();

        let diffs = diff_content_type(&desired, Some(&remote), &lookups).unwrap();
        assert!(diffs.is_empty());
    }

    #[test]
    fn test_options_value_change_detected() {
        let desired = ContentTypeDef::new("post").field(
            "status",
            FieldDef::new(FieldType::Text).options(vec!["draft".into(), "archived".into()]),
        );
        let remote = make_remote("post", vec![{
            let mut f = make_remote_field("status", FieldType::Text);
            f.options = Some(vec!["draft".into(), "published".into()]);
            f
        }]);
        let lookups = ReferenceLookups::default();

        let diffs = diff_content_type(&desired, Some(&remote), &lookups).unwrap();
        assert_eq!(diffs.len(), 1);
        assert!(diffs[0].changes.contains_key("options"));
    }

    #[test]
    fn test_references_are_order_insensitive() {
        let desired = ContentTypeDef::new("post").field(
            "related",
            FieldDef::new(FieldType::Reference).references(vec![
                ReferenceTarget::from("video"),
                ReferenceTarget::from("article"),
            ]),
        );
        let remote = make_remote("post", vec![{
            let mut f = make_remote_field("related", FieldType::Reference);
            f.reference_type_ids = vec!["ct_article".into(), "ct_video".into()];
            f
        }]);
        let lookups = ReferenceLookups::build(&[
            RemoteContentType {
                id: "ct_article".into(),
                name: "article".into(),
                fields: HashMap::new(),
            },
            RemoteContentType {
                id: "ct_video".into(),
                name: "video".into(),
                fields: HashMap::new(),
            },
        ]);

        let diffs = diff_content_type(&desired, Some(&remote), &lookups).unwrap();
        assert!(diffs.is_empty());
    }

    #[test]
    fn test_reference_target_change_detected() {
        let desired = ContentTypeDef::new("post").field(
            "related",
            FieldDef::new(FieldType::Reference).references(vec![ReferenceTarget::from("video")]),
        );
        let remote = make_remote("post", vec![{
            let mut f = make_remote_field("related", FieldType::Reference);
            f.reference_type_ids = vec!["ct_article".into()];
            f
        }]);
        let lookups = ReferenceLookups::build(&[RemoteContentType {
            id: "ct_article".into(),
            name: "article".into(),
            fields: HashMap::new(),
        }]);

        let diffs = diff_content_type(&desired, Some(&remote), &lookups).unwrap();
        assert_eq!(diffs.len(), 1);
        let change = &diffs[0].changes["references"];
        assert_eq!(change.existing, json!(["article"]));
        assert_eq!(change.desired, json!(["video"]));
    }

    #[test]
    fn test_extra_remote_field_detected() {
        let desired = ContentTypeDef::new("post").field("title", FieldDef::new(FieldType::Text));
        let remote = make_remote(
            "post",
            vec![
                make_remote_field("title", FieldType::Text),
                make_remote_field("legacy_slug", FieldType::Text),
            ],
        );
        let lookups = ReferenceLookups::default();

        let diffs = diff_content_type(&desired, Some(&remote), &lookups).unwrap();
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].field, "legacy_slug");
        assert_eq!(diffs[0].reason, DiffReason::ExtraFieldRemote);
        assert!(diffs[0].changes.is_empty());
    }

    #[test]
    fn test_type_mismatch_is_fatal() {
        let desired = ContentTypeDef::new("post").field("count", FieldDef::new(FieldType::Text));
        let remote = make_remote("post", vec![make_remote_field("count", FieldType::Integer)]);
        let lookups = ReferenceLookups::default();

        let err = diff_content_type(&desired, Some(&remote), &lookups).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("count"));
        assert!(message.contains("post"));
        assert!(message.contains("integer"));
        assert!(message.contains("text"));
    }
}
