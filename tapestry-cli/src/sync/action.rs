//! Sync actions, options, and outcome summary
//!
//! The engine turns diff results into an ordered list of typed actions, each
//! carrying enough structured detail for a caller to render a report or fail
//! a CI pipeline on anything that is not a no-op.

use serde::Serialize;

use super::diff::FieldDiff;

/// Options recognized by the sync engine
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Plan only: no mutation callback is ever invoked
    pub dry_run: bool,
    /// Create content types that are absent remotely
    pub create_missing: bool,
    /// Create declared fields that are absent remotely
    pub create_missing_fields: bool,
    /// Update fields whose attributes diverge
    pub update_fields: bool,
    /// Delete remote fields with no declared counterpart
    pub delete_extra_fields: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            dry_run: true,
            create_missing: true,
            create_missing_fields: true,
            update_fields: true,
            delete_extra_fields: false,
        }
    }
}

impl SyncOptions {
    /// Options that actually apply changes
    pub fn apply() -> Self {
        Self {
            dry_run: false,
            ..Self::default()
        }
    }
}

/// One planned or executed step of a reconciliation run
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyncAction {
    /// Content type is absent remotely and will be (or was) created
    Create { content_type: String },
    /// Declared fields absent remotely
    CreateFields {
        content_type: String,
        /// Fields actually created; zero in a dry run
        created: usize,
        diffs: Vec<FieldDiff>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        errors: Vec<String>,
    },
    /// Fields whose attributes diverge
    UpdateFields {
        content_type: String,
        /// Fields actually updated; zero in a dry run
        updated: usize,
        diffs: Vec<FieldDiff>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        errors: Vec<String>,
    },
    /// Remote fields with no declared counterpart
    DeleteFields {
        content_type: String,
        /// Fields actually deleted; zero in a dry run
        deleted: usize,
        diffs: Vec<FieldDiff>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        errors: Vec<String>,
    },
    /// Nothing was attempted for this content type
    Skip { content_type: String, reason: String },
    /// Declared and remote state already converge
    Noop { content_type: String },
    /// Divergence that was not (or could not be) applied
    Mismatch {
        content_type: String,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        diffs: Vec<FieldDiff>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        errors: Vec<String>,
    },
}

impl SyncAction {
    /// The action type as a string
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::CreateFields { .. } => "create_fields",
            Self::UpdateFields { .. } => "update_fields",
            Self::DeleteFields { .. } => "delete_fields",
            Self::Skip { .. } => "skip",
            Self::Noop { .. } => "noop",
            Self::Mismatch { .. } => "mismatch",
        }
    }

    /// The content type this action concerns
    pub fn content_type(&self) -> &str {
        match self {
            Self::Create { content_type }
            | Self::CreateFields { content_type, .. }
            | Self::UpdateFields { content_type, .. }
            | Self::DeleteFields { content_type, .. }
            | Self::Skip { content_type, .. }
            | Self::Noop { content_type }
            | Self::Mismatch { content_type, .. } => content_type,
        }
    }

    /// Field diffs attached to this action, if any
    pub fn diffs(&self) -> &[FieldDiff] {
        match self {
            Self::CreateFields { diffs, .. }
            | Self::UpdateFields { diffs, .. }
            | Self::DeleteFields { diffs, .. }
            | Self::Mismatch { diffs, .. } => diffs,
            _ => &[],
        }
    }

    /// Error strings collected while applying this action
    pub fn errors(&self) -> &[String] {
        match self {
            Self::CreateFields { errors, .. }
            | Self::UpdateFields { errors, .. }
            | Self::DeleteFields { errors, .. }
            | Self::Mismatch { errors, .. } => errors,
            _ => &[],
        }
    }

    /// Whether this action represents pending or applied divergence
    pub fn is_change(&self) -> bool {
        !matches!(self, Self::Noop { .. } | Self::Skip { .. })
    }
}

/// The result of one reconciliation run
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncOutcome {
    /// Actions in the order content types were processed
    pub actions: Vec<SyncAction>,
}

impl SyncOutcome {
    /// Aggregate counts for reporting
    pub fn summary(&self) -> SyncSummary {
        let mut summary = SyncSummary::default();
        for action in &self.actions {
            match action {
                SyncAction::Create { .. } => summary.types_created += 1,
                SyncAction::CreateFields { created, .. } => summary.fields_created += created,
                SyncAction::UpdateFields { updated, .. } => summary.fields_updated += updated,
                SyncAction::DeleteFields { deleted, .. } => summary.fields_deleted += deleted,
                SyncAction::Skip { .. } => summary.skipped += 1,
                SyncAction::Noop { .. } => summary.unchanged += 1,
                SyncAction::Mismatch { .. } => summary.mismatched += 1,
            }
            summary.errors += action.errors().len();
        }
        summary
    }

    /// True when any action is not a no-op or skip
    pub fn has_changes(&self) -> bool {
        self.actions.iter().any(SyncAction::is_change)
    }
}

/// Aggregate counts across a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    pub types_created: usize,
    pub fields_created: usize,
    pub fields_updated: usize,
    pub fields_deleted: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub mismatched: usize,
    pub errors: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_kinds() {
        let action = SyncAction::Create { content_type: "post".into() };
        assert_eq!(action.kind(), "create");
        assert_eq!(action.content_type(), "post");
        assert!(action.is_change());

        let action = SyncAction::Noop { content_type: "post".into() };
        assert_eq!(action.kind(), "noop");
        assert!(!action.is_change());

        let action = SyncAction::Skip { content_type: "post".into(), reason: "disabled".into() };
        assert!(!action.is_change());
    }

    #[test]
    fn test_default_options() {
        let options = SyncOptions::default();
        assert!(options.dry_run);
        assert!(options.create_missing);
        assert!(options.create_missing_fields);
        assert!(options.update_fields);
        assert!(!options.delete_extra_fields);

        assert!(!SyncOptions::apply().dry_run);
    }

    #[test]
    fn test_summary_counts() {
        let outcome = SyncOutcome {
            actions: vec![
                SyncAction::Create { content_type: "a".into() },
                SyncAction::CreateFields {
                    content_type: "b".into(),
                    created: 2,
                    diffs: Vec::new(),
                    errors: vec!["boom".into()],
                },
                SyncAction::Noop { content_type: "c".into() },
                SyncAction::Mismatch {
                    content_type: "d".into(),
                    diffs: Vec::new(),
                    errors: Vec::new(),
                },
            ],
        };

        let summary = outcome.summary();
        assert_eq!(summary.types_created, 1);
        assert_eq!(summary.fields_created, 2);
        assert_eq!(summary.unchanged, 1);
        assert_eq!(summary.mismatched, 1);
        assert_eq!(summary.errors, 1);
        assert!(outcome.has_changes());
    }

    #[test]
    fn test_no_changes_when_all_noop() {
        let outcome = SyncOutcome {
            actions: vec![
                SyncAction::Noop { content_type: "a".into() },
                SyncAction::Skip { content_type: "b".into(), reason: "disabled".into() },
            ],
        };
        assert!(!outcome.has_changes());
    }
}
