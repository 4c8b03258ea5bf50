//! The phased sync engine
//!
//! Reconciliation runs in three strictly sequential phases:
//!
//! 1. **Content-type creation** - every declared content type absent from
//!    the observed remote state is created (fields included).
//! 2. **Refresh** - the remote state is re-fetched and the identifier
//!    lookup tables rebuilt from scratch, so phase 3 sees the content types
//!    created in phase 1. Skipped entirely in a dry run.
//! 3. **Field reconciliation** - per content type, declared fields are
//!    diffed against the remote field set and created, updated, or deleted
//!    through the remote contract.
//!
//! Content-type failures in phase 1 and field failures in phase 3 are
//! isolated: one failure never blocks sibling work. The engine makes exactly
//! one attempt per planned action; callers converge by re-running the whole
//! reconciliation until it reports only no-ops.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use log::{error, info, warn};

use crate::schema::ContentTypeDef;

use super::action::{SyncAction, SyncOptions, SyncOutcome};
use super::diff::{diff_content_type, DiffReason, FieldDiff};
use super::remote::{
    resolve_content_type, resolve_field, resolve_references, FieldChanges, ReferenceLookups,
    RemoteContentType, RemoteField, ResolvedContentType, ResolvedField,
};

/// The remote schema contract the engine runs against
///
/// One inspection call plus four mutations. Implemented over HTTP by
/// [`crate::api::TapestryClient`] and by deterministic doubles in tests.
#[async_trait]
pub trait SchemaRemote: Send + Sync {
    /// Fetch every remote content type with its complete field list
    async fn inspect(&self) -> Result<Vec<RemoteContentType>>;

    /// Create a content type, fields included
    async fn create_content_type(&self, content_type: &ResolvedContentType)
        -> Result<RemoteContentType>;

    /// Create a field on an existing content type
    async fn create_field(&self, content_type_id: &str, field: &ResolvedField)
        -> Result<RemoteField>;

    /// Update attributes of an existing field
    async fn update_field(&self, field_id: &str, changes: &FieldChanges) -> Result<RemoteField>;

    /// Delete a field
    async fn delete_field(&self, field_id: &str) -> Result<()>;
}

/// Reconciles a declared schema against a remote backend
pub struct SyncEngine<'a, R: SchemaRemote> {
    remote: &'a R,
    options: SyncOptions,
}

impl<'a, R: SchemaRemote> SyncEngine<'a, R> {
    pub fn new(remote: &'a R, options: SyncOptions) -> Self {
        Self { remote, options }
    }

    /// Run one reconciliation pass and return the accumulated actions.
    ///
    /// The only error this propagates is a field-type mismatch, which can
    /// never be applied and would mask a schema corruption if folded into
    /// the action list. Every other failure is collected per action.
    pub async fn sync(&self, desired: &[ContentTypeDef]) -> Result<SyncOutcome> {
        let observed = match self.remote.inspect().await {
            Ok(observed) => observed,
            Err(err) => {
                warn!("inspection failed, planning against an empty remote schema: {err:#}");
                Vec::new()
            }
        };
        let mut lookups = ReferenceLookups::build(&observed);
        let mut by_name = index_by_name(observed);

        let mut actions = Vec::new();

        info!("phase 1: content-type creation");
        for def in desired {
            if by_name.contains_key(&def.name) {
                continue;
            }
            if !self.options.create_missing {
                actions.push(SyncAction::Skip {
                    content_type: def.name.clone(),
                    reason: "content type is missing remotely and create_missing is disabled"
                        .to_string(),
                });
                continue;
            }
            actions.push(self.create_content_type(def, &lookups).await);
        }

        if !self.options.dry_run {
            info!("phase 2: refreshing remote state");
            match self.remote.inspect().await {
                Ok(observed) => {
                    lookups = ReferenceLookups::build(&observed);
                    by_name = index_by_name(observed);
                }
                Err(err) => {
                    // TODO: retry the refresh once before giving up; with a
                    // transient failure here, types created in phase 1 get no
                    // field work until the next run.
                    warn!("refresh failed, continuing with pre-creation state: {err:#}");
                }
            }
        }

        info!("phase 3: field reconciliation");
        for def in desired {
            // Still missing (skipped, failed to create, or created but not
            // yet visible): field work waits for the next run.
            let Some(remote_ct) = by_name.get(&def.name) else {
                continue;
            };
            self.reconcile_fields(def, remote_ct, &lookups, &mut actions).await?;
        }

        Ok(SyncOutcome { actions })
    }

    async fn create_content_type(
        &self,
        def: &ContentTypeDef,
        lookups: &ReferenceLookups,
    ) -> SyncAction {
        if self.options.dry_run {
            return SyncAction::Create { content_type: def.name.clone() };
        }
        let payload = resolve_content_type(def, lookups);
        match self.remote.create_content_type(&payload).await {
            Ok(created) => {
                info!("created content type '{}' ({})", def.name, created.id);
                SyncAction::Create { content_type: def.name.clone() }
            }
            Err(err) => {
                error!("failed to create content type '{}': {err:#}", def.name);
                SyncAction::Mismatch {
                    content_type: def.name.clone(),
                    diffs: Vec::new(),
                    errors: vec![format!("{err:#}")],
                }
            }
        }
    }

    async fn reconcile_fields(
        &self,
        def: &ContentTypeDef,
        remote_ct: &RemoteContentType,
        lookups: &ReferenceLookups,
        actions: &mut Vec<SyncAction>,
    ) -> Result<()> {
        let diffs = diff_content_type(def, Some(remote_ct), lookups)?;
        if diffs.is_empty() {
            actions.push(SyncAction::Noop { content_type: def.name.clone() });
            return Ok(());
        }

        let mut missing = Vec::new();
        let mut changed = Vec::new();
        let mut extra = Vec::new();
        for diff in diffs {
            match diff.reason {
                DiffReason::MissingField => missing.push(diff),
                DiffReason::FieldChanges => changed.push(diff),
                DiffReason::ExtraFieldRemote => extra.push(diff),
            }
        }

        // Diffs whose apply-flag is disabled are reported, not applied
        let mut blocked = Vec::new();

        if !missing.is_empty() {
            if self.options.create_missing_fields {
                let (created, errors) = self.create_fields(remote_ct, &missing, lookups).await;
                actions.push(SyncAction::CreateFields {
                    content_type: def.name.clone(),
                    created,
                    diffs: missing,
                    errors,
                });
            } else {
                blocked.extend(missing);
            }
        }

        if !changed.is_empty() {
            if self.options.update_fields {
                let (updated, errors) = self.update_fields(remote_ct, &changed, lookups).await;
                actions.push(SyncAction::UpdateFields {
                    content_type: def.name.clone(),
                    updated,
                    diffs: changed,
                    errors,
                });
            } else {
                blocked.extend(changed);
            }
        }

        if !extra.is_empty() {
            if self.options.delete_extra_fields {
                let (deleted, errors) = self.delete_fields(remote_ct, &extra).await;
                actions.push(SyncAction::DeleteFields {
                    content_type: def.name.clone(),
                    deleted,
                    diffs: extra,
                    errors,
                });
            } else {
                blocked.extend(extra);
            }
        }

        if !blocked.is_empty() {
            actions.push(SyncAction::Mismatch {
                content_type: def.name.clone(),
                diffs: blocked,
                errors: Vec::new(),
            });
        }

        Ok(())
    }

    async fn create_fields(
        &self,
        remote_ct: &RemoteContentType,
        diffs: &[FieldDiff],
        lookups: &ReferenceLookups,
    ) -> (usize, Vec<String>) {
        let mut created = 0;
        let mut errors = Vec::new();
        if self.options.dry_run {
            return (created, errors);
        }
        for diff in diffs {
            let Some(field) = diff.desired.as_ref() else {
                continue;
            };
            let resolved = resolve_field(&diff.field, field, lookups);
            match self.remote.create_field(&remote_ct.id, &resolved).await {
                Ok(_) => created += 1,
                Err(err) => {
                    error!(
                        "failed to create field '{}' on '{}': {err:#}",
                        diff.field, remote_ct.name
                    );
                    errors.push(format!("{}: {err:#}", diff.field));
                }
            }
        }
        (created, errors)
    }

    async fn update_fields(
        &self,
        remote_ct: &RemoteContentType,
        diffs: &[FieldDiff],
        lookups: &ReferenceLookups,
    ) -> (usize, Vec<String>) {
        let mut updated = 0;
        let mut errors = Vec::new();
        if self.options.dry_run {
            return (updated, errors);
        }
        for diff in diffs {
            let (Some(field), Some(existing)) = (diff.desired.as_ref(), diff.existing.as_ref())
            else {
                continue;
            };
            let changes = update_payload(diff, field, lookups);
            match self.remote.update_field(&existing.id, &changes).await {
                Ok(_) => updated += 1,
                Err(err) => {
                    error!(
                        "failed to update field '{}' on '{}': {err:#}",
                        diff.field, remote_ct.name
                    );
                    errors.push(format!("{}: {err:#}", diff.field));
                }
            }
        }
        (updated, errors)
    }

    async fn delete_fields(
        &self,
        remote_ct: &RemoteContentType,
        diffs: &[FieldDiff],
    ) -> (usize, Vec<String>) {
        let mut deleted = 0;
        let mut errors = Vec::new();
        if self.options.dry_run {
            return (deleted, errors);
        }
        for diff in diffs {
            let Some(existing) = diff.existing.as_ref() else {
                continue;
            };
            match self.remote.delete_field(&existing.id).await {
                Ok(()) => deleted += 1,
                Err(err) => {
                    error!(
                        "failed to delete field '{}' on '{}': {err:#}",
                        diff.field, remote_ct.name
                    );
                    errors.push(format!("{}: {err:#}", diff.field));
                }
            }
        }
        (deleted, errors)
    }
}

fn index_by_name(observed: Vec<RemoteContentType>) -> HashMap<String, RemoteContentType> {
    observed.into_iter().map(|ct| (ct.name.clone(), ct)).collect()
}

/// Build the update payload for a changed field from its diff entry
fn update_payload(diff: &FieldDiff, field: &crate::schema::FieldDef, lookups: &ReferenceLookups) -> FieldChanges {
    let mut changes = FieldChanges::default();
    if diff.changes.contains_key("required") {
        changes.required = Some(field.required);
    }
    if diff.changes.contains_key("is_label") {
        changes.is_label = Some(field.is_label);
    }
    if diff.changes.contains_key("options") {
        changes.options = Some(field.options.clone().unwrap_or_default());
    }
    if diff.changes.contains_key("references") {
        let targets = field.references.as_deref().unwrap_or_default();
        changes.references = Some(resolve_references(targets, lookups));
    }
    changes
}
