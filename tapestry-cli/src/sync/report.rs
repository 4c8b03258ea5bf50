//! Human-readable and machine-readable rendering of a sync outcome

use anyhow::Result;
use colored::Colorize;

use super::action::{SyncAction, SyncOutcome};
use super::diff::DiffReason;

/// Render the outcome as a colored terminal report
pub fn render(outcome: &SyncOutcome, dry_run: bool) -> String {
    let mut out = String::new();

    if dry_run {
        out.push_str(&format!("{}\n\n", "Plan (no changes applied)".bold()));
    } else {
        out.push_str(&format!("{}\n\n", "Sync".bold()));
    }

    for action in &outcome.actions {
        out.push_str(&render_action(action, dry_run));
    }

    let summary = outcome.summary();
    out.push('\n');
    out.push_str(&format!(
        "{} created, {} fields created, {} updated, {} deleted, {} unchanged, {} skipped, {} mismatched",
        summary.types_created,
        summary.fields_created,
        summary.fields_updated,
        summary.fields_deleted,
        summary.unchanged,
        summary.skipped,
        summary.mismatched,
    ));
    if summary.errors > 0 {
        out.push_str(&format!(", {}", format!("{} errors", summary.errors).red().bold()));
    }
    out.push('\n');
    out
}

fn render_action(action: &SyncAction, dry_run: bool) -> String {
    let mut out = String::new();
    let label = match action {
        SyncAction::Create { .. } => "create".green().bold(),
        SyncAction::CreateFields { .. } => "create fields".green(),
        SyncAction::UpdateFields { .. } => "update fields".yellow(),
        SyncAction::DeleteFields { .. } => "delete fields".red(),
        SyncAction::Skip { .. } => "skip".dimmed(),
        SyncAction::Noop { .. } => "ok".dimmed(),
        SyncAction::Mismatch { .. } => "mismatch".red().bold(),
    };
    out.push_str(&format!("  {:<16} {}", label, action.content_type().bold()));

    match action {
        SyncAction::Skip { reason, .. } => out.push_str(&format!("  ({reason})")),
        SyncAction::CreateFields { created, diffs, .. } => {
            if dry_run {
                out.push_str(&format!("  ({} to create)", diffs.len()));
            } else {
                out.push_str(&format!("  ({created} created)"));
            }
        }
        SyncAction::UpdateFields { updated, diffs, .. } => {
            if dry_run {
                out.push_str(&format!("  ({} to update)", diffs.len()));
            } else {
                out.push_str(&format!("  ({updated} updated)"));
            }
        }
        SyncAction::DeleteFields { deleted, diffs, .. } => {
            if dry_run {
                out.push_str(&format!("  ({} to delete)", diffs.len()));
            } else {
                out.push_str(&format!("  ({deleted} deleted)"));
            }
        }
        _ => {}
    }
    out.push('\n');

    for diff in action.diffs() {
        let detail = match diff.reason {
            DiffReason::MissingField => "missing remotely".to_string(),
            DiffReason::ExtraFieldRemote => "no declared counterpart".to_string(),
            DiffReason::FieldChanges => {
                let attrs: Vec<&str> = diff.changes.keys().copied().collect();
                attrs.join(", ")
            }
        };
        out.push_str(&format!("      {} {}  {}\n", "-".dimmed(), diff.field, detail.dimmed()));
    }
    for error in action.errors() {
        out.push_str(&format!("      {} {}\n", "!".red(), error.red()));
    }
    out
}

/// Render the outcome as pretty-printed JSON, for CI pipelines
pub fn render_json(outcome: &SyncOutcome) -> Result<String> {
    Ok(serde_json::to_string_pretty(outcome)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_outcome() -> SyncOutcome {
        SyncOutcome {
            actions: vec![
                SyncAction::Create { content_type: "post".into() },
                SyncAction::Noop { content_type: "author".into() },
                SyncAction::Mismatch {
                    content_type: "tag".into(),
                    diffs: Vec::new(),
                    errors: vec!["backend refused the create".into()],
                },
            ],
        }
    }

    #[test]
    fn test_render_lists_every_action() {
        colored::control::set_override(false);
        let text = render(&sample_outcome(), true);

        assert!(text.contains("post"));
        assert!(text.contains("author"));
        assert!(text.contains("tag"));
        assert!(text.contains("backend refused the create"));
        assert!(text.contains("1 created"));
    }

    #[test]
    fn test_render_json_is_valid() {
        let json = render_json(&sample_outcome()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["actions"][0]["type"], "create");
        assert_eq!(value["actions"][2]["type"], "mismatch");
    }
}
